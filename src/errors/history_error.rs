use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Could not access history database: {0}")]
    Database(#[from] sqlx::Error),
}
