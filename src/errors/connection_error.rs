use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Disconnecting client: {0}")]
    Disconnect(String),
}
