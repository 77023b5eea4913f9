use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("unknown command {0}")]
    UnknownCommand(String),
}
