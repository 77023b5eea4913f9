pub mod command_error;
pub mod connection_error;
pub mod history_error;
