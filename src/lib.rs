pub mod command;
pub mod connection;
pub mod errors;
pub mod history;
pub mod router;
pub mod server;
pub mod session;
