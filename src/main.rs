use dotenvy::dotenv;
use env_logger::Env;
use log::info;
use rusty_chat_relay::{history::HistoryStore, server::ChatServer};
use std::env;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let history_path = env::args()
        .nth(1)
        .expect("History database path must be provided as the first argument");

    let history = HistoryStore::connect(&history_path)
        .await
        .expect("Could not open history database");

    let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = TcpListener::bind(&listen_addr)
        .await
        .expect("Could not bind chat server");

    info!("Chat server listening on {listen_addr}");
    ChatServer::new(listener, history).run().await;
}
