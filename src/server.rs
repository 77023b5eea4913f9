use crate::{
    command::Command, connection::Connection, errors::connection_error::ConnectionError,
    history::HistoryStore, router::Router,
};
use log::{error, trace};
use std::io;
use std::net::SocketAddr;
use tokio::{net::TcpListener, sync::mpsc};

/// Wires the acceptor, the router task and the per-client connection tasks
/// together around one shared command channel.
pub struct ChatServer {
    listener: TcpListener,
    history: HistoryStore,
}

impl ChatServer {
    pub fn new(listener: TcpListener, history: HistoryStore) -> Self {
        ChatServer { listener, history }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Spawns the router once, then one task per accepted
    /// connection; the acceptor itself never touches the registry.
    pub async fn run(self) {
        let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
        tokio::spawn(Router::new(self.history).run(command_rx));

        loop {
            let (mut socket, addr) = match self.listener.accept().await {
                Ok(client) => client,
                Err(error) => {
                    error!("Could not accept connection: {error}");
                    continue;
                }
            };

            trace!("New client has connected: {addr}");
            let command_tx = command_tx.clone();

            tokio::spawn(async move {
                let mut connection = Connection::new(addr, command_tx);

                if let Err(ConnectionError::Disconnect(reason)) = connection.run(&mut socket).await
                {
                    trace!("{reason}: {addr}");

                    if connection.joined {
                        if let Err(error) = connection.command_tx.send(Command::Disconnect { addr })
                        {
                            error!("Could not notify router of disconnect: {error}");
                        }
                    }
                }
            });
        }
    }
}
