use crate::{
    command::{Command, decode},
    errors::connection_error::ConnectionError,
    session::{ClientSession, Outbound},
};
use log::trace;
use std::net::SocketAddr;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        TcpStream,
        tcp::{ReadHalf, WriteHalf},
    },
    sync::mpsc,
};

/// Handles one client: reads newline-delimited input, forwards decoded
/// commands to the router, and drains the session's outbound queue onto the
/// socket. Never touches the registry itself.
pub struct Connection {
    pub addr: SocketAddr,
    pub command_tx: mpsc::UnboundedSender<Command>,
    pub joined: bool,
}

impl Connection {
    pub fn new(addr: SocketAddr, command_tx: mpsc::UnboundedSender<Command>) -> Self {
        Connection {
            addr,
            command_tx,
            joined: false,
        }
    }

    /// Drives the connection to completion. Returns `Ok(())` on a clean
    /// router-initiated close; any transport failure comes back as
    /// `ConnectionError::Disconnect` so the caller can notify the router.
    pub async fn run(&mut self, socket: &mut TcpStream) -> Result<(), ConnectionError> {
        let (rd, mut wr) = socket.split();
        let mut lines = BufReader::new(rd).lines();

        let name = self.read_username(&mut lines, &mut wr).await?;
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

        self.command_tx
            .send(Command::Join {
                addr: self.addr,
                session: ClientSession::new(name, outbound_tx),
            })
            .or(Err(ConnectionError::Disconnect(
                "Router is gone".to_string(),
            )))?;
        self.joined = true;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else {
                        return Err(ConnectionError::Disconnect("Client disconnected".to_string()));
                    };

                    trace!("C [{}]: {line}", self.addr);
                    self.dispatch(&line, &mut wr).await?;
                }

                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(Outbound::Line(line)) => {
                            trace!("S [{}]: {line}", self.addr);
                            wr.write_all(format!("> {line}\n").as_bytes())
                                .await
                                .or(Err(ConnectionError::Disconnect(
                                    "Could not send to client over socket".to_string(),
                                )))?;
                        }

                        Some(Outbound::Close) | None => return Ok(()),
                    }
                }
            }
        }
    }

    /// Prompts until the client supplies a non-empty username. The name is
    /// trimmed and lowercased; an empty one gets an error reply and a fresh
    /// prompt on the still-open connection.
    async fn read_username(
        &self,
        lines: &mut Lines<BufReader<ReadHalf<'_>>>,
        wr: &mut WriteHalf<'_>,
    ) -> Result<String, ConnectionError> {
        loop {
            wr.write_all(b"Please enter username: ")
                .await
                .or(Err(ConnectionError::Disconnect(
                    "Could not send to client over socket".to_string(),
                )))?;

            let Ok(Some(line)) = lines.next_line().await else {
                return Err(ConnectionError::Disconnect(
                    "Client disconnected".to_string(),
                ));
            };

            let name = line.trim().to_lowercase();
            if name.is_empty() {
                self.report_error(wr, "username must not be empty").await?;
                continue;
            }

            return Ok(name);
        }
    }

    /// Unrecognized input is answered here directly; it never reaches the
    /// router.
    async fn dispatch(&self, line: &str, wr: &mut WriteHalf<'_>) -> Result<(), ConnectionError> {
        match decode(self.addr, line) {
            Ok(command) => self.command_tx.send(command).or(Err(
                ConnectionError::Disconnect("Router is gone".to_string()),
            )),
            Err(error) => self.report_error(wr, &error.to_string()).await,
        }
    }

    async fn report_error(
        &self,
        wr: &mut WriteHalf<'_>,
        message: &str,
    ) -> Result<(), ConnectionError> {
        wr.write_all(format!("ERROR: {message}\n").as_bytes())
            .await
            .or(Err(ConnectionError::Disconnect(
                "Could not send to client over socket".to_string(),
            )))
    }
}
