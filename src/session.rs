use log::trace;
use tokio::sync::mpsc;

/// One unit of work for a connection task's write side.
#[derive(Clone, Debug)]
pub enum Outbound {
    Line(String),
    Close,
}

/// One connected, named user. The name is lowercased at join and never
/// changes afterwards. Lines queued here are drained by the session's own
/// connection task, so the router never blocks on a slow socket.
#[derive(Clone, Debug)]
pub struct ClientSession {
    pub name: String,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
}

impl ClientSession {
    pub fn new(name: String, outbound_tx: mpsc::UnboundedSender<Outbound>) -> Self {
        ClientSession { name, outbound_tx }
    }

    /// Queues one chat line for delivery. A send to a session whose
    /// connection task is already gone is dropped.
    pub fn send(&self, line: &str) {
        if let Err(error) = self.outbound_tx.send(Outbound::Line(line.to_string())) {
            trace!("Could not queue line for {}: {error}", self.name);
        }
    }

    /// Tells the connection task to close the socket once every line queued
    /// before this call has been written.
    pub fn close(&self) {
        if let Err(error) = self.outbound_tx.send(Outbound::Close) {
            trace!("Could not queue close for {}: {error}", self.name);
        }
    }
}
