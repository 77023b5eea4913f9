use crate::{command::Command, history::HistoryStore, session::ClientSession};
use chrono::Utc;
use log::error;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Most history lines replayed to a newly joined client.
pub const HISTORY_PLAYBACK_LIMIT: u32 = 100;

/// Sole owner of the client registry. Commands from every connection task
/// funnel into one channel and are processed strictly one at a time, so
/// registry reads and writes can never interleave and every client observes
/// joins, messages and quits in the same total order.
pub struct Router {
    users: HashMap<SocketAddr, ClientSession>,
    history: HistoryStore,
}

impl Router {
    pub fn new(history: HistoryStore) -> Self {
        Router {
            users: HashMap::new(),
            history,
        }
    }

    pub async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = command_rx.recv().await {
            self.process(command).await;
        }
    }

    /// One atomic step of the router loop. A command whose session has
    /// already left the registry is a silent no-op.
    async fn process(&mut self, command: Command) {
        match command {
            Command::Join { addr, session } => self.join(addr, session).await,
            Command::ListUsers { addr } => self.list_users(addr),
            Command::SendMessage { addr, args } => self.send_message(addr, &args),
            Command::Quit { addr } => self.quit(addr),
            Command::Disconnect { addr } => self.disconnect(addr),
        }
    }

    /// Join announcement, then history playback, then the welcome line.
    /// That order is the transcript a joining client sees.
    async fn join(&mut self, addr: SocketAddr, session: ClientSession) {
        let name = session.name.clone();
        self.users.insert(addr, session);
        self.broadcast(Some(addr), &format!("{name} has join the chat"));

        let Some(session) = self.users.get(&addr) else {
            return;
        };

        match self.history.recent(HISTORY_PLAYBACK_LIMIT).await {
            Ok(entries) => {
                for entry in entries {
                    session.send(&format!("{}: {}", entry.sender, entry.text));
                }
            }
            Err(error) => error!("Could not load chat history: {error}"),
        }

        session.send(&format!("{name}, Welcome to the chat"));
    }

    fn list_users(&self, addr: SocketAddr) {
        let Some(session) = self.users.get(&addr) else {
            return;
        };

        let mut names: Vec<&str> = self.users.values().map(|user| user.name.as_str()).collect();
        names.sort_unstable();
        session.send(&names.join(", "));
    }

    fn send_message(&self, addr: SocketAddr, args: &[String]) {
        let Some(sender) = self.users.get(&addr) else {
            return;
        };

        let text = args.join(" ");
        self.broadcast(Some(addr), &format!("{}: {text}", sender.name));

        // Fire-and-forget append: a slow or failing database write must
        // never delay delivery, and its failure never reaches a client.
        let history = self.history.clone();
        let name = sender.name.clone();
        let created_at = Utc::now().timestamp_millis();
        tokio::spawn(async move {
            if let Err(error) = history.append(&name, &text, created_at).await {
                error!("Could not append message to history: {error}");
            }
        });
    }

    fn quit(&mut self, addr: SocketAddr) {
        let Some(session) = self.users.get(&addr).cloned() else {
            return;
        };

        self.broadcast(Some(addr), &format!("{} has left the chat", session.name));
        session.send(&format!("Bye, {}!", session.name));
        self.users.remove(&addr);
        session.close();
    }

    /// Cleanup path for connections that dropped without `/quit`, so a dead
    /// socket never leaves a stale registry entry behind.
    fn disconnect(&mut self, addr: SocketAddr) {
        let Some(session) = self.users.remove(&addr) else {
            return;
        };

        self.broadcast(None, &format!("{} has left the chat", session.name));
    }

    fn broadcast(&self, exclude: Option<SocketAddr>, line: &str) {
        for (addr, user) in &self.users {
            if Some(*addr) != exclude {
                user.send(line);
            }
        }
    }
}
