//! Single-writer owner of the session
//!
//! All connections talk to one [`SessionManager`] task through a
//! [`SessionHandle`]. The task applies one [`Command`] at a time, so state
//! transitions never interleave and every broadcast is sent from inside the
//! same critical section that produced it.

mod handlers;

use crate::broadcast::{Fanout, Outbound};
use crate::protocol::ClientMessage;
use crate::state::Session;
use crate::types::*;
use tokio::sync::{mpsc, oneshot};

pub enum Command {
    Connect {
        connection_id: ConnectionId,
        tx: Outbound,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    Client {
        connection_id: ConnectionId,
        msg: ClientMessage,
    },
    /// Read-only copy of the current state
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub players: Vec<PlayerName>,
    pub buzz_order: Vec<BuzzEntry>,
    pub standings: Vec<Standing>,
    pub connections: usize,
}

pub struct SessionManager {
    session: Session,
    fanout: Fanout,
}

impl SessionManager {
    pub fn new(max_name_chars: usize) -> Self {
        Self {
            session: Session::new(max_name_chars),
            fanout: Fanout::new(),
        }
    }

    /// Start the manager task and return a handle to it.
    /// The task stops once every handle has been dropped.
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.run(rx));
        SessionHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        tracing::info!("Session manager started");
        while let Some(cmd) = rx.recv().await {
            self.apply(cmd);
        }
        tracing::info!("Session manager stopped");
    }

    /// Apply one command to completion
    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { connection_id, tx } => {
                self.fanout.register(connection_id.clone(), tx);
                tracing::info!(
                    "Connection {} opened ({} open)",
                    connection_id,
                    self.fanout.len()
                );
            }
            Command::Disconnect { connection_id } => {
                if self.fanout.unregister(&connection_id) {
                    tracing::info!(
                        "Connection {} closed ({} open)",
                        connection_id,
                        self.fanout.len()
                    );
                }
            }
            Command::Client { connection_id, msg } => {
                self.handle_message(&connection_id, msg);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn fanout(&self) -> &Fanout {
        &self.fanout
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            players: self.session.players().iter().map(|p| p.name.clone()).collect(),
            buzz_order: self.session.buzz_order().to_vec(),
            standings: self.session.standings(),
            connections: self.fanout.len(),
        }
    }
}

/// Cloneable front door to the session manager task
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            tracing::error!("Session manager is gone, command dropped");
        }
    }

    /// Register a new connection and its outbound queue
    pub fn connect(&self, tx: Outbound) -> ConnectionId {
        let connection_id = new_connection_id();
        self.send(Command::Connect {
            connection_id: connection_id.clone(),
            tx,
        });
        connection_id
    }

    pub fn disconnect(&self, connection_id: &str) {
        self.send(Command::Disconnect {
            connection_id: connection_id.to_string(),
        });
    }

    pub fn dispatch(&self, connection_id: &str, msg: ClientMessage) {
        self.send(Command::Client {
            connection_id: connection_id.to_string(),
            msg,
        });
    }

    /// Ordered after every command sent before it from this handle
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply });
        rx.await.ok()
    }
}
