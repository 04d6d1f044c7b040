//! Fan-out of session updates to every open connection
//!
//! Each connection registers a bounded outbound queue. Sends happen from
//! the session manager task only, so every connection sees updates in the
//! same order. A queue that is closed or full is dropped from the set; the
//! socket task then sees its queue end and closes the connection.

use crate::protocol::ServerMessage;
use crate::types::*;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Messages a connection may have pending before it counts as stalled
pub const OUTBOUND_CAPACITY: usize = 256;

pub type Outbound = mpsc::Sender<ServerMessage>;
pub type Inbox = mpsc::Receiver<ServerMessage>;

/// Outbound queue for a new connection
pub fn outbound_channel() -> (Outbound, Inbox) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// Non-blocking enqueue; `Err` carries the reason the connection is dropped
fn deliver(tx: &Outbound, msg: ServerMessage) -> Result<(), &'static str> {
    match tx.try_send(msg) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => Err("outbound queue full"),
        Err(TrySendError::Closed(_)) => Err("outbound queue closed"),
    }
}

struct Subscriber {
    tx: Outbound,
    state: ConnectionState,
}

/// Open connections, their outbound queues and their join state
#[derive(Default)]
pub struct Fanout {
    subscribers: HashMap<ConnectionId, Subscriber>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, tx: Outbound) {
        self.subscribers.insert(
            connection_id,
            Subscriber {
                tx,
                state: ConnectionState::Unjoined,
            },
        );
    }

    pub fn unregister(&mut self, connection_id: &str) -> bool {
        self.subscribers.remove(connection_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn contains(&self, connection_id: &str) -> bool {
        self.subscribers.contains_key(connection_id)
    }

    pub fn state(&self, connection_id: &str) -> Option<&ConnectionState> {
        self.subscribers.get(connection_id).map(|s| &s.state)
    }

    pub fn set_state(&mut self, connection_id: &str, state: ConnectionState) {
        if let Some(subscriber) = self.subscribers.get_mut(connection_id) {
            subscriber.state = state;
        }
    }

    /// Move every connection joined as `old_name` over to `new_name`
    pub fn rename(&mut self, old_name: &str, new_name: &str) {
        for subscriber in self.subscribers.values_mut() {
            if subscriber.state.joined_as() == Some(old_name) {
                subscriber.state = ConnectionState::Joined(new_name.to_string());
            }
        }
    }

    /// Put every connection back into the unjoined state
    pub fn unjoin_all(&mut self) {
        for subscriber in self.subscribers.values_mut() {
            subscriber.state = ConnectionState::Unjoined;
        }
    }

    /// Send to a single connection. Returns false (and drops the
    /// connection) if its queue is closed or full.
    pub fn send_to(&mut self, connection_id: &str, msg: ServerMessage) -> bool {
        let Some(subscriber) = self.subscribers.get(connection_id) else {
            return false;
        };
        if let Err(reason) = deliver(&subscriber.tx, msg) {
            tracing::warn!("Dropping connection {}: {}", connection_id, reason);
            self.subscribers.remove(connection_id);
            return false;
        }
        true
    }

    /// Send to every connection. Failed connections are removed; the rest
    /// still get the message. Returns the number of successful deliveries.
    pub fn broadcast(&mut self, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|connection_id, subscriber| {
            match deliver(&subscriber.tx, msg.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(reason) => {
                    tracing::warn!("Dropping connection {}: {}", connection_id, reason);
                    false
                }
            }
        });
        delivered
    }
}
