use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type ConnectionId = String;
pub type PlayerName = String;

/// Milliseconds on the session clock
pub type Millis = u64;

pub fn new_connection_id() -> ConnectionId {
    ulid::Ulid::new().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: PlayerName,
    /// Connection that most recently claimed this name
    pub connection_id: ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzEntry {
    pub name: PlayerName,
    pub time: Millis,
}

/// A buzz entry with its rank and the gap to the entry before it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub rank: usize,
    pub name: PlayerName,
    pub time: Millis,
    pub gap_ms: Millis,
}

impl Standing {
    /// Gap label as the host view shows it: "0 ms" for the winner,
    /// "+500 ms" behind it
    pub fn gap_label(&self) -> String {
        if self.rank == 1 {
            return format!("{} ms", self.gap_ms);
        }
        format!("+{} ms", self.gap_ms)
    }
}

/// Where a single connection stands in the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unjoined,
    Joined(PlayerName),
}

impl ConnectionState {
    pub fn joined_as(&self) -> Option<&str> {
        match self {
            ConnectionState::Joined(name) => Some(name),
            ConnectionState::Unjoined => None,
        }
    }
}
