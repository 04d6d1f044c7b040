use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Join {
        name: String,
    },
    ChangeName {
        #[serde(rename = "oldName")]
        old_name: String,
        #[serde(rename = "newName")]
        new_name: String,
    },
    Buzz {
        name: String,
    },
    /// Request the full player list and buzz order (host on connect)
    GetState,
    Reset,
    HardReset,
    /// Any `type` this server does not know about
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse one text frame. `None` means the frame is dropped.
    /// Only JSON objects are accepted; serde would also take the tagged
    /// enum in sequence form (`["join","Alice"]`).
    pub fn parse(text: &str) -> Option<Self> {
        let value = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            Ok(_) => {
                tracing::debug!("Dropping non-object message: {}", text);
                return None;
            }
            Err(e) => {
                tracing::debug!("Dropping malformed message: {}", e);
                return None;
            }
        };

        match serde_json::from_value::<ClientMessage>(value) {
            Ok(ClientMessage::Unknown) => {
                tracing::debug!("Ignoring message with unknown type: {}", text);
                None
            }
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::debug!("Dropping malformed message: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: PlayerName,
}

impl From<&Player> for PlayerInfo {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full state: reply to join/getState, broadcast after a rename
    Players {
        players: Vec<PlayerInfo>,
        #[serde(rename = "buzzOrder")]
        buzz_order: Vec<BuzzEntry>,
    },
    BuzzOrder {
        #[serde(rename = "buzzOrder")]
        buzz_order: Vec<BuzzEntry>,
    },
    /// Clients must forget their local player name
    HardReset,
}
