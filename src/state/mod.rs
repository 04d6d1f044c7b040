mod buzz;
mod clock;
mod player;

pub use clock::SessionClock;
pub use player::Joined;

use crate::protocol::{PlayerInfo, ServerMessage};
use crate::types::*;

/// Why a session operation was refused. None of these reach the client;
/// the caller logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("player name is empty")]
    EmptyName,
    #[error("player name is longer than {max} characters")]
    NameTooLong { max: usize },
    #[error("connection is not joined as '{0}'")]
    NotJoined(PlayerName),
    #[error("no player named '{0}' has joined")]
    UnknownPlayer(PlayerName),
    #[error("'{0}' has already buzzed this round")]
    AlreadyBuzzed(PlayerName),
    #[error("name '{0}' is already taken")]
    NameTaken(PlayerName),
    #[error("new name equals the old name '{0}'")]
    SameName(PlayerName),
}

/// Authoritative record of players and buzz order for the current round
#[derive(Debug, Clone)]
pub struct Session {
    /// Joined players, in join order
    players: Vec<Player>,
    buzz_order: Vec<BuzzEntry>,
    clock: SessionClock,
    max_name_chars: usize,
}

impl Session {
    pub fn new(max_name_chars: usize) -> Self {
        Self {
            players: Vec::new(),
            buzz_order: Vec::new(),
            clock: SessionClock::new(),
            max_name_chars,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn buzz_order(&self) -> &[BuzzEntry] {
        &self.buzz_order
    }

    pub fn get_player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn has_buzzed(&self, name: &str) -> bool {
        self.buzz_order.iter().any(|e| e.name == name)
    }

    /// `players` message carrying the full state
    pub fn players_message(&self) -> ServerMessage {
        ServerMessage::Players {
            players: self.players.iter().map(PlayerInfo::from).collect(),
            buzz_order: self.buzz_order.clone(),
        }
    }

    pub fn buzz_order_message(&self) -> ServerMessage {
        ServerMessage::BuzzOrder {
            buzz_order: self.buzz_order.clone(),
        }
    }

    /// Trim a requested name and check it against the session's limits
    fn normalize_name(&self, raw: &str) -> Result<PlayerName, SessionError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if name.chars().count() > self.max_name_chars {
            return Err(SessionError::NameTooLong {
                max: self.max_name_chars,
            });
        }
        Ok(name.to_string())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_NAME_CHARS)
    }
}
