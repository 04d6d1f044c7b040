use super::{Session, SessionError};
use crate::types::*;

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub name: PlayerName,
    /// Set when the name was already held by a different connection
    pub replaced_connection: Option<ConnectionId>,
}

impl Session {
    /// Join (or rejoin) under `raw_name`. An existing player with that name is
    /// re-bound to `connection_id`.
    pub fn join(&mut self, raw_name: &str, connection_id: &str) -> Result<Joined, SessionError> {
        let name = self.normalize_name(raw_name)?;

        let replaced_connection = match self.players.iter_mut().find(|p| p.name == name) {
            Some(player) => {
                let previous = std::mem::replace(&mut player.connection_id, connection_id.to_string());
                (previous != connection_id).then_some(previous)
            }
            None => {
                self.players.push(Player {
                    name: name.clone(),
                    connection_id: connection_id.to_string(),
                });
                None
            }
        };

        Ok(Joined {
            name,
            replaced_connection,
        })
    }

    /// Rename a player in place, carrying over any buzz entry with its
    /// original timestamp and position. Returns the normalized new name.
    pub fn change_name(
        &mut self,
        old_name: &str,
        raw_new_name: &str,
    ) -> Result<PlayerName, SessionError> {
        let new_name = self.normalize_name(raw_new_name)?;
        if new_name == old_name {
            return Err(SessionError::SameName(new_name));
        }
        if self.get_player(&new_name).is_some() {
            return Err(SessionError::NameTaken(new_name));
        }

        let player = self
            .players
            .iter_mut()
            .find(|p| p.name == old_name)
            .ok_or_else(|| SessionError::UnknownPlayer(old_name.to_string()))?;
        player.name = new_name.clone();

        for entry in self.buzz_order.iter_mut().filter(|e| e.name == old_name) {
            entry.name = new_name.clone();
        }

        Ok(new_name)
    }
}
