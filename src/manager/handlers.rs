//! One handler per inbound message type
//!
//! Refused operations are no-ops: they are logged at debug level and
//! nothing is sent back.

use super::SessionManager;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::SessionError;
use crate::types::ConnectionState;

impl SessionManager {
    pub(super) fn handle_message(&mut self, connection_id: &str, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::Join { name } => self.handle_join(connection_id, &name),
            ClientMessage::ChangeName { old_name, new_name } => {
                self.handle_change_name(connection_id, &old_name, &new_name)
            }
            ClientMessage::Buzz { name } => self.handle_buzz(&name),
            ClientMessage::GetState => {
                self.handle_get_state(connection_id);
                Ok(())
            }
            ClientMessage::Reset => {
                self.handle_reset();
                Ok(())
            }
            ClientMessage::HardReset => {
                self.handle_hard_reset();
                Ok(())
            }
            ClientMessage::Unknown => Ok(()),
        };

        if let Err(e) = result {
            tracing::debug!("Ignoring message from {}: {}", connection_id, e);
        }
    }

    fn handle_join(&mut self, connection_id: &str, name: &str) -> Result<(), SessionError> {
        let joined = self.session.join(name, connection_id)?;

        if let Some(previous) = &joined.replaced_connection {
            // Two sockets claiming one name: the latest one wins the record
            tracing::warn!(
                "Player '{}' re-claimed by connection {} (was {})",
                joined.name,
                connection_id,
                previous
            );
        }
        tracing::info!("Player '{}' joined on {}", joined.name, connection_id);

        self.fanout
            .set_state(connection_id, ConnectionState::Joined(joined.name));
        self.fanout
            .send_to(connection_id, self.session.players_message());
        self.fanout.broadcast(&self.session.buzz_order_message());
        Ok(())
    }

    fn handle_change_name(
        &mut self,
        connection_id: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), SessionError> {
        let joined_as = self
            .fanout
            .state(connection_id)
            .and_then(ConnectionState::joined_as);
        if joined_as != Some(old_name) {
            return Err(SessionError::NotJoined(old_name.to_string()));
        }

        let new_name = self.session.change_name(old_name, new_name)?;
        tracing::info!("Player '{}' is now '{}'", old_name, new_name);

        self.fanout.rename(old_name, &new_name);
        self.fanout.broadcast(&self.session.players_message());
        self.fanout.broadcast(&self.session.buzz_order_message());
        Ok(())
    }

    fn handle_buzz(&mut self, name: &str) -> Result<(), SessionError> {
        self.session.buzz(name.trim())?;

        if let Some(standing) = self.session.last_standing() {
            tracing::info!(
                "Player '{}' buzzed #{} ({})",
                standing.name,
                standing.rank,
                standing.gap_label()
            );
        }
        self.fanout.broadcast(&self.session.buzz_order_message());
        Ok(())
    }

    fn handle_get_state(&mut self, connection_id: &str) {
        self.fanout
            .send_to(connection_id, self.session.players_message());
    }

    fn handle_reset(&mut self) {
        tracing::info!("Resetting buzz order");
        self.session.reset();
        self.fanout.broadcast(&self.session.buzz_order_message());
    }

    fn handle_hard_reset(&mut self) {
        tracing::info!("Hard reset: clearing all players and buzzes");
        self.session.hard_reset();
        self.fanout.unjoin_all();
        self.fanout.broadcast(&ServerMessage::HardReset);
    }
}
