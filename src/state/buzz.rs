use super::{Session, SessionError};
use crate::types::*;

impl Session {
    /// Record a buzz from `name` at the current session time
    pub fn buzz(&mut self, name: &str) -> Result<BuzzEntry, SessionError> {
        self.check_can_buzz(name)?;
        let time = self.clock.now();
        Ok(self.record_buzz(name, time))
    }

    #[cfg(test)]
    pub(crate) fn buzz_at(&mut self, name: &str, time: Millis) -> Result<BuzzEntry, SessionError> {
        self.check_can_buzz(name)?;
        Ok(self.record_buzz(name, time))
    }

    fn check_can_buzz(&self, name: &str) -> Result<(), SessionError> {
        if self.get_player(name).is_none() {
            return Err(SessionError::UnknownPlayer(name.to_string()));
        }
        if self.has_buzzed(name) {
            return Err(SessionError::AlreadyBuzzed(name.to_string()));
        }
        Ok(())
    }

    fn record_buzz(&mut self, name: &str, time: Millis) -> BuzzEntry {
        let entry = BuzzEntry {
            name: name.to_string(),
            time,
        };
        self.buzz_order.push(entry.clone());
        entry
    }

    /// Clear the buzz order, keep the players
    pub fn reset(&mut self) {
        self.buzz_order.clear();
    }

    /// Clear players and buzz order
    pub fn hard_reset(&mut self) {
        self.players.clear();
        self.buzz_order.clear();
    }

    /// Ranked view of the buzz order with gaps to the previous buzz
    pub fn standings(&self) -> Vec<Standing> {
        let mut previous: Option<Millis> = None;
        self.buzz_order
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let gap_ms = previous.map_or(0, |p| entry.time.saturating_sub(p));
                previous = Some(entry.time);
                Standing {
                    rank: idx + 1,
                    name: entry.name.clone(),
                    time: entry.time,
                    gap_ms,
                }
            })
            .collect()
    }

    /// Standing of the most recent buzz
    pub fn last_standing(&self) -> Option<Standing> {
        self.standings().pop()
    }
}
