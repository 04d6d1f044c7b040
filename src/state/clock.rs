use crate::types::Millis;
use std::time::Instant;

/// The single source of buzz timestamps.
///
/// Anchored to Unix milliseconds at construction and advanced with a monotonic
/// clock, so readings look like wall-clock time but never go backwards even if
/// the system clock is adjusted.
#[derive(Debug, Clone)]
pub struct SessionClock {
    anchor_unix_ms: Millis,
    anchor: Instant,
    last: Millis,
}

impl SessionClock {
    pub fn new() -> Self {
        let anchor_unix_ms = chrono::Utc::now().timestamp_millis().max(0) as Millis;
        Self {
            anchor_unix_ms,
            anchor: Instant::now(),
            last: anchor_unix_ms,
        }
    }

    /// Current session time; never less than any earlier reading
    pub fn now(&mut self) -> Millis {
        let elapsed = self.anchor.elapsed().as_millis() as Millis;
        let now = (self.anchor_unix_ms + elapsed).max(self.last);
        self.last = now;
        now
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
