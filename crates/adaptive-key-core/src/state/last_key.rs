// Adaptive Key Last-Key Tracker
// Most recently pressed key and when it was pressed, shared by all instances

use crate::event::Timestamp;
use crate::key::KeyIdentity;

/// A key identity paired with the time it was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimestampedKey {
    pub identity: KeyIdentity,
    pub timestamp: Timestamp,
}

impl TimestampedKey {
    /// "No key observed" sentinel: page 0 at time 0
    pub const NONE: TimestampedKey = TimestampedKey {
        identity: KeyIdentity::NONE,
        timestamp: 0,
    };

    pub fn new(identity: KeyIdentity, timestamp: Timestamp) -> Self {
        Self {
            identity,
            timestamp,
        }
    }

    /// Milliseconds elapsed between this key and `now`, saturating at the
    /// `i64` range
    pub fn elapsed(&self, now: Timestamp) -> i64 {
        now.saturating_sub(self.timestamp)
    }

    pub fn is_none(&self) -> bool {
        self.identity.is_none()
    }
}

/// Records the most recent key press. Releases never update it.
#[derive(Debug, Clone, Default)]
pub struct LastKeyTracker {
    last: TimestampedKey,
}

impl LastKeyTracker {
    pub fn new() -> Self {
        Self {
            last: TimestampedKey::NONE,
        }
    }

    pub fn last(&self) -> TimestampedKey {
        self.last
    }

    /// Overwrite the last key unconditionally
    pub fn record_press(&mut self, identity: KeyIdentity, timestamp: Timestamp) {
        self.last = TimestampedKey::new(identity, timestamp);
    }
}
