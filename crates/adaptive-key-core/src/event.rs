// Adaptive Key Events
// Upstream key events and what the dead-key filter decided about them

use std::fmt;

use crate::key::KeyIdentity;

/// Monotonic timestamp in milliseconds
pub type Timestamp = i64;

/// A key state change delivered by the upstream key pipeline.
///
/// `identity.modifiers` carries the implicit and explicit modifiers active
/// when the event was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub identity: KeyIdentity,
    pub pressed: bool,
    pub timestamp: Timestamp,
}

impl KeyEvent {
    pub fn press(identity: KeyIdentity, timestamp: Timestamp) -> Self {
        Self {
            identity,
            pressed: true,
            timestamp,
        }
    }

    pub fn release(identity: KeyIdentity, timestamp: Timestamp) -> Self {
        Self {
            identity,
            pressed: false,
            timestamp,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.pressed { "press" } else { "release" };
        write!(f, "{} {} @{}ms", state, self.identity, self.timestamp)
    }
}

/// Whether an event continues to downstream listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventDisposition {
    /// Propagate to the action executor
    Bubble,
    /// Consumed here
    Handled,
}

impl EventDisposition {
    pub fn is_handled(self) -> bool {
        matches!(self, EventDisposition::Handled)
    }
}

impl fmt::Display for EventDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDisposition::Bubble => write!(f, "bubble"),
            EventDisposition::Handled => write!(f, "handled"),
        }
    }
}
