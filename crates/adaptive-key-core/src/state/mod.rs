// Adaptive Key Shared State
// Broadcast key context read and written by every adaptive key instance

mod dead_keys;
mod last_key;

pub use dead_keys::{DeadKeyFilter, DeadKeySet};
pub use last_key::{LastKeyTracker, TimestampedKey};

use crate::event::{EventDisposition, KeyEvent};
use crate::key::KeyIdentity;

/// Last pressed key plus the dead-key suppression flag.
///
/// One value is shared by all instances of an engine. It is only mutated
/// through `&mut`, so events must be delivered one at a time.
#[derive(Debug, Clone, Default)]
pub struct SharedKeyState {
    tracker: LastKeyTracker,
    dead_keys: DeadKeyFilter,
}

impl SharedKeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent key press seen by any listener
    pub fn last_key(&self) -> TimestampedKey {
        self.tracker.last()
    }

    pub fn dead_key_suppressed(&self) -> bool {
        self.dead_keys.is_suppressed()
    }

    /// Run one upstream key event through the tracker and the dead-key filter.
    ///
    /// `is_dead_key` is only consulted for presses and must answer whether
    /// the identity is a dead key of any instance.
    pub fn process<F>(&mut self, event: &KeyEvent, is_dead_key: F) -> EventDisposition
    where
        F: FnOnce(&KeyIdentity) -> bool,
    {
        if !event.pressed {
            return if self.dead_keys.on_release() {
                log::trace!("Consuming release of {} after dead key", event.identity);
                EventDisposition::Handled
            } else {
                EventDisposition::Bubble
            };
        }

        self.tracker.record_press(event.identity, event.timestamp);

        let dead = is_dead_key(&event.identity);
        if self.dead_keys.on_press(dead) {
            log::trace!("Suppressing dead key press {}", event.identity);
            EventDisposition::Handled
        } else {
            EventDisposition::Bubble
        }
    }
}
