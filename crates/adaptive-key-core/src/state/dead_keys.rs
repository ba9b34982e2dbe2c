// Adaptive Key Dead-Key Filter
// Per-instance dead-key sets and the shared edge-triggered suppression flag

use indexmap::IndexSet;

use crate::key::KeyIdentity;

/// Keys that suppress their own effect, matched with strict modifier equality.
///
/// Strict matching compares page, id and modifiers, which is plain identity
/// equality, so membership is a set lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadKeySet {
    keys: IndexSet<KeyIdentity>,
}

impl DeadKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &KeyIdentity) -> bool {
        self.keys.contains(key)
    }

    /// Returns false if the key was already present
    pub fn insert(&mut self, key: KeyIdentity) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &KeyIdentity> {
        self.keys.iter()
    }
}

impl FromIterator<KeyIdentity> for DeadKeySet {
    fn from_iter<T: IntoIterator<Item = KeyIdentity>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Edge-triggered suppression flag shared by every adaptive key.
///
/// A dead-key press sets the flag only if it was clear, so back-to-back
/// dead-key presses alternate between suppressed and passed through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadKeyFilter {
    suppressed: bool,
}

impl DeadKeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Apply a key press; returns true if the press must be consumed
    pub fn on_press(&mut self, is_dead_key: bool) -> bool {
        self.suppressed = is_dead_key && !self.suppressed;
        self.suppressed
    }

    /// Apply a key release; returns true if the release must be consumed
    pub fn on_release(&mut self) -> bool {
        if self.suppressed {
            self.suppressed = false;
            true
        } else {
            false
        }
    }
}
