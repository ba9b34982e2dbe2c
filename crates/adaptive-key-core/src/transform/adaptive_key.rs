// Adaptive Key Instance
// Per-instance press/release state machine over the trigger table and player

use std::fmt;

use crate::binding::BindingList;
use crate::event::Timestamp;
use crate::key::KeyIdentity;
use crate::output::{ActionExecutor, BindingSequencePlayer};
use crate::state::{DeadKeySet, SharedKeyState};
use crate::trigger::{Selection, TriggerTable};

/// Errors reported by adaptive key press/release handling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdaptiveKeyError {
    #[error("adaptive key '{0}' pressed twice or no prior key press detected")]
    ReentrantPress(String),

    #[error("no adaptive key with index {0}")]
    UnknownInstance(usize),
}

/// Immutable configuration of one adaptive key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveKeyConfig {
    pub name: String,
    pub table: TriggerTable,
    pub dead_keys: DeadKeySet,
}

impl AdaptiveKeyConfig {
    pub fn new(name: impl Into<String>, table: TriggerTable) -> Self {
        Self {
            name: name.into(),
            table,
            dead_keys: DeadKeySet::new(),
        }
    }

    pub fn with_dead_keys(mut self, dead_keys: impl IntoIterator<Item = KeyIdentity>) -> Self {
        self.dead_keys = dead_keys.into_iter().collect();
        self
    }
}

/// One adaptive key: idle, or holding the output list chosen at press time
#[derive(Debug, Clone)]
pub struct AdaptiveKey {
    config: AdaptiveKeyConfig,
    active: Option<Selection>,
}

impl AdaptiveKey {
    pub fn new(config: AdaptiveKeyConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AdaptiveKeyConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The selection being held, if any
    pub fn active_selection(&self) -> Option<Selection> {
        self.active
    }

    /// The binding list being held, if any
    pub fn active_bindings(&self) -> Option<&BindingList> {
        self.active.map(|selection| self.config.table.output(selection))
    }

    pub fn is_dead_key(&self, key: &KeyIdentity) -> bool {
        self.config.dead_keys.contains(key)
    }

    /// Choose an output list for a press at `timestamp` and start playing it.
    ///
    /// A second press while active, with no key observed yet, is rejected
    /// without touching state or the executor.
    pub fn press<E: ActionExecutor + ?Sized>(
        &mut self,
        shared: &SharedKeyState,
        timestamp: Timestamp,
        player: &BindingSequencePlayer,
        executor: &mut E,
    ) -> Result<Selection, AdaptiveKeyError> {
        let last = shared.last_key();
        if last.is_none() && self.active.is_some() {
            log::error!(
                "Adaptive key '{}' pressed twice or no prior key press detected",
                self.config.name
            );
            return Err(AdaptiveKeyError::ReentrantPress(self.config.name.clone()));
        }

        let selection = self.config.table.evaluate(&last, timestamp);
        match selection {
            Selection::Default => log::debug!(
                "No adaptive key match found for '{}', invoking default behavior",
                self.config.name
            ),
            Selection::Trigger(index) => log::debug!(
                "Adaptive key '{}' matched trigger #{} after {} ({}ms idle)",
                self.config.name,
                index,
                last.identity,
                last.elapsed(timestamp)
            ),
        }

        self.active = Some(selection);
        player.press(self.config.table.output(selection), executor);
        Ok(selection)
    }

    /// Release whatever was pressed; a no-op when idle
    pub fn release<E: ActionExecutor + ?Sized>(
        &mut self,
        player: &BindingSequencePlayer,
        executor: &mut E,
    ) -> Option<Selection> {
        let selection = self.active.take()?;
        player.release(self.config.table.output(selection), executor);
        Some(selection)
    }
}

impl fmt::Display for AdaptiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.active {
            Some(selection) => write!(f, "{} (active: {})", self.config.name, selection),
            None => write!(f, "{} (idle)", self.config.name),
        }
    }
}
