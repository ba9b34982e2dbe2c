// Adaptive Key Engine
// Owns every adaptive key instance and the key context they share
//
// The host dispatcher calls `handle_key_event` for every upstream key event
// and `press` / `release` when an adaptive key position changes state.
// Calls must be made one at a time, in chronological order.

use crate::event::{EventDisposition, KeyEvent, Timestamp};
use crate::output::{ActionExecutor, BindingSequencePlayer, PlaybackTiming};
use crate::state::SharedKeyState;
use crate::transform::adaptive_key::{AdaptiveKey, AdaptiveKeyConfig, AdaptiveKeyError};
use crate::trigger::Selection;

/// Configuration for the adaptive key engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Adaptive keys, addressed by their index in this list
    pub keys: Vec<AdaptiveKeyConfig>,
    /// Timing of scripted taps in multi-binding outputs
    pub timing: PlaybackTiming,
}

/// All adaptive keys plus their shared last-key and dead-key state
#[derive(Debug, Clone)]
pub struct AdaptiveKeyEngine {
    keys: Vec<AdaptiveKey>,
    shared: SharedKeyState,
    player: BindingSequencePlayer,
}

impl AdaptiveKeyEngine {
    pub fn new(config: EngineConfig) -> Self {
        log::debug!(
            "Adaptive key engine created with {} instance(s), tap={}ms wait={}ms",
            config.keys.len(),
            config.timing.tap_ms,
            config.timing.wait_ms
        );
        Self {
            keys: config.keys.into_iter().map(AdaptiveKey::new).collect(),
            shared: SharedKeyState::new(),
            player: BindingSequencePlayer::new(config.timing),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[AdaptiveKey] {
        &self.keys
    }

    pub fn key(&self, index: usize) -> Option<&AdaptiveKey> {
        self.keys.get(index)
    }

    /// Index of the adaptive key with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.keys.iter().position(|key| key.name() == name)
    }

    pub fn shared(&self) -> &SharedKeyState {
        &self.shared
    }

    pub fn timing(&self) -> PlaybackTiming {
        self.player.timing()
    }

    /// Feed one upstream key event through the shared tracker and dead-key
    /// filter. `Handled` means the event must not reach the action executor.
    pub fn handle_key_event(&mut self, event: &KeyEvent) -> EventDisposition {
        let keys = &self.keys;
        self.shared
            .process(event, |identity| keys.iter().any(|key| key.is_dead_key(identity)))
    }

    /// Press the adaptive key at `index`
    pub fn press<E: ActionExecutor + ?Sized>(
        &mut self,
        index: usize,
        timestamp: Timestamp,
        executor: &mut E,
    ) -> Result<Selection, AdaptiveKeyError> {
        let key = self
            .keys
            .get_mut(index)
            .ok_or(AdaptiveKeyError::UnknownInstance(index))?;
        key.press(&self.shared, timestamp, &self.player, executor)
    }

    /// Release the adaptive key at `index`; `Ok(None)` if it was idle
    pub fn release<E: ActionExecutor + ?Sized>(
        &mut self,
        index: usize,
        executor: &mut E,
    ) -> Result<Option<Selection>, AdaptiveKeyError> {
        let key = self
            .keys
            .get_mut(index)
            .ok_or(AdaptiveKeyError::UnknownInstance(index))?;
        Ok(key.release(&self.player, executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Binding, BindingList};
    use crate::key::KeyIdentity;
    use crate::output::RecordingExecutor;
    use crate::trigger::{IdleWindow, Trigger, TriggerTable};

    fn kp(key: &str) -> Binding {
        Binding::key_press(key.parse().unwrap())
    }

    fn key(name: &str) -> KeyIdentity {
        name.parse().unwrap()
    }

    fn engine() -> AdaptiveKeyEngine {
        let accent = AdaptiveKeyConfig::new(
            "accent",
            TriggerTable::new(
                BindingList::single(kp("E")),
                vec![Trigger::new(
                    [key("RA(N6)")],
                    IdleWindow::within(500).unwrap(),
                    true,
                    BindingList::new(vec![kp("BSPC"), kp("RA(E)")]).unwrap(),
                )
                .unwrap()],
            ),
        )
        .with_dead_keys([key("RA(N6)")]);

        let repeat = AdaptiveKeyConfig::new(
            "repeat",
            TriggerTable::new(BindingList::single(kp("R")), vec![]),
        )
        .with_dead_keys([key("GRAVE")]);

        AdaptiveKeyEngine::new(EngineConfig {
            keys: vec![accent, repeat],
            timing: PlaybackTiming::default(),
        })
    }

    #[test]
    fn test_index_lookup() {
        let engine = engine();
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.index_of("repeat"), Some(1));
        assert_eq!(engine.index_of("missing"), None);
    }

    #[test]
    fn test_dead_keys_are_union_of_instances() {
        let mut engine = engine();

        assert_eq!(
            engine.handle_key_event(&KeyEvent::press(key("GRAVE"), 0)),
            EventDisposition::Handled
        );
        assert_eq!(
            engine.handle_key_event(&KeyEvent::release(key("GRAVE"), 5)),
            EventDisposition::Handled
        );
        assert_eq!(
            engine.handle_key_event(&KeyEvent::press(key("RA(N6)"), 10)),
            EventDisposition::Handled
        );
        assert_eq!(
            engine.handle_key_event(&KeyEvent::release(key("RA(N6)"), 15)),
            EventDisposition::Handled
        );
        assert_eq!(
            engine.handle_key_event(&KeyEvent::press(key("A"), 20)),
            EventDisposition::Bubble
        );
    }

    #[test]
    fn test_last_key_is_shared_between_instances() {
        let mut engine = engine();
        let mut exec = RecordingExecutor::new();

        engine.handle_key_event(&KeyEvent::press(key("RA(N6)"), 100));
        assert_eq!(engine.press(1, 120, &mut exec), Ok(Selection::Default));
        assert_eq!(engine.press(0, 130, &mut exec), Ok(Selection::Trigger(0)));
        assert_eq!(engine.shared().last_key().identity, key("RA(N6)"));
    }

    #[test]
    fn test_unknown_instance() {
        let mut engine = engine();
        let mut exec = RecordingExecutor::new();

        assert_eq!(
            engine.press(7, 0, &mut exec),
            Err(AdaptiveKeyError::UnknownInstance(7))
        );
        assert_eq!(
            engine.release(7, &mut exec),
            Err(AdaptiveKeyError::UnknownInstance(7))
        );
    }

    #[test]
    fn test_release_idle_instance() {
        let mut engine = engine();
        let mut exec = RecordingExecutor::new();

        assert_eq!(engine.release(0, &mut exec), Ok(None));
        assert!(exec.calls().is_empty());
    }
}
