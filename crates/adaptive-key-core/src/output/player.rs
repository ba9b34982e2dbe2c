// Adaptive Key Binding Playback
// Turns a selected binding list into invoke/enqueue calls on press and release

use crate::binding::BindingList;
use crate::output::executor::ActionExecutor;

/// Default hold time of a scripted tap
pub const DEFAULT_TAP_MS: u32 = 5;

/// Default pause between scripted actions
pub const DEFAULT_WAIT_MS: u32 = 5;

/// Timing of the scripted part of a multi-binding sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// Delay after a scripted press, before its release
    pub tap_ms: u32,
    /// Delay after a scripted release, before the next action
    pub wait_ms: u32,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            tap_ms: DEFAULT_TAP_MS,
            wait_ms: DEFAULT_WAIT_MS,
        }
    }
}

/// Plays binding lists against an [`ActionExecutor`].
///
/// A single binding is pressed and released synchronously. For longer lists
/// every binding but the last is tapped through the timed queue and the last
/// one is held from press until release.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingSequencePlayer {
    timing: PlaybackTiming,
}

impl BindingSequencePlayer {
    pub fn new(timing: PlaybackTiming) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> PlaybackTiming {
        self.timing
    }

    pub fn press<E: ActionExecutor + ?Sized>(&self, list: &BindingList, executor: &mut E) {
        let (last, tapped) = list.split_last();
        log::debug!("Pressing adaptive key bindings {}", list);

        for binding in tapped {
            log::trace!("Scripting tap of {}", binding);
            executor.enqueue(binding, true, self.timing.tap_ms);
            executor.enqueue(binding, false, self.timing.wait_ms);
        }

        executor.invoke(last, true);
    }

    pub fn release<E: ActionExecutor + ?Sized>(&self, list: &BindingList, executor: &mut E) {
        let last = list.last();
        log::debug!("Releasing adaptive key binding {}", last);

        if list.len() > 1 {
            executor.enqueue(last, false, self.timing.wait_ms);
        } else {
            executor.invoke(last, false);
        }
    }
}
