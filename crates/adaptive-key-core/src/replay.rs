// Adaptive Key Replay
// Drives an engine from a scripted event trace and records what it emitted

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::event::{EventDisposition, KeyEvent, Timestamp};
use crate::key::{KeyIdentity, KeyParseError};
use crate::output::{ExecutorCall, RecordingExecutor};
use crate::transform::{AdaptiveKeyEngine, AdaptiveKeyError};
use crate::trigger::Selection;

/// Trace loading and replay errors
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("step #{index}: invalid key '{text}': {source}")]
    InvalidKey {
        index: usize,
        text: String,
        #[source]
        source: KeyParseError,
    },

    #[error("step #{0}: exactly one of 'key' or 'adaptive' must be set")]
    InvalidTarget(usize),

    #[error("step #{index}: time {at}ms is earlier than the previous step ({previous}ms)")]
    OutOfOrder {
        index: usize,
        at: Timestamp,
        previous: Timestamp,
    },

    #[error("step #{index}: no adaptive key named '{name}'")]
    UnknownAdaptiveKey { index: usize, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Press,
    Release,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraceToml {
    #[serde(default)]
    step: Vec<TraceStepToml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraceStepToml {
    at: Timestamp,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    adaptive: Option<String>,
    state: StepState,
}

/// What a trace step acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTarget {
    /// An upstream key event
    Key(KeyIdentity),
    /// An adaptive key, by name
    Adaptive(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    pub at: Timestamp,
    pub target: StepTarget,
    pub pressed: bool,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.pressed { "press" } else { "release" };
        match &self.target {
            StepTarget::Key(key) => write!(f, "@{}ms {} {}", self.at, state, key),
            StepTarget::Adaptive(name) => write!(f, "@{}ms {} adaptive '{}'", self.at, state, name),
        }
    }
}

/// Ordered list of timed steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    steps: Vec<TraceStep>,
}

impl Trace {
    /// Build a trace, checking that time never goes backwards
    pub fn new(steps: Vec<TraceStep>) -> Result<Self, TraceError> {
        for (index, pair) in steps.windows(2).enumerate() {
            if pair[1].at < pair[0].at {
                return Err(TraceError::OutOfOrder {
                    index: index + 1,
                    at: pair[1].at,
                    previous: pair[0].at,
                });
            }
        }
        Ok(Self { steps })
    }

    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse `[[step]]` tables with `at`, `state` and one of `key` / `adaptive`
    pub fn from_toml(content: &str) -> Result<Self, TraceError> {
        let parsed: TraceToml =
            toml::from_str(content).map_err(|e| TraceError::TomlParse(e.to_string()))?;

        let mut steps = Vec::with_capacity(parsed.step.len());
        for (index, step) in parsed.step.into_iter().enumerate() {
            let target = match (step.key, step.adaptive) {
                (Some(text), None) => {
                    let key = text.parse().map_err(|source| TraceError::InvalidKey {
                        index,
                        text: text.clone(),
                        source,
                    })?;
                    StepTarget::Key(key)
                }
                (None, Some(name)) => StepTarget::Adaptive(name),
                _ => return Err(TraceError::InvalidTarget(index)),
            };
            steps.push(TraceStep {
                at: step.at,
                target,
                pressed: step.state == StepState::Press,
            });
        }

        Self::new(steps)
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Result of running one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Key event after the dead-key filter
    Key(EventDisposition),
    /// Adaptive key press: selection or usage error
    Pressed(Result<Selection, AdaptiveKeyError>),
    /// Adaptive key release: released selection, `None` if it was idle
    Released(Option<Selection>),
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Key(disposition) => write!(f, "{}", disposition),
            StepOutcome::Pressed(Ok(selection)) => write!(f, "selected {}", selection),
            StepOutcome::Pressed(Err(err)) => write!(f, "error: {}", err),
            StepOutcome::Released(Some(selection)) => write!(f, "released {}", selection),
            StepOutcome::Released(None) => write!(f, "idle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayEntry {
    pub step: TraceStep,
    pub outcome: StepOutcome,
    /// Executor calls made while handling this step
    pub calls: Vec<ExecutorCall>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub entries: Vec<ReplayEntry>,
}

impl ReplayReport {
    /// All executor calls in the order they were made
    pub fn calls(&self) -> impl Iterator<Item = &ExecutorCall> {
        self.entries.iter().flat_map(|entry| entry.calls.iter())
    }

    pub fn errors(&self) -> impl Iterator<Item = &AdaptiveKeyError> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            StepOutcome::Pressed(Err(err)) => Some(err),
            _ => None,
        })
    }
}

/// Run every step of `trace` against `engine`.
///
/// Adaptive key names are resolved before anything runs, so an unknown name
/// leaves the engine untouched.
pub fn run(
    engine: &mut AdaptiveKeyEngine,
    trace: &Trace,
    executor: &mut RecordingExecutor,
) -> Result<ReplayReport, TraceError> {
    let mut indices = Vec::with_capacity(trace.len());
    for (index, step) in trace.steps().iter().enumerate() {
        indices.push(match &step.target {
            StepTarget::Key(_) => None,
            StepTarget::Adaptive(name) => Some(engine.index_of(name).ok_or_else(|| {
                TraceError::UnknownAdaptiveKey {
                    index,
                    name: name.clone(),
                }
            })?),
        });
    }

    let mut report = ReplayReport::default();
    for (step, instance) in trace.steps().iter().zip(indices) {
        executor.clear();
        let outcome = match (&step.target, instance) {
            (StepTarget::Key(identity), _) => {
                let event = KeyEvent {
                    identity: *identity,
                    pressed: step.pressed,
                    timestamp: step.at,
                };
                StepOutcome::Key(engine.handle_key_event(&event))
            }
            (StepTarget::Adaptive(_), Some(index)) if step.pressed => {
                StepOutcome::Pressed(engine.press(index, step.at, executor))
            }
            (StepTarget::Adaptive(_), Some(index)) => {
                StepOutcome::Released(engine.release(index, executor).unwrap_or_default())
            }
            (StepTarget::Adaptive(name), None) => {
                return Err(TraceError::UnknownAdaptiveKey {
                    index: report.entries.len(),
                    name: name.clone(),
                })
            }
        };
        log::debug!("{} -> {}", step, outcome);
        report.entries.push(ReplayEntry {
            step: step.clone(),
            outcome,
            calls: executor.drain(),
        });
    }

    Ok(report)
}
