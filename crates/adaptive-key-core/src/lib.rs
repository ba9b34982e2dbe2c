// Adaptive Key Core Library
// Context-sensitive key output chosen from the previously pressed key

pub mod binding;
pub mod config;
pub mod event;
pub mod key;
pub mod modifier;
pub mod output;
pub mod state;
pub mod transform;
pub mod trigger;

#[cfg(feature = "toml-config")]
pub mod replay;

pub use binding::{Binding, BindingError, BindingList, MAX_BINDINGS, MAX_BINDING_PARAMS};
pub use event::{EventDisposition, KeyEvent, Timestamp};
pub use key::{KeyIdentity, KeyParseError};
pub use modifier::{Modifier, Modifiers};
pub use output::{
    ActionExecutor, BehaviorQueue, BindingSequencePlayer, ExecutorCall, PlaybackTiming,
    RecordingExecutor,
};
pub use state::{DeadKeySet, SharedKeyState, TimestampedKey};
pub use transform::{
    AdaptiveKey, AdaptiveKeyConfig, AdaptiveKeyEngine, AdaptiveKeyError, EngineConfig,
};
pub use trigger::{IdleWindow, Selection, Trigger, TriggerError, TriggerTable, MAX_CONDITIONS};

#[cfg(feature = "toml-config")]
pub use config::{Config, ConfigError};

#[cfg(feature = "toml-config")]
pub use replay::{ReplayReport, StepOutcome, Trace, TraceError};
