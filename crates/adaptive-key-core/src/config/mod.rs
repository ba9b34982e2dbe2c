// Adaptive Key Config API
// Declarative description loading into bounds-checked engine configuration

#[cfg(feature = "toml-config")]
pub mod parser;

#[cfg(feature = "toml-config")]
pub use parser::{
    AdaptiveKeyToml, Config, ConfigError, ConfigToml, TimingConfig, TriggerToml,
    UNBOUNDED_IDLE_MS,
};
