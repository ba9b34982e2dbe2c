// Adaptive Key Config Parser - TOML with Serde
// Parses the per-instance trigger tables, default bindings and dead keys

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::binding::{Binding, BindingError, BindingList};
use crate::key::{KeyIdentity, KeyParseError};
use crate::output::PlaybackTiming;
use crate::transform::{AdaptiveKeyConfig, EngineConfig};
use crate::trigger::{IdleWindow, Trigger, TriggerError, TriggerTable};

/// Idle bound value meaning "unbounded", as an alternative to omitting it
pub const UNBOUNDED_IDLE_MS: i64 = -1;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("{context}: invalid key '{text}': {source}")]
    InvalidKey {
        context: String,
        text: String,
        #[source]
        source: KeyParseError,
    },

    #[error("{context}: {source}")]
    InvalidBinding {
        context: String,
        #[source]
        source: BindingError,
    },

    #[error("{context}: {source}")]
    InvalidTrigger {
        context: String,
        #[source]
        source: TriggerError,
    },

    #[error("adaptive key name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("adaptive key name cannot be empty")]
    EmptyName,
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// Scripted tap timing
    #[serde(default)]
    pub timing: Option<TimingConfig>,

    /// Adaptive key instances, in index order
    #[serde(default, rename = "adaptive_key")]
    pub adaptive_keys: Vec<AdaptiveKeyToml>,
}

/// `[timing]` table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Hold time of a scripted tap
    pub tap_ms: Option<u32>,
    /// Pause after a scripted release
    pub wait_ms: Option<u32>,
}

/// `[[adaptive_key]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdaptiveKeyToml {
    pub name: String,

    /// Default output when no trigger fires
    pub bindings: Vec<String>,

    /// Keys whose own press and release are suppressed
    #[serde(default)]
    pub dead_keys: Vec<String>,

    /// Triggers, evaluated in order
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerToml>,
}

/// `[[adaptive_key.trigger]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerToml {
    /// Candidate preceding keys
    pub trigger_keys: Vec<String>,

    #[serde(default)]
    pub min_prior_idle_ms: Option<i64>,

    #[serde(default)]
    pub max_prior_idle_ms: Option<i64>,

    #[serde(default)]
    pub strict_modifiers: bool,

    /// Output played when the trigger fires
    pub bindings: Vec<String>,
}

/// Validated configuration, ready to build an engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    engine: EngineConfig,
}

impl Config {
    /// Parse a TOML configuration file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        toml_config.to_config()
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Convert to the engine configuration
    pub fn into_engine_config(self) -> EngineConfig {
        self.engine
    }

    pub fn timing(&self) -> PlaybackTiming {
        self.engine.timing
    }

    pub fn adaptive_keys(&self) -> &[AdaptiveKeyConfig] {
        &self.engine.keys
    }
}

impl ConfigToml {
    /// Convert parsed TOML to the validated Config
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let defaults = PlaybackTiming::default();
        let timing = match &self.timing {
            Some(timing) => PlaybackTiming {
                tap_ms: timing.tap_ms.unwrap_or(defaults.tap_ms),
                wait_ms: timing.wait_ms.unwrap_or(defaults.wait_ms),
            },
            None => defaults,
        };

        let mut seen = HashSet::new();
        let mut keys = Vec::with_capacity(self.adaptive_keys.len());
        for entry in &self.adaptive_keys {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName(entry.name.clone()));
            }
            keys.push(entry.to_adaptive_key_config()?);
        }

        if keys.is_empty() {
            log::warn!("Configuration declares no adaptive keys");
        }

        Ok(Config {
            engine: EngineConfig { keys, timing },
        })
    }
}

impl AdaptiveKeyToml {
    fn to_adaptive_key_config(&self) -> Result<AdaptiveKeyConfig, ConfigError> {
        let context = format!("adaptive key '{}'", self.name);
        let default_output = parse_binding_list(&self.bindings, &context)?;

        let mut triggers = Vec::with_capacity(self.triggers.len());
        for (index, trigger) in self.triggers.iter().enumerate() {
            let trigger_context = format!("{} trigger #{}", context, index);
            triggers.push(trigger.to_trigger(&trigger_context)?);
        }

        let mut dead_keys = Vec::with_capacity(self.dead_keys.len());
        for text in &self.dead_keys {
            let key = parse_key(text, &format!("{} dead_keys", context))?;
            if dead_keys.contains(&key) {
                log::warn!("{}: dead key {} listed more than once", context, key);
                continue;
            }
            dead_keys.push(key);
        }

        log::debug!(
            "{} loaded with {} trigger(s), {} dead key(s), default {}",
            context,
            triggers.len(),
            dead_keys.len(),
            default_output
        );

        Ok(
            AdaptiveKeyConfig::new(&self.name, TriggerTable::new(default_output, triggers))
                .with_dead_keys(dead_keys),
        )
    }
}

impl TriggerToml {
    fn to_trigger(&self, context: &str) -> Result<Trigger, ConfigError> {
        let candidates = self
            .trigger_keys
            .iter()
            .map(|text| parse_key(text, context))
            .collect::<Result<Vec<_>, _>>()?;

        let trigger_error = |source: TriggerError| ConfigError::InvalidTrigger {
            context: context.to_string(),
            source,
        };

        let idle = IdleWindow::new(
            idle_bound(self.min_prior_idle_ms),
            idle_bound(self.max_prior_idle_ms),
        )
        .map_err(trigger_error)?;

        let output = parse_binding_list(&self.bindings, context)?;

        Trigger::new(candidates, idle, self.strict_modifiers, output).map_err(trigger_error)
    }
}

/// `-1` and absent both mean unbounded
fn idle_bound(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != UNBOUNDED_IDLE_MS)
}

fn parse_key(text: &str, context: &str) -> Result<KeyIdentity, ConfigError> {
    text.parse().map_err(|source| ConfigError::InvalidKey {
        context: context.to_string(),
        text: text.to_string(),
        source,
    })
}

fn parse_binding_list(texts: &[String], context: &str) -> Result<BindingList, ConfigError> {
    let binding_error = |source: BindingError| ConfigError::InvalidBinding {
        context: context.to_string(),
        source,
    };

    let bindings = texts
        .iter()
        .map(|text| text.parse::<Binding>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(binding_error)?;

    BindingList::new(bindings).map_err(binding_error)
}
