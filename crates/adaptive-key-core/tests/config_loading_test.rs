// Adaptive Key Config Loading Tests
//
// Loads TOML configs from disk, builds an engine and replays traces on it.
//
// Run with: cargo test --test config_loading_test

#![cfg(feature = "toml-config")]

use std::fs;
use std::path::PathBuf;

use adaptive_key_core::config::ConfigError;
use adaptive_key_core::replay::{self, StepOutcome, Trace, TraceError};
use adaptive_key_core::{
    AdaptiveKeyEngine, Config, EventDisposition, KeyIdentity, PlaybackTiming, RecordingExecutor,
    Selection,
};

const ACCENT_CONFIG: &str = r#"
[timing]
tap_ms = 10

[[adaptive_key]]
name = "accent"
bindings = ["&kp E"]
dead_keys = ["RA(N6)"]

[[adaptive_key.trigger]]
trigger_keys = ["RA(N6)"]
max_prior_idle_ms = 500
strict_modifiers = true
bindings = ["&kp BSPC", "&kp RA(E)"]

[[adaptive_key.trigger]]
trigger_keys = ["SPACE", "DOT"]
min_prior_idle_ms = -1
max_prior_idle_ms = -1
bindings = ["&kp LS(E)"]

[[adaptive_key]]
name = "layer"
bindings = ["&mo 1"]
"#;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("adaptive-key-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_config_from_file() {
    let path = temp_file("accent.toml", ACCENT_CONFIG);
    let config = Config::from_toml_path(&path).unwrap();

    assert_eq!(
        config.timing(),
        PlaybackTiming {
            tap_ms: 10,
            wait_ms: 5
        }
    );
    assert_eq!(config.adaptive_keys().len(), 2);

    let accent = &config.adaptive_keys()[0];
    assert_eq!(accent.name, "accent");
    assert_eq!(accent.table.triggers().len(), 2);
    assert!(accent.dead_keys.contains(&"RA(N6)".parse().unwrap()));
    assert!(accent.table.triggers()[0].strict_modifiers());
    assert_eq!(accent.table.triggers()[1].idle().max_ms(), None);

    let layer = &config.adaptive_keys()[1];
    assert_eq!(layer.table.default_output().to_string(), "[&mo 1]");
    assert!(layer.dead_keys.is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let result = Config::from_toml_path("/nonexistent/adaptive-key/config.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_replay_accent_trace() {
    let config = Config::from_toml(ACCENT_CONFIG).unwrap();
    let mut engine = AdaptiveKeyEngine::new(config.into_engine_config());
    let mut executor = RecordingExecutor::new();

    let trace = Trace::from_toml(
        r#"
        [[step]]
        at = 0
        key = "RA(N6)"
        state = "press"

        [[step]]
        at = 30
        key = "RA(N6)"
        state = "release"

        [[step]]
        at = 100
        adaptive = "accent"
        state = "press"

        [[step]]
        at = 150
        adaptive = "accent"
        state = "release"

        [[step]]
        at = 400
        key = "DOT"
        state = "press"

        [[step]]
        at = 5000
        adaptive = "accent"
        state = "press"
        "#,
    )
    .unwrap();

    let report = replay::run(&mut engine, &trace, &mut executor).unwrap();
    let outcomes: Vec<&StepOutcome> = report.entries.iter().map(|e| &e.outcome).collect();

    assert_eq!(
        outcomes,
        vec![
            &StepOutcome::Key(EventDisposition::Handled),
            &StepOutcome::Key(EventDisposition::Handled),
            &StepOutcome::Pressed(Ok(Selection::Trigger(0))),
            &StepOutcome::Released(Some(Selection::Trigger(0))),
            &StepOutcome::Key(EventDisposition::Bubble),
            &StepOutcome::Pressed(Ok(Selection::Trigger(1))),
        ]
    );

    // Backspace tap scripted through the queue, accented E held.
    assert_eq!(report.entries[2].calls.len(), 3);
    assert_eq!(report.entries[3].calls.len(), 1);
    assert_eq!(
        report.entries[5].calls[0].binding().key(),
        "LS(E)".parse::<KeyIdentity>().ok()
    );
    assert_eq!(report.calls().count(), 5);
    assert_eq!(report.errors().count(), 0);
}

#[test]
fn test_replay_reports_rejected_press() {
    let config = Config::from_toml(ACCENT_CONFIG).unwrap();
    let mut engine = AdaptiveKeyEngine::new(config.into_engine_config());
    let mut executor = RecordingExecutor::new();

    let trace = Trace::from_toml(
        r#"
        [[step]]
        at = 0
        adaptive = "layer"
        state = "press"

        [[step]]
        at = 5
        adaptive = "layer"
        state = "press"
        "#,
    )
    .unwrap();

    let report = replay::run(&mut engine, &trace, &mut executor).unwrap();
    assert_eq!(report.errors().count(), 1);
    assert!(report.entries[1].calls.is_empty());
}

#[test]
fn test_replay_unknown_adaptive_key() {
    let config = Config::from_toml(ACCENT_CONFIG).unwrap();
    let mut engine = AdaptiveKeyEngine::new(config.into_engine_config());
    let mut executor = RecordingExecutor::new();

    let trace = Trace::from_toml(
        r#"
        [[step]]
        at = 0
        key = "A"
        state = "press"

        [[step]]
        at = 5
        adaptive = "missing"
        state = "press"
        "#,
    )
    .unwrap();

    let result = replay::run(&mut engine, &trace, &mut executor);
    assert!(matches!(
        result,
        Err(TraceError::UnknownAdaptiveKey { index: 1, .. })
    ));
    // Nothing ran, so the last key is still unset.
    assert!(engine.shared().last_key().is_none());
}

#[test]
fn test_replay_with_extreme_timestamps() {
    let config = Config::from_toml(
        r#"
        [[adaptive_key]]
        name = "ak"
        bindings = ["&kp B"]

        [[adaptive_key.trigger]]
        trigger_keys = ["SPACE"]
        max_prior_idle_ms = 300
        bindings = ["&kp A"]
        "#,
    )
    .unwrap();
    let mut engine = AdaptiveKeyEngine::new(config.into_engine_config());
    let mut executor = RecordingExecutor::new();

    let trace = Trace::from_toml(
        r#"
        [[step]]
        at = -9223372036854775000
        key = "SPACE"
        state = "press"

        [[step]]
        at = 9223372036854775000
        adaptive = "ak"
        state = "press"
        "#,
    )
    .unwrap();

    let report = replay::run(&mut engine, &trace, &mut executor).unwrap();
    assert_eq!(report.entries[1].outcome, StepOutcome::Pressed(Ok(Selection::Default)));
}
