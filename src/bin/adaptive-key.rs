// Adaptive Key CLI
// Validates an adaptive key config and replays key event traces against it

use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{bail, Context, Result};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use adaptive_key_core::replay::{self, StepOutcome, Trace};
#[cfg(feature = "cli")]
use adaptive_key_core::{AdaptiveKeyEngine, Config, RecordingExecutor};

/// Adaptive key simulator
#[derive(Debug)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "adaptive-key"))]
#[cfg_attr(feature = "cli", command(version))]
#[cfg_attr(
    feature = "cli",
    command(about = "Replay key events through adaptive keys", long_about = None)
)]
struct Args {
    /// TOML configuration file (defaults to ~/.config/adaptive-key/config.toml)
    #[cfg_attr(feature = "cli", arg(short, long, value_name = "CONFIG"))]
    config: Option<PathBuf>,

    /// TOML trace of key events to replay
    #[cfg_attr(feature = "cli", arg(short, long, value_name = "TRACE"))]
    trace: Option<PathBuf>,

    /// Enable debug logging
    #[cfg_attr(feature = "cli", arg(short, long))]
    verbose: bool,

    /// Validate config and exit
    #[cfg_attr(feature = "cli", arg(long))]
    check_config: bool,
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
}

#[cfg(feature = "cli")]
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("adaptive-key").join("config.toml"))
}

#[cfg(feature = "cli")]
fn resolve_config_path(args: &Args) -> Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path()
            .context("no --config given and no user config directory available"),
    }
}

#[cfg(feature = "cli")]
fn print_summary(config: &Config) {
    let engine = config.engine_config();
    println!(
        "Loaded {} adaptive key(s), tap={}ms wait={}ms",
        engine.keys.len(),
        engine.timing.tap_ms,
        engine.timing.wait_ms
    );
    for key in &engine.keys {
        println!(
            "  - '{}': default {}, {} trigger(s), {} dead key(s)",
            key.name,
            key.table.default_output(),
            key.table.triggers().len(),
            key.dead_keys.len()
        );
    }
}

#[cfg(feature = "cli")]
fn replay_trace(config: &Config, trace_path: &Path) -> Result<()> {
    let trace = Trace::from_toml_path(trace_path)
        .with_context(|| format!("failed to load trace {}", trace_path.display()))?;

    let mut engine = AdaptiveKeyEngine::new(config.engine_config().clone());
    let mut executor = RecordingExecutor::new();
    let report = replay::run(&mut engine, &trace, &mut executor)?;

    for entry in &report.entries {
        println!("{:<40} {}", entry.step.to_string(), entry.outcome);
        for call in &entry.calls {
            println!("    {}", call);
        }
    }

    let errors = report
        .entries
        .iter()
        .filter(|entry| matches!(entry.outcome, StepOutcome::Pressed(Err(_))))
        .count();
    if errors > 0 {
        bail!("{} adaptive key press(es) were rejected", errors);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config_path = resolve_config_path(&args)?;
    let config = Config::from_toml_path(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    log::info!("Loaded config from {}", config_path.display());

    if args.check_config {
        print_summary(&config);
        println!("Configuration is valid");
        return Ok(());
    }

    match &args.trace {
        Some(trace_path) => replay_trace(&config, trace_path),
        None => {
            print_summary(&config);
            Ok(())
        }
    }
}

// Stub for when the cli feature is not enabled
#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("Error: adaptive-key binary requires the 'cli' feature to be enabled.");
    eprintln!("Please build with: cargo build --features cli --bin adaptive-key");
    std::process::exit(1);
}
