//! Login Behavior Sensor CLI
//!
//! Captures or replays login-form interaction telemetry and prints the
//! resulting feature vector.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::RecvTimeoutError;
use login_behavior_sensor::{
    capture::{EventHub, InteractionEvent},
    config::Config,
    core::{EnvironmentProvider, FeatureVector, ManualEnvironment, SystemEnvironment},
    replay::{parse_records, replay_records},
    session::BehaviorSession,
    transparency::create_shared_log,
    CAPTURE_DECLARATION, FEATURE_ORDER, VERSION,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "behavior-sensor")]
#[command(version = VERSION)]
#[command(about = "Login-form interaction telemetry and feature extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture events from stdin (one JSON event per line) until EOF or Ctrl+C
    Start {
        /// Output format for the final snapshot
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Replay a recorded session (one {"t": ms, "event": {...}} per line)
    Replay {
        /// Recorded session file
        file: PathBuf,

        /// Session start instant in milliseconds
        #[arg(long, default_value = "0")]
        start_ms: f64,

        /// Snapshot instant in milliseconds (defaults to the last event)
        #[arg(long)]
        at_ms: Option<f64>,

        /// Output format for the snapshot
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// List feature names in vector order
    Features,

    /// Display the capture declaration
    Privacy,

    /// Show configuration
    Config,

    /// Replay a recorded session and submit it with credentials
    #[cfg(feature = "transport")]
    Login {
        /// Recorded session file
        file: PathBuf,

        #[arg(long)]
        username: String,

        /// Password (read from BEHAVIOR_SENSOR_PASSWORD if omitted)
        #[arg(long, env = "BEHAVIOR_SENSOR_PASSWORD", hide_env_values = true)]
        password: String,

        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Nested feature object
    Json,
    /// Flat numeric vector in feature order
    Vector,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { format } => cmd_start(format),
        Commands::Replay {
            file,
            start_ms,
            at_ms,
            format,
        } => {
            let features = replay_file(&file, start_ms, at_ms)?;
            print_features(&features, format)
        }
        Commands::Features => {
            for name in FEATURE_ORDER {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Privacy => {
            println!("{CAPTURE_DECLARATION}");
            Ok(())
        }
        Commands::Config => cmd_config(),
        #[cfg(feature = "transport")]
        Commands::Login {
            file,
            username,
            password,
            base_url,
        } => cmd_login(&file, &username, &password, base_url),
    }
}

fn cmd_start(format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config();
    let environment = Arc::new(SystemEnvironment::new(config.environment.clone()));
    let transparency_log = create_shared_log();

    let hub = EventHub::with_transparency_log(
        environment.clone(),
        config.channel_capacity,
        transparency_log.clone(),
    );
    let mut session =
        BehaviorSession::new(&config, environment).with_transparency_log(transparency_log.clone());
    session.start_with(&hub)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    // Stdin is read on its own thread so the loop below can notice Ctrl+C.
    let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
    let emitter = hub.emitter();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for (index, line) in stdin.lock().lines().enumerate() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InteractionEvent>(&line) {
                Ok(event) => emitter.emit(event),
                Err(e) => tracing::warn!(line = index + 1, "Skipping unreadable event: {e}"),
            }
        }
        let _ = done_tx.send(());
    });

    tracing::info!(session_id = ?session.session_id(), "Capturing from stdin; Ctrl+C or EOF to finish");

    while running.load(Ordering::SeqCst) {
        match done_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                session.pump();
            }
        }
    }

    session.pump();
    session.dispose();

    let features = session.snapshot();
    print_features(&features, format)?;

    eprintln!();
    eprintln!("{}", transparency_log.summary());
    Ok(())
}

/// Replay a recorded session deterministically and snapshot it.
fn replay_file(path: &Path, start_ms: f64, at_ms: Option<f64>) -> anyhow::Result<FeatureVector> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read session file {path:?}"))?;
    let records = parse_records(&content);

    let config = load_config();
    let environment = Arc::new(replay_environment(&config));
    let features = replay_records(&config, environment, &records, start_ms, at_ms)?;
    Ok(features)
}

/// A scripted environment carrying the configured host metrics.
fn replay_environment(config: &Config) -> ManualEnvironment {
    let host = SystemEnvironment::new(config.environment.clone());
    ManualEnvironment::new()
        .with_viewport(host.viewport())
        .with_timezone_offset(host.timezone_offset_minutes())
        .with_device_pixel_ratio(host.device_pixel_ratio())
}

fn print_features(features: &FeatureVector, format: OutputFormat) -> anyhow::Result<()> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(features)?,
        OutputFormat::Vector => serde_json::to_string(&features.to_ordered_values())?,
    };
    println!("{output}");
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(feature = "transport")]
fn cmd_login(
    file: &Path,
    username: &str,
    password: &str,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    use login_behavior_sensor::BlockingAuthClient;

    let features = replay_file(file, 0.0, None)?;

    let mut transport = load_config().transport;
    if let Some(url) = base_url {
        transport.base_url = url;
    }

    let client = BlockingAuthClient::new(transport)?;
    let response = client.login(username, password, &features)?;

    println!("Decision: {}", response.decision);
    println!("Risk score: {:.3}", response.risk_score);
    println!("Session: {}", response.session_id);
    if let Some(is_bot) = response.is_bot {
        println!("Bot: {is_bot}");
    }
    Ok(())
}

/// Load the config file, falling back to defaults on any error.
fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default configuration: {e}");
        Config::default()
    })
}
