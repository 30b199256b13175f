//! `sensor-guard` binary.
//!
//! ```text
//! sensor-guard run [--config demo.toml] [--max-ticks N] [--tick-scale N] [--state cursors.json]
//! sensor-guard inspect '<cursor>'
//! sensor-guard check demo.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use sensor_guard::config::{load_config, validate_config, ConfigError, DemoConfig};
use sensor_guard::cursor::GuardCursor;
use sensor_guard::demo::{assets, build_sensor};
use sensor_guard::host::{CursorStore, Job, Scheduler};
use sensor_guard::lifecycle::{signals, Shutdown};
use sensor_guard::observability::init_logging;

#[derive(Parser)]
#[command(name = "sensor-guard")]
#[command(about = "Run and inspect failure-suppressing sensor guards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted demo sensors
    Run {
        /// TOML configuration file (built-in demo sensors when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop each sensor after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Divide every sensor interval by this factor
        #[arg(long)]
        tick_scale: Option<u64>,

        /// Load cursors from and save them to this JSON file
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Decode a stored cursor and print the guard counters
    Inspect {
        cursor: String,
    },
    /// Validate a configuration file
    Check {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            max_ticks,
            tick_scale,
            state,
        } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => DemoConfig::default(),
            };
            if max_ticks.is_some() {
                config.scheduler.max_ticks = max_ticks;
            }
            if let Some(scale) = tick_scale {
                config.scheduler.tick_scale = scale;
            }
            validate_config(&config).map_err(ConfigError::Validation)?;

            init_logging(&config.observability.log_level);
            tracing::info!("sensor-guard v{} starting", env!("CARGO_PKG_VERSION"));
            run(config, state).await?;
        }
        Commands::Inspect { cursor } => {
            let decoded = GuardCursor::decode(Some(cursor.as_str()));
            let counters: serde_json::Map<String, serde_json::Value> = decoded
                .state
                .iter()
                .map(|(key, count)| (key.to_string(), count.into()))
                .collect();
            let out = serde_json::json!({
                "host_cursor": decoded.host,
                "counters": counters,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Check { path } => match load_config(&path) {
            Ok(config) => println!("{}: ok ({} sensors)", path.display(), config.sensors.len()),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

async fn run(config: DemoConfig, state: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let store = match &state {
        Some(path) => CursorStore::load_from_file(path)?,
        None => CursorStore::new(),
    };

    let job: Job = Arc::new(|sensor: &str, request: &sensor_guard::RunRequest| {
        assets::refresh_data_job(sensor, request);
    });

    let mut scheduler = Scheduler::new(store.clone(), config.scheduler.clone(), job);
    for sensor in &config.sensors {
        scheduler.add(build_sensor(sensor)?);
    }

    let shutdown = Shutdown::new();
    signals::spawn_ctrl_c_handler(shutdown.clone());

    let results = scheduler.run(&shutdown).await;
    for (sensor, stats) in &results {
        tracing::info!(
            sensor = %sensor,
            ticks = stats.ticks,
            launched = stats.launched,
            skipped = stats.skipped,
            failed = stats.failed,
            "Sensor summary"
        );
    }

    if let Some(path) = &state {
        store.save_to_file(path)?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
