use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use gaswatch::data::{duration, format};
use gaswatch::{
    ClassifiedReading, FileSource, HttpSource, Poller, ProfileTable, Settings, SimulatedSource,
    TelemetrySource,
};

#[derive(Parser, Debug)]
#[command(name = "gaswatch", version)]
#[command(about = "Poll ammonia, methane and carbon-monoxide sensors and report their status")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gateway base URL (readings are fetched from <URL>/raw)
    #[arg(short, long)]
    url: Option<String>,

    /// Polling interval (e.g., "5s", "500ms")
    #[arg(short, long)]
    interval: Option<String>,

    /// Immediate retries after a failed fetch
    #[arg(short, long)]
    retries: Option<u32>,

    /// Number of readings kept in the history
    #[arg(long)]
    capacity: Option<usize>,

    /// Read readings from a JSON file instead of the gateway
    #[arg(short, long, conflicts_with_all = ["url", "simulate"])]
    file: Option<PathBuf>,

    /// Generate simulated readings instead of contacting the gateway
    #[arg(long, conflicts_with_all = ["url", "file"])]
    simulate: bool,

    /// Fetch one reading, print it as JSON and exit
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;
    let profiles = Arc::new(settings.profiles.clone());
    let source = build_source(&args, &settings, profiles.clone())?;

    if args.once {
        return fetch_once(source.as_ref(), &profiles).await;
    }
    run_poller(source, profiles, settings).await
}

/// Configuration file and environment, then command-line overrides.
fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;

    if let Some(url) = &args.url {
        settings.base_url = url.clone();
    }
    if let Some(interval) = &args.interval {
        settings.poll.interval =
            duration::parse_duration(interval).context("Invalid value for --interval")?;
    }
    if let Some(retries) = args.retries {
        settings.poll.retries = retries;
    }
    if let Some(capacity) = args.capacity {
        settings.poll.history_capacity = capacity;
    }

    settings.validate()?;
    Ok(settings)
}

fn build_source(
    args: &Args,
    settings: &Settings,
    profiles: Arc<ProfileTable>,
) -> Result<Arc<dyn TelemetrySource>> {
    if let Some(path) = &args.file {
        return Ok(Arc::new(FileSource::new(path, profiles)));
    }
    if args.simulate {
        return Ok(Arc::new(SimulatedSource::new(profiles)));
    }

    let source = HttpSource::builder()
        .endpoint(settings.base_url.as_str())
        .timeout(settings.request_timeout)
        .profiles(profiles)
        .build()
        .context("Failed to create HTTP client")?;
    Ok(Arc::new(source))
}

/// Single fetch without retries, printed as JSON.
async fn fetch_once(source: &dyn TelemetrySource, profiles: &ProfileTable) -> Result<()> {
    let reading = source
        .fetch()
        .await
        .with_context(|| format!("Fetch from {} failed", source.description()))?;
    let classified = ClassifiedReading::classify(reading, profiles);

    let json = reading_json(&classified, profiles);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn run_poller(
    source: Arc<dyn TelemetrySource>,
    profiles: Arc<ProfileTable>,
    settings: Settings,
) -> Result<()> {
    let poller = Poller::new(source, profiles.clone(), settings.poll);
    let mut updates = poller.subscribe();
    poller.start()?;

    // Only a successful cycle replaces the history.
    let mut printed = updates.borrow().history.clone();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, stopping");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if !Arc::ptr_eq(&state.history, &printed) {
                    if let Some(current) = &state.current {
                        println!("{}", format_line(current, &profiles));
                    }
                    printed = state.history;
                }
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn format_line(reading: &ClassifiedReading, profiles: &ProfileTable) -> String {
    let mut line = format::format_clock(reading.timestamp_ms());
    for (sensor, value, status) in reading.iter() {
        let profile = profiles.get(sensor);
        line.push_str(&format!(
            "  {} {} [{}]",
            profile.name,
            format::format_value(value, &profile.unit),
            status.label()
        ));
    }
    line
}

fn reading_json(reading: &ClassifiedReading, profiles: &ProfileTable) -> serde_json::Value {
    let sensors: serde_json::Map<String, serde_json::Value> = reading
        .iter()
        .map(|(sensor, value, status)| {
            let profile = profiles.get(sensor);
            let entry = json!({
                "name": profile.name,
                "value": value,
                "unit": profile.unit,
                "status": status,
                "label": status.label(),
                "thresholds": profile.thresholds,
            });
            (sensor.key().to_string(), entry)
        })
        .collect();

    json!({
        "timestamp_ms": reading.timestamp_ms(),
        "time": format!(
            "{} {}",
            format::format_date(reading.timestamp_ms()),
            format::format_clock(reading.timestamp_ms())
        ),
        "timestamp_origin": reading.reading.origin(),
        "overall": reading.overall(),
        "sensors": sensors,
    })
}
