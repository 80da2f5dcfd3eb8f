//! # Tide Coefficient Command-Line Entry Point
//!
//! This binary wires the collaborators together: it resolves the
//! configuration once, opens the cache backend, builds the provider client
//! and dispatches to the requested command.
//!
//! ```text
//! tide-coefficient refresh            # fetch all ports, publish national coefficient
//! tide-coefficient national           # cached national coefficient
//! tide-coefficient port brest         # real-time view of one port
//! tide-coefficient ports              # configured reference ports
//! ```

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tide_coef_lib::cache::KeyValueStore;
use tide_coef_lib::config::{Config, CONFIG_FILE};
use tide_coef_lib::provider::WorldTidesClient;
use tide_coef_lib::{cache, realtime, refresh, report};

/// Environment variable consulted when the configuration has no API key.
const API_KEY_ENV: &str = "WORLDTIDES_API_KEY";

#[derive(Parser)]
#[command(
    name = "tide-coefficient",
    version,
    about = "Real-time tide state and national tide coefficient"
)]
struct Cli {
    /// Path of the TOML configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every reference port and publish the national coefficient
    Refresh,
    /// Show the national coefficient, refreshing when the cache is empty
    National,
    /// Show the real-time tide of one port
    Port {
        /// Port identifier, e.g. "brest"
        id: String,
    },
    /// List the configured reference ports
    Ports,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load_from_path(&cli.config);
    if config.provider.api_key.is_none() {
        config.provider.api_key = std::env::var(API_KEY_ENV).ok();
    }

    let rt = tokio::runtime::Runtime::new()?;
    let now = Utc::now();

    match cli.command {
        Command::Ports => list_ports(&config, cli.json)?,
        Command::Refresh => {
            let store = open_store(&config)?;
            let source = provider(&config)?;
            let result = rt.block_on(refresh::refresh_all(&source, store.as_ref(), &config, now));
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_refresh(&result));
            }
            if result.national.is_none() {
                anyhow::bail!("no national coefficient could be produced");
            }
        }
        Command::National => {
            let store = open_store(&config)?;
            let source = optional_provider(&config);
            let national = rt
                .block_on(refresh::national_coefficient(
                    source.as_ref(),
                    store.as_ref(),
                    &config,
                    now,
                ))
                .context("no national coefficient available")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&national)?);
            } else {
                print!("{}", report::render_national(&national));
            }
        }
        Command::Port { id } => {
            let port = config
                .port(&id)
                .with_context(|| format!("port not found: {id}"))?;
            let store = open_store(&config)?;
            let source = optional_provider(&config);
            let extremes = rt
                .block_on(refresh::cached_or_fetch(
                    source.as_ref(),
                    store.as_ref(),
                    &config,
                    port,
                    now,
                ))
                .with_context(|| format!("fetching tides for {}", port.name))?;
            let view = realtime::current_view_with_fallback(&extremes, now, &config.calibration)
                .with_context(|| {
                    format!("cannot find tide data for current time at {}", port.name)
                })?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", report::render_view(port, &view));
            }
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<Box<dyn KeyValueStore>> {
    cache::open(&config.cache).context("opening cache")
}

fn provider(config: &Config) -> anyhow::Result<WorldTidesClient> {
    WorldTidesClient::new(&config.provider)
        .with_context(|| format!("set provider.api_key or {API_KEY_ENV}"))
}

/// Provider client when one can be built; cache hits never need it.
fn optional_provider(config: &Config) -> Option<WorldTidesClient> {
    match WorldTidesClient::new(&config.provider) {
        Ok(client) => Some(client),
        Err(e) => {
            log::debug!("No provider available: {e}");
            None
        }
    }
}

fn list_ports(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config.ports)?);
        return Ok(());
    }
    for port in &config.ports {
        println!(
            "{:<18} {:<20} {:>8.3} {:>8.3}  {}",
            port.id, port.name, port.latitude, port.longitude, port.region
        );
    }
    Ok(())
}
