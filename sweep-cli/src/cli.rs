use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password};
use tracing::info;
use weather_sweep_core::{
    Config, Coordinator, ProviderId, RunRequest, SnapshotStore,
    locations::load_locations,
    provider::{default_provider_from_config, provider_from_config},
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-sweep", version, about = "Parallel weather sweep over a list of locations")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset, e.g. "debug" or "weather_sweep_core=trace".
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Fetch current, history and forecast metrics for every location and save a snapshot.
    Run {
        /// Number of parallel workers.
        #[arg(long, short = 'w')]
        workers: Option<usize>,

        /// Number of past days to fetch.
        #[arg(long)]
        history_days: Option<u32>,

        /// Number of future days to fetch.
        #[arg(long)]
        forecast_days: Option<u32>,

        /// TOML file with [[location]] entries.
        #[arg(long, short = 'l')]
        locations: Option<PathBuf>,

        /// Where to write the snapshot JSON.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Print the last saved snapshot.
    Show {
        /// Print the raw snapshot JSON.
        #[arg(long)]
        json: bool,

        /// Snapshot file to read.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Run { workers, history_days, forecast_days, locations, output, provider } => {
                let mut config = load_config()?;
                let settings = &mut config.run;
                if let Some(n) = workers {
                    settings.worker_count = n;
                }
                if let Some(n) = history_days {
                    settings.history_days = n;
                }
                if let Some(n) = forecast_days {
                    settings.forecast_days = n;
                }
                if locations.is_some() {
                    settings.locations_file = locations;
                }
                if output.is_some() {
                    settings.output_path = output;
                }
                run_sweep(&config, provider.as_deref()).await
            }
            Command::Show { json, output } => {
                let mut config = load_config()?;
                if output.is_some() {
                    config.run.output_path = output;
                }
                show(&config, json)
            }
        }
    }
}

fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key);

    if config.default_provider_id().ok() != Some(id) {
        let make_default = Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved credentials for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn run_sweep(config: &Config, provider: Option<&str>) -> anyhow::Result<()> {
    let provider = match provider {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, config)?,
        None => default_provider_from_config(config)?,
    };

    let Some(locations_file) = config.run.locations_file.as_deref() else {
        bail!(
            "No locations file given.\n\
             Hint: pass `--locations data/locations.toml` or set `run.locations_file` in {}.",
            Config::config_file_path()?.display()
        );
    };
    let locations = load_locations(locations_file)?;

    let request = RunRequest {
        locations,
        worker_count: config.run.worker_count,
        history_days: config.run.history_days,
        forecast_days: config.run.forecast_days,
    };

    let snapshot = Coordinator::new(provider)
        .execute(&request)
        .await
        .context("Weather sweep failed")?;

    let store = SnapshotStore::new(config.snapshot_path()?);
    store.save(&snapshot)?;
    info!(path = %store.path().display(), "snapshot saved");

    output::print_snapshot(&snapshot);
    println!("\nWrote {}", store.path().display());
    Ok(())
}

fn show(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = SnapshotStore::new(config.snapshot_path()?);
    let Some(snapshot) = store.load()? else {
        bail!(
            "No snapshot at {}.\nHint: run `weather-sweep run` first.",
            store.path().display()
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    output::print_snapshot(&snapshot);

    let max_age = chrono::Duration::minutes(i64::from(config.run.refresh_interval_minutes));
    if store.is_stale(chrono::Utc::now(), max_age) {
        eprintln!(
            "\nSnapshot is older than {} minutes; run `weather-sweep run` to refresh.",
            config.run.refresh_interval_minutes
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "weather-sweep",
            "run",
            "-w",
            "4",
            "--history-days",
            "3",
            "--locations",
            "data/locations.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Command::Run { workers, history_days, forecast_days, locations, .. } => {
                assert_eq!(workers, Some(4));
                assert_eq!(history_days, Some(3));
                assert_eq!(forecast_days, None);
                assert_eq!(locations, Some(PathBuf::from("data/locations.toml")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_defaults_to_table() {
        let cli = Cli::try_parse_from(["weather-sweep", "show"]).unwrap();
        assert_eq!(cli.log_level, "info");
        assert!(matches!(cli.command, Command::Show { json: false, output: None }));
    }
}
