use std::io::BufRead;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use weatherdash_core::{
    Command as DashCommand, Config, Coordinates, Dashboard, DashboardSettings, DisplayUnit,
    DisplayUpdater, LocationQuery, StaticGeolocator, Surface, WeatherProvider,
    provider_from_config,
};

use crate::{configure, terminal::TerminalSurface};

const WATCH_HELP: &str = "Type a city to search, :here for your location, :r to refresh, \
                          :c / :f to switch units, :q to quit.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, default city, unit and home location.
    Configure,

    /// Print the dashboard once.
    Show(LocationArgs),

    /// Keep the dashboard open, refreshing on a timer and reading commands
    /// from stdin.
    Watch(LocationArgs),
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// City to show. Without it, your location or the default city is used.
    pub city: Option<String>,

    /// Latitude used as "your location".
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude used as "your location".
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Display unit: celsius or fahrenheit.
    #[arg(long, short)]
    pub unit: Option<String>,
}

impl LocationArgs {
    fn position(&self, cfg: &Config) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => cfg.home.map(|home| Coordinates {
                latitude: home.latitude,
                longitude: home.longitude,
            }),
        }
    }

    fn settings(&self, cfg: &Config) -> anyhow::Result<DashboardSettings> {
        let mut settings = DashboardSettings::from(cfg);
        if let Some(unit) = &self.unit {
            settings.unit = DisplayUnit::try_from(unit.as_str())?;
        }
        Ok(settings)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure::run_wizard(),
            Command::Show(args) => show(args).await,
            Command::Watch(args) => watch(args).await,
        }
    }
}

async fn show(args: LocationArgs) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let settings = args.settings(&cfg)?;
    let provider = provider_from_config(&cfg)?;

    let query = match (&args.city, args.position(&cfg)) {
        (Some(city), _) => LocationQuery::city(city.trim()),
        (None, Some(pos)) => LocationQuery::coordinates(pos.latitude, pos.longitude),
        (None, None) => LocationQuery::city(settings.default_city.clone()),
    };

    tracing::info!(%query, "showing weather");
    let snapshot = provider
        .fetch(&query)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;

    let mut display = DisplayUpdater::new();
    let mut surface = TerminalSurface::stdout();
    surface.show_weather(display.render(&snapshot, settings.unit, &Local::now()));

    Ok(())
}

async fn watch(args: LocationArgs) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let settings = args.settings(&cfg)?;
    let provider: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(&cfg)?);
    let geolocator = Arc::new(StaticGeolocator::new(args.position(&cfg)));

    let mut dashboard = Dashboard::new(provider, geolocator, TerminalSurface::stdout(), settings);
    if let Some(city) = &args.city {
        dashboard.start_with(LocationQuery::city(city.trim()));
    }

    println!("{WATCH_HELP}");

    let (tx, rx) = mpsc::channel(16);
    spawn_stdin_reader(tx.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(DashCommand::Shutdown).await;
        }
    });

    dashboard.run(rx).await;
    Ok(())
}

/// Stdin is read on a plain thread so a pending read never holds up exit.
fn spawn_stdin_reader(tx: mpsc::Sender<DashCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(%err, "failed to read stdin");
                    break;
                }
            };

            match parse_command(&line) {
                Some(command) => {
                    if tx.blocking_send(command).is_err() {
                        return;
                    }
                }
                None if line.trim() == ":help" => println!("{WATCH_HELP}"),
                None => {}
            }
        }

        let _ = tx.blocking_send(DashCommand::Shutdown);
    });
}

/// Map one line of watch-mode input to a dashboard command.
fn parse_command(line: &str) -> Option<DashCommand> {
    let line = line.trim();

    match line {
        "" | ":help" => None,
        ":q" | ":quit" => Some(DashCommand::Shutdown),
        ":r" | ":refresh" => Some(DashCommand::Refresh),
        ":here" => Some(DashCommand::UseMyLocation),
        ":c" | ":celsius" => Some(DashCommand::SetUnit(DisplayUnit::Celsius)),
        ":f" | ":fahrenheit" => Some(DashCommand::SetUnit(DisplayUnit::Fahrenheit)),
        _ if line.starts_with(':') => {
            println!("Unknown command {line}. {WATCH_HELP}");
            None
        }
        city => Some(DashCommand::Search(city.to_string())),
    }
}
