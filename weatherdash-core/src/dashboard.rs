//! Event loop tying user commands, refresh ticks and fetch results together.
//!
//! A [`Dashboard`] owns its [`Session`] and is driven from one task. Fetches
//! run concurrently, but only the most recently issued one may change what is
//! shown; slower answers to older requests are dropped.

use chrono::Local;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinSet},
};

use crate::{
    config::Config,
    display::{DashboardView, DisplayUpdater, Surface},
    error::{DashboardError, GeolocationError},
    geolocation::Geolocator,
    model::{DisplayUnit, LocationQuery, UnitToggle, WeatherSnapshot},
    provider::WeatherProvider,
    scheduler::{RefreshScheduler, RefreshTick},
    session::{FetchTicket, Session},
};

/// User-facing actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Free-text place search. Blank input is ignored.
    Search(String),
    /// Weather for the device position.
    UseMyLocation,
    /// Re-fetch the last shown place.
    Refresh,
    SetUnit(DisplayUnit),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Displayed,
    Errored,
}

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub default_city: String,
    pub refresh_interval: Duration,
    pub unit: DisplayUnit,
    pub unit_toggle: UnitToggle,
}

impl From<&Config> for DashboardSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_city: config.default_city.clone(),
            refresh_interval: config.refresh_interval(),
            unit: config.unit,
            unit_toggle: config.unit_toggle,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// How a fetch finds its location.
#[derive(Debug, Clone)]
enum Plan {
    Fetch(LocationQuery),
    Locate(OnLocateFailure),
}

#[derive(Debug, Clone)]
enum OnLocateFailure {
    FetchCity(String),
    Report,
    ReportRefresh,
}

/// The query that was sent, with its answer.
type Fetched = (LocationQuery, WeatherSnapshot);

type FetchOutcome = (FetchTicket, Result<Fetched, DashboardError>);

pub struct Dashboard<S: Surface> {
    provider: Arc<dyn WeatherProvider>,
    geolocator: Arc<dyn Geolocator>,
    surface: S,
    settings: DashboardSettings,
    session: Session,
    display: DisplayUpdater,
    scheduler: RefreshScheduler,
    ticks: mpsc::UnboundedReceiver<RefreshTick>,
    in_flight: JoinSet<FetchOutcome>,
    phase: Phase,
}

impl<S: Surface> Dashboard<S> {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Arc<dyn Geolocator>,
        surface: S,
        settings: DashboardSettings,
    ) -> Self {
        let (scheduler, ticks) = RefreshScheduler::channel(settings.refresh_interval);

        Self {
            provider,
            geolocator,
            surface,
            session: Session::new(settings.unit),
            settings,
            display: DisplayUpdater::new(),
            scheduler,
            ticks,
            in_flight: JoinSet::new(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.display.view()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_refresh_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    /// Initial load: the device position, else the default city.
    pub fn start(&mut self) {
        let fallback = OnLocateFailure::FetchCity(self.settings.default_city.clone());
        self.spawn_fetch(Plan::Locate(fallback));
    }

    /// Like [`Dashboard::start`], but for a place chosen up front.
    pub fn start_with(&mut self, query: LocationQuery) {
        self.spawn_fetch(Plan::Fetch(query));
    }

    /// Apply one command. Returns `false` once the dashboard should stop.
    pub fn dispatch(&mut self, command: Command) -> bool {
        tracing::debug!(?command, "dispatch");

        match command {
            Command::Search(text) => {
                let city = text.trim();
                if !city.is_empty() {
                    self.spawn_fetch(Plan::Fetch(LocationQuery::city(city)));
                }
            }
            Command::UseMyLocation => self.spawn_fetch(Plan::Locate(OnLocateFailure::Report)),
            Command::Refresh => {
                let plan = match self.session.last_location() {
                    Some(query) => Plan::Fetch(query.clone()),
                    None => Plan::Locate(OnLocateFailure::ReportRefresh),
                };
                self.spawn_fetch(plan);
            }
            Command::SetUnit(unit) => self.set_unit(unit),
            Command::Shutdown => return false,
        }

        true
    }

    /// Wait for every fetch in flight and apply the results.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            self.on_joined(joined);
        }
    }

    /// Run until [`Command::Shutdown`] or until `commands` closes, then hand
    /// back the surface.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> S {
        if self.phase == Phase::Idle && self.in_flight.is_empty() {
            self.start();
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.dispatch(command) {
                            break;
                        }
                    }
                    None => break,
                },
                Some(RefreshTick) = self.ticks.recv() => {
                    tracing::info!("scheduled refresh");
                    self.dispatch(Command::Refresh);
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_joined(joined);
                }
            }
        }

        self.scheduler.cancel();
        self.in_flight.abort_all();
        self.surface
    }

    fn spawn_fetch(&mut self, plan: Plan) {
        let ticket = self.session.begin_fetch();
        let provider = Arc::clone(&self.provider);
        let geolocator = Arc::clone(&self.geolocator);

        tracing::info!(?ticket, ?plan, "fetch issued");
        self.phase = Phase::Loading;
        self.surface.show_loading();

        self.in_flight.spawn(async move {
            let result = resolve_and_fetch(provider.as_ref(), geolocator.as_ref(), plan).await;
            (ticket, result)
        });
    }

    fn on_joined(&mut self, joined: Result<FetchOutcome, JoinError>) {
        match joined {
            Ok((ticket, result)) => self.finish(ticket, result),
            Err(err) if err.is_cancelled() => {}
            Err(err) => tracing::error!(%err, "fetch task failed"),
        }
    }

    fn finish(&mut self, ticket: FetchTicket, result: Result<Fetched, DashboardError>) {
        if !self.session.is_latest(ticket) {
            tracing::debug!(?ticket, "discarding stale fetch result");
            return;
        }

        match result {
            Ok((query, snapshot)) => {
                let Some(snapshot) = self.session.complete(ticket, &query, snapshot) else {
                    return;
                };
                let view = self.display.render(&snapshot, self.session.unit(), &Local::now());
                self.surface.show_weather(view);
                self.phase = Phase::Displayed;
                self.scheduler.start();
                tracing::debug!(interval = ?self.scheduler.interval(), "refresh armed");
            }
            Err(err) => {
                tracing::warn!(%err, "fetch failed");
                self.phase = Phase::Errored;
                self.surface.show_error(&err.user_message());
            }
        }
    }

    fn set_unit(&mut self, unit: DisplayUnit) {
        if self.session.set_unit(unit) == unit {
            return;
        }

        let Some(snapshot) = self.session.snapshot() else {
            return;
        };
        let view = self.display.apply_unit(snapshot, unit, self.settings.unit_toggle);

        if let (Some(view), Phase::Displayed) = (view, self.phase) {
            self.surface.show_weather(view);
        }
    }
}

async fn resolve_and_fetch(
    provider: &dyn WeatherProvider,
    geolocator: &dyn Geolocator,
    plan: Plan,
) -> Result<Fetched, DashboardError> {
    let query = match plan {
        Plan::Fetch(query) => query,
        Plan::Locate(on_failure) => match geolocator.locate().await {
            Ok(pos) => LocationQuery::coordinates(pos.latitude, pos.longitude),
            Err(err) => located_fallback(err, on_failure)?,
        },
    };

    let snapshot = provider.fetch(&query).await?;
    Ok((query, snapshot))
}

fn located_fallback(
    err: GeolocationError,
    on_failure: OnLocateFailure,
) -> Result<LocationQuery, DashboardError> {
    tracing::info!(%err, "geolocation failed");

    match on_failure {
        OnLocateFailure::FetchCity(city) => Ok(LocationQuery::City(city)),
        OnLocateFailure::Report => Err(DashboardError::Geolocation(err)),
        OnLocateFailure::ReportRefresh => Err(DashboardError::RefreshUnavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FetchError,
        geolocation::StaticGeolocator,
        model::ForecastSample,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use std::{collections::HashMap, sync::Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Shown {
        Loading,
        Weather(DashboardView),
        Error(String),
    }

    #[derive(Debug, Default)]
    struct RecordingSurface {
        shown: Vec<Shown>,
    }

    impl RecordingSurface {
        fn last(&self) -> Option<&Shown> {
            self.shown.last()
        }

        fn weather_count(&self) -> usize {
            self.shown.iter().filter(|s| matches!(s, Shown::Weather(_))).count()
        }
    }

    impl Surface for RecordingSurface {
        fn show_loading(&mut self) {
            self.shown.push(Shown::Loading);
        }

        fn show_weather(&mut self, view: &DashboardView) {
            self.shown.push(Shown::Weather(view.clone()));
        }

        fn show_error(&mut self, message: &str) {
            self.shown.push(Shown::Error(message.to_string()));
        }
    }

    #[derive(Debug, Default)]
    struct FakeProvider {
        calls: Mutex<Vec<LocationQuery>>,
        delays: HashMap<String, Duration>,
        missing: Vec<String>,
        unnamed_coordinates: bool,
    }

    impl FakeProvider {
        fn calls(&self) -> Vec<LocationQuery> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn capitalized(name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn week_of_samples() -> Vec<ForecastSample> {
        let start = DateTime::parse_from_rfc3339("2026-03-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        (0..56)
            .map(|i| ForecastSample {
                timestamp: start + ChronoDuration::hours(3 * i),
                temperature_c: 15.0,
                description: "clear sky".to_string(),
                icon: "01d".to_string(),
            })
            .collect()
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
            self.calls.lock().unwrap().push(query.clone());

            let name = match query {
                LocationQuery::City(name) => capitalized(name),
                LocationQuery::Coordinates { .. } if self.unnamed_coordinates => query.to_string(),
                LocationQuery::Coordinates { .. } => "Here".to_string(),
            };

            if let Some(delay) = self.delays.get(&name) {
                tokio::time::sleep(*delay).await;
            }
            if self.missing.contains(&name) {
                return Err(FetchError::LocationNotFound(name));
            }

            Ok(WeatherSnapshot {
                location_name: name,
                country: "FR".to_string(),
                temperature_c: 20.0,
                feels_like_c: 18.4,
                humidity_pct: 70,
                wind_speed_mps: 10.0,
                description: "clear sky".to_string(),
                icon: "01d".to_string(),
                forecast: week_of_samples(),
                fetched_at: Utc::now(),
            })
        }
    }

    fn dashboard(
        provider: &Arc<FakeProvider>,
        geolocator: StaticGeolocator,
    ) -> Dashboard<RecordingSurface> {
        Dashboard::new(
            Arc::clone(provider) as Arc<dyn WeatherProvider>,
            Arc::new(geolocator),
            RecordingSurface::default(),
            DashboardSettings::default(),
        )
    }

    #[tokio::test]
    async fn paris_end_to_end_then_unit_toggle() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());
        assert_eq!(dash.phase(), Phase::Idle);

        dash.dispatch(Command::Search("Paris".into()));
        assert_eq!(dash.phase(), Phase::Loading);
        dash.settle().await;

        assert_eq!(dash.phase(), Phase::Displayed);
        assert!(dash.is_refresh_armed());
        let snapshot = dash.session().snapshot().unwrap().clone();
        assert_eq!(snapshot.location_name, "Paris");

        let view = dash.view().unwrap();
        assert_eq!(view.forecast.len(), 6);
        assert_eq!(view.temperature, 20);
        assert_eq!(view.feels_like, "18°C");
        assert_eq!(view.wind, "36 km/h");
        assert_eq!(view.uv_index, 4);

        dash.dispatch(Command::SetUnit(DisplayUnit::Fahrenheit));
        let view = dash.view().unwrap();
        assert_eq!(view.temperature, 68);
        assert_eq!(view.feels_like, "65°F");
        assert!(view.forecast.iter().all(|card| card.temperature == "59°"));
        assert_eq!(view.wind, "36 km/h");

        assert_eq!(**dash.session().snapshot().unwrap(), *snapshot);
        assert_eq!(provider.calls(), vec![LocationQuery::city("Paris")]);
        assert_eq!(dash.surface().weather_count(), 2);
    }

    #[tokio::test]
    async fn toggling_to_current_unit_does_nothing() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::Search("Paris".into()));
        dash.settle().await;
        dash.dispatch(Command::SetUnit(DisplayUnit::Celsius));

        assert_eq!(dash.surface().weather_count(), 1);
    }

    #[tokio::test]
    async fn unknown_city_shows_error_without_arming_refresh() {
        let provider = Arc::new(FakeProvider {
            missing: vec!["Atlantis".to_string()],
            ..FakeProvider::default()
        });
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::Search("Atlantis".into()));
        dash.settle().await;

        assert_eq!(dash.phase(), Phase::Errored);
        assert!(!dash.is_refresh_armed());
        assert!(dash.session().snapshot().is_none());
        assert_eq!(dash.surface().last(), Some(&Shown::Error("City not found".into())));
    }

    #[tokio::test]
    async fn blank_search_is_ignored() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        assert!(dash.dispatch(Command::Search("   ".into())));
        dash.settle().await;

        assert_eq!(dash.phase(), Phase::Idle);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slower_older_fetch_is_discarded() {
        let provider = Arc::new(FakeProvider {
            delays: HashMap::from([
                ("Oslo".to_string(), Duration::from_secs(5)),
                ("Rome".to_string(), Duration::from_secs(1)),
            ]),
            ..FakeProvider::default()
        });
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::Search("Oslo".into()));
        dash.dispatch(Command::Search("Rome".into()));
        dash.settle().await;

        assert_eq!(dash.session().snapshot().unwrap().location_name, "Rome");
        assert_eq!(dash.surface().weather_count(), 1);
        assert_eq!(dash.view().unwrap().location, "Rome, FR");
    }

    #[tokio::test(start_paused = true)]
    async fn faster_older_fetch_is_discarded() {
        let provider = Arc::new(FakeProvider {
            delays: HashMap::from([
                ("Oslo".to_string(), Duration::from_secs(1)),
                ("Rome".to_string(), Duration::from_secs(5)),
            ]),
            ..FakeProvider::default()
        });
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::Search("Oslo".into()));
        dash.dispatch(Command::Search("Rome".into()));
        dash.settle().await;

        assert_eq!(dash.session().snapshot().unwrap().location_name, "Rome");
        assert_eq!(dash.surface().weather_count(), 1);
    }

    #[tokio::test]
    async fn startup_without_geolocation_uses_default_city() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.start();
        dash.settle().await;

        assert_eq!(provider.calls(), vec![LocationQuery::city("London")]);
        assert_eq!(dash.phase(), Phase::Displayed);
    }

    #[tokio::test]
    async fn startup_with_geolocation_uses_coordinates() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::at(48.85, 2.35));

        dash.start();
        dash.settle().await;

        assert_eq!(provider.calls(), vec![LocationQuery::coordinates(48.85, 2.35)]);
        assert_eq!(
            dash.session().last_location(),
            Some(&LocationQuery::city("Here"))
        );
    }

    #[tokio::test]
    async fn my_location_without_geolocation_reports_error() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::UseMyLocation);
        dash.settle().await;

        assert_eq!(dash.phase(), Phase::Errored);
        assert_eq!(
            dash.surface().last(),
            Some(&Shown::Error("Geolocation is not supported on this device".into()))
        );
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn refresh_with_nothing_known_reports_error() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::Refresh);
        dash.settle().await;

        assert_eq!(
            dash.surface().last(),
            Some(&Shown::Error("Could not refresh weather data".into()))
        );
    }

    #[tokio::test]
    async fn refresh_reuses_resolved_name() {
        let provider = Arc::new(FakeProvider::default());
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::Search("paris".into()));
        dash.settle().await;
        dash.dispatch(Command::Refresh);
        dash.settle().await;

        assert_eq!(
            provider.calls(),
            vec![LocationQuery::city("paris"), LocationQuery::city("Paris")]
        );
    }

    #[tokio::test]
    async fn refresh_after_unnamed_coordinates_locates_again() {
        let provider = Arc::new(FakeProvider {
            unnamed_coordinates: true,
            ..FakeProvider::default()
        });
        let mut dash = dashboard(&provider, StaticGeolocator::at(10.0, -30.0));

        dash.start();
        dash.settle().await;
        assert_eq!(dash.phase(), Phase::Displayed);
        assert_eq!(dash.view().unwrap().location, "10.0000,-30.0000, FR");
        assert_eq!(dash.session().last_location(), None);

        dash.dispatch(Command::Refresh);
        dash.settle().await;

        let here = LocationQuery::coordinates(10.0, -30.0);
        assert_eq!(provider.calls(), vec![here.clone(), here]);
        assert!(provider.calls().iter().all(|q| !q.is_city()));
        assert_eq!(dash.phase(), Phase::Displayed);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_snapshot() {
        let provider = Arc::new(FakeProvider {
            missing: vec!["Atlantis".to_string()],
            ..FakeProvider::default()
        });
        let mut dash = dashboard(&provider, StaticGeolocator::unsupported());

        dash.dispatch(Command::Search("Paris".into()));
        dash.settle().await;
        dash.dispatch(Command::Search("Atlantis".into()));
        dash.settle().await;

        assert_eq!(dash.phase(), Phase::Errored);
        assert_eq!(dash.session().snapshot().unwrap().location_name, "Paris");
        assert_eq!(dash.session().last_location(), Some(&LocationQuery::city("Paris")));
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_refreshes_on_schedule() {
        let provider = Arc::new(FakeProvider::default());
        let dash = dashboard(&provider, StaticGeolocator::unsupported());
        let (tx, rx) = mpsc::channel(8);

        let handle = tokio::spawn(dash.run(rx));
        tx.send(Command::Search("Paris".into())).await.unwrap();

        tokio::time::sleep(Duration::from_secs(901)).await;
        tx.send(Command::Shutdown).await.unwrap();
        let surface = handle.await.unwrap();

        assert_eq!(
            provider.calls(),
            vec![
                LocationQuery::city("London"),
                LocationQuery::city("Paris"),
                LocationQuery::city("Paris"),
            ]
        );
        assert!(surface.weather_count() >= 2);
    }
}
