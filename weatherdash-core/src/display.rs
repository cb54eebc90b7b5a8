//! Projection of a snapshot onto the dashboard panel.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::{
    forecast::{self, DailyForecastEntry},
    model::{DisplayUnit, UnitToggle, WeatherSnapshot},
    units,
};

/// One forecast day as shown on the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCard {
    pub day: String,
    pub date: String,
    pub icon_url: String,
    pub description: String,
    /// Rendered temperature, e.g. `"20°"`.
    pub temperature: String,
    temperature_c: f64,
}

impl ForecastCard {
    fn new(entry: &DailyForecastEntry, unit: DisplayUnit) -> Self {
        Self {
            day: entry.day_label(),
            date: entry.date_label(),
            icon_url: entry.icon_url(),
            description: entry.sample.description.clone(),
            temperature: units::forecast_label(unit.degrees(entry.sample.temperature_c)),
            temperature_c: entry.sample.temperature_c,
        }
    }
}

/// Everything the presentation surface needs to draw the weather panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub location: String,
    pub icon_url: String,
    pub icon_alt: String,
    pub temperature: i32,
    pub unit: DisplayUnit,
    pub description: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    /// Approximation from temperature, not a measurement.
    pub uv_index: u8,
    pub forecast: Vec<ForecastCard>,
    pub date_time: String,
    pub last_updated: String,
}

/// Where the dashboard is drawn.
pub trait Surface: Send {
    fn show_loading(&mut self);

    fn show_weather(&mut self, view: &DashboardView);

    /// Replaces the weather panel with `message`.
    fn show_error(&mut self, message: &str);
}

/// Keeps the panel currently on screen so unit toggles can update it
/// without another fetch.
#[derive(Debug, Default)]
pub struct DisplayUpdater {
    view: Option<DashboardView>,
}

impl DisplayUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }

    /// Build a fresh panel for `snapshot`, replacing whatever was shown.
    /// Forecast days are grouped in the time zone of `now`.
    pub fn render<Tz>(
        &mut self,
        snapshot: &WeatherSnapshot,
        unit: DisplayUnit,
        now: &DateTime<Tz>,
    ) -> &DashboardView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let days = forecast::aggregate(&snapshot.forecast, &now.timezone());

        let view = DashboardView {
            location: snapshot.location_label(),
            icon_url: forecast::large_icon_url(&snapshot.icon),
            icon_alt: snapshot.description.clone(),
            temperature: unit.degrees(snapshot.temperature_c),
            unit,
            description: snapshot.description.clone(),
            feels_like: units::unit_label(unit.degrees(snapshot.feels_like_c), unit),
            humidity: format!("{}%", snapshot.humidity_pct),
            wind: format!("{} km/h", units::mps_to_kmh(snapshot.wind_speed_mps)),
            uv_index: snapshot.approx_uv_index(),
            forecast: days.iter().map(|day| ForecastCard::new(day, unit)).collect(),
            date_time: now.format("%a, %b %-d, %I:%M:%S %p").to_string(),
            last_updated: format!("Last updated: {}", now.format("%-I:%M:%S %p")),
        };

        self.view.insert(view)
    }

    /// Re-express the shown panel in `unit`. Current and feels-like values
    /// always come from `snapshot`; forecast labels follow `policy`.
    ///
    /// Returns `None` when nothing has been rendered yet.
    pub fn apply_unit(
        &mut self,
        snapshot: &WeatherSnapshot,
        unit: DisplayUnit,
        policy: UnitToggle,
    ) -> Option<&DashboardView> {
        let view = self.view.as_mut()?;
        let previous = view.unit;

        view.unit = unit;
        view.temperature = unit.degrees(snapshot.temperature_c);
        view.feels_like = units::unit_label(unit.degrees(snapshot.feels_like_c), unit);

        for card in &mut view.forecast {
            match policy {
                UnitToggle::Canonical => {
                    card.temperature = units::forecast_label(unit.degrees(card.temperature_c));
                }
                UnitToggle::Relabel => {
                    if let Some(label) =
                        units::relabel_forecast_temp(&card.temperature, previous, unit)
                    {
                        card.temperature = label;
                    }
                }
            }
        }

        Some(&*view)
    }
}
