use std::fmt::Write as _;
use std::io::{self, Write};

use weatherdash_core::{DashboardView, Surface};

/// Draws the dashboard as plain text.
pub struct TerminalSurface<W: Write + Send> {
    out: W,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    #[cfg(test)]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(%err, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send> Surface for TerminalSurface<W> {
    fn show_loading(&mut self) {
        self.emit("Loading weather...\n");
    }

    fn show_weather(&mut self, view: &DashboardView) {
        let text = format_view(view);
        self.emit(&text);
    }

    fn show_error(&mut self, message: &str) {
        self.emit(&format!("Error: {message}\n"));
    }
}

pub fn format_view(view: &DashboardView) -> String {
    let mut s = String::new();

    let _ = writeln!(s);
    let _ = writeln!(s, "{}    {}", view.location, view.date_time);
    let _ = writeln!(
        s,
        "  {}°{}  {}",
        view.temperature,
        view.unit.symbol(),
        view.description
    );
    let _ = writeln!(
        s,
        "  Feels like {} | Humidity {} | Wind {} | UV ~{}",
        view.feels_like, view.humidity, view.wind, view.uv_index
    );
    let _ = writeln!(s, "  Icon: {}", view.icon_url);
    let _ = writeln!(s);

    for card in &view.forecast {
        let _ = writeln!(
            s,
            "  {:<4}{:<8}{:>5}  {}",
            card.day, card.date, card.temperature, card.description
        );
    }

    let _ = writeln!(s);
    let _ = writeln!(s, "  {}", view.last_updated);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use weatherdash_core::{DisplayUnit, DisplayUpdater, ForecastSample, WeatherSnapshot};

    fn view() -> DashboardView {
        let noon = DateTime::parse_from_rfc3339("2026-01-12T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let snapshot = WeatherSnapshot {
            location_name: "Paris".to_string(),
            country: "FR".to_string(),
            temperature_c: 20.0,
            feels_like_c: 19.0,
            humidity_pct: 55,
            wind_speed_mps: 10.0,
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
            forecast: vec![ForecastSample {
                timestamp: noon,
                temperature_c: 21.0,
                description: "sunny".to_string(),
                icon: "01d".to_string(),
            }],
            fetched_at: noon,
        };

        DisplayUpdater::new()
            .render(&snapshot, DisplayUnit::Celsius, &noon)
            .clone()
    }

    #[test]
    fn formats_panel() {
        let text = format_view(&view());

        assert!(text.contains("Paris, FR    Mon, Jan 12, 12:00:00 PM"));
        assert!(text.contains("  20°C  clear sky"));
        assert!(text.contains("Feels like 19°C | Humidity 55% | Wind 36 km/h | UV ~4"));
        assert!(text.contains("Mon Jan 12"));
        assert!(text.contains("21°  sunny"));
        assert!(text.contains("Last updated: 12:00:00 PM"));
    }

    #[test]
    fn surface_writes_errors() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.show_loading();
        surface.show_error("City not found");

        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert_eq!(out, "Loading weather...\nError: City not found\n");
    }
}
