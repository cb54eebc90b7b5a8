use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units;

/// What the user asked the dashboard to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationQuery {
    City(String),
    Coordinates { latitude: f64, longitude: f64 },
}

impl LocationQuery {
    pub fn city(name: impl Into<String>) -> Self {
        LocationQuery::City(name.into())
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        LocationQuery::Coordinates { latitude, longitude }
    }

    pub fn is_city(&self) -> bool {
        matches!(self, LocationQuery::City(_))
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::City(name) => f.write_str(name),
            LocationQuery::Coordinates { latitude, longitude } => {
                write!(f, "{latitude:.4},{longitude:.4}")
            }
        }
    }
}

/// One 3-hour step of the provider forecast, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub description: String,
    pub icon: String,
}

/// Current conditions plus the raw forecast for one location.
///
/// Values are stored in metric units; display conversion happens at render
/// time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon: String,
    pub forecast: Vec<ForecastSample>,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Rough UV estimate derived from temperature. The provider does not
    /// report UV, so treat this as low confidence.
    pub fn approx_uv_index(&self) -> u8 {
        units::approx_uv_index(self.temperature_c)
    }

    pub fn location_label(&self) -> String {
        if self.country.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.country)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl DisplayUnit {
    pub fn symbol(&self) -> char {
        match self {
            DisplayUnit::Celsius => 'C',
            DisplayUnit::Fahrenheit => 'F',
        }
    }

    /// Canonical Celsius value expressed as a whole degree in this unit.
    pub fn degrees(&self, celsius: f64) -> i32 {
        match self {
            DisplayUnit::Celsius => units::round_half_up(celsius),
            DisplayUnit::Fahrenheit => units::celsius_to_fahrenheit(celsius),
        }
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayUnit::Celsius => f.write_str("celsius"),
            DisplayUnit::Fahrenheit => f.write_str("fahrenheit"),
        }
    }
}

impl TryFrom<&str> for DisplayUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "c" | "celsius" | "metric" => Ok(DisplayUnit::Celsius),
            "f" | "fahrenheit" | "imperial" => Ok(DisplayUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

/// How a unit toggle updates forecast labels that are already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitToggle {
    /// Recompute every label from the stored snapshot.
    #[default]
    Canonical,
    /// Convert the rendered integer labels in place. Repeated toggles can
    /// drift by a degree.
    Relabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unit_parses_short_and_long_names() {
        assert_eq!(DisplayUnit::try_from("C").unwrap(), DisplayUnit::Celsius);
        assert_eq!(DisplayUnit::try_from("fahrenheit").unwrap(), DisplayUnit::Fahrenheit);
        let err = DisplayUnit::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit"));
    }

    #[test]
    fn display_unit_converts_from_canonical() {
        assert_eq!(DisplayUnit::Celsius.degrees(20.4), 20);
        assert_eq!(DisplayUnit::Fahrenheit.degrees(20.0), 68);
    }

    #[test]
    fn location_query_display() {
        assert_eq!(LocationQuery::city("Paris").to_string(), "Paris");
        assert_eq!(
            LocationQuery::coordinates(48.8566, 2.3522).to_string(),
            "48.8566,2.3522"
        );
    }
}
