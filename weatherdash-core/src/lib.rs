//! Core library for the `weatherdash` dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - The OpenWeather fetcher behind the `WeatherProvider` trait
//! - Forecast aggregation and unit conversion
//! - The display projection, refresh timer and the dashboard event loop
//!
//! It is used by `weatherdash-cli`, but any front-end that implements
//! [`display::Surface`] can drive a [`Dashboard`].

pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod forecast;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod scheduler;
pub mod session;
pub mod units;

pub use config::{Config, HomeLocation};
pub use dashboard::{Command, Dashboard, DashboardSettings, Phase};
pub use display::{DashboardView, DisplayUpdater, ForecastCard, Surface};
pub use error::{DashboardError, FetchError, GeolocationError};
pub use geolocation::{Coordinates, Geolocator, StaticGeolocator};
pub use model::{DisplayUnit, ForecastSample, LocationQuery, UnitToggle, WeatherSnapshot};
pub use provider::{WeatherProvider, provider_from_config};
pub use session::Session;
