//! Typed errors for fetching and locating.
//!
//! Each error knows the single message the dashboard shows for it; nothing
//! more structured crosses into the presentation surface.

use thiserror::Error;

const FETCH_FAILED: &str = "Failed to fetch weather data";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// City query that the provider does not know.
    #[error("location not found: {0}")]
    LocationNotFound(String),

    /// Transport, status or parse failure.
    #[error("weather data unavailable: {}", .0.as_deref().unwrap_or("no details"))]
    Unavailable(Option<String>),
}

impl FetchError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        FetchError::Unavailable(Some(message.into()))
    }

    pub fn user_message(&self) -> String {
        match self {
            FetchError::LocationNotFound(_) => "City not found".to_string(),
            FetchError::Unavailable(Some(msg)) if !msg.is_empty() => msg.clone(),
            FetchError::Unavailable(_) => FETCH_FAILED.to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::unavailable("Weather service timed out")
        } else {
            tracing::debug!("weather request failed: {err}");
            FetchError::Unavailable(None)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    Denied,
    #[error("geolocation unsupported")]
    Unsupported,
}

/// Why a dashboard fetch attempt ended without new weather.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The user asked for their own location and it could not be resolved.
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    /// Refresh with no remembered city and no usable geolocation.
    #[error("nothing to refresh")]
    RefreshUnavailable,
}

impl DashboardError {
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Fetch(err) => err.user_message(),
            DashboardError::Geolocation(GeolocationError::Denied) => {
                "Please enable location access to use this feature".to_string()
            }
            DashboardError::Geolocation(GeolocationError::Unsupported) => {
                "Geolocation is not supported on this device".to_string()
            }
            DashboardError::RefreshUnavailable => "Could not refresh weather data".to_string(),
        }
    }
}
