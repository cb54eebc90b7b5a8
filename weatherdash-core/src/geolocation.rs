use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::GeolocationError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Single-shot position lookup.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Geolocator backed by a position known up front (command line or config).
/// Without one, every lookup reports [`GeolocationError::Unsupported`].
#[derive(Debug, Clone, Default)]
pub struct StaticGeolocator {
    position: Option<Coordinates>,
}

impl StaticGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(Some(Coordinates { latitude, longitude }))
    }

    pub fn unsupported() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        self.position.ok_or(GeolocationError::Unsupported)
    }
}
