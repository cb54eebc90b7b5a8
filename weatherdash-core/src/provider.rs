use crate::{Config, FetchError, LocationQuery, WeatherSnapshot, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and forecast for a location.
///
/// Implementations issue both requests for the same query; the call succeeds
/// only when both do.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weatherdash configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let provider = match config.api_base_url.as_deref() {
        Some(base) => OpenWeatherProvider::with_base_url(api_key, base)?,
        None => OpenWeatherProvider::new(api_key)?,
    };

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        if cfg.api_key().is_some() {
            // OPENWEATHER_API_KEY is set in this environment.
            return;
        }
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            api_base_url: Some("http://127.0.0.1:9/data/2.5".to_string()),
            ..Config::default()
        };

        assert!(provider_from_config(&cfg).is_ok());
    }
}
