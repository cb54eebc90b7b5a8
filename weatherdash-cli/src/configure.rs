use anyhow::{Context, Result};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};
use weatherdash_core::{Config, DisplayUnit, HomeLocation};

/// Walk the user through the settings and save them.
pub fn run_wizard() -> Result<()> {
    let mut cfg = Config::load()?;

    let key_prompt = if cfg.api_key.is_some() {
        "OpenWeather API key (leave empty to keep the current one):"
    } else {
        "OpenWeather API key:"
    };
    let api_key = Password::new(key_prompt)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        cfg.set_api_key(api_key.trim().to_string());
    }

    cfg.default_city = Text::new("Default city:")
        .with_default(&cfg.default_city)
        .prompt()
        .context("Failed to read default city")?;

    let units = vec![DisplayUnit::Celsius, DisplayUnit::Fahrenheit];
    let start = units.iter().position(|u| *u == cfg.unit).unwrap_or(0);
    cfg.unit = Select::new("Temperature unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read unit")?;

    let set_home = Confirm::new("Set a home location for \"my location\"?")
        .with_default(cfg.home.is_some())
        .prompt()
        .context("Failed to read answer")?;
    cfg.home = if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;
        Some(HomeLocation { latitude, longitude })
    } else {
        None
    };

    let path = cfg.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
