//! Temperature, wind and UV conversions used when rendering.
//!
//! All rounding goes through [`round_half_up`], so `-2.5` becomes `-2` and
//! `2.5` becomes `3`.

use crate::model::DisplayUnit;

/// Highest value the UV approximation will report.
pub const UV_INDEX_MAX: u8 = 10;

const DEGREE: char = '°';

pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

pub fn celsius_to_fahrenheit(celsius: f64) -> i32 {
    round_half_up(celsius * 9.0 / 5.0 + 32.0)
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> i32 {
    round_half_up((fahrenheit - 32.0) * 5.0 / 9.0)
}

pub fn mps_to_kmh(speed_mps: f64) -> i32 {
    round_half_up(speed_mps * 3.6)
}

/// `min(floor(t / 5), 10)`, never below zero.
pub fn approx_uv_index(temperature_c: f64) -> u8 {
    let raw = (temperature_c / 5.0).floor();
    raw.clamp(0.0, f64::from(UV_INDEX_MAX)) as u8
}

/// Format a whole-degree value the way forecast cards show it: `"20°"`.
pub fn forecast_label(degrees: i32) -> String {
    format!("{degrees}{DEGREE}")
}

/// Format a whole-degree value with its unit suffix: `"15°C"`.
pub fn unit_label(degrees: i32, unit: DisplayUnit) -> String {
    format!("{degrees}{DEGREE}{}", unit.symbol())
}

/// Convert an already-rendered forecast label into `to`.
///
/// Only the leading integer of the label is read, so the result is computed
/// from a rounded value. Returns `None` when the label carries no number or
/// the unit does not change.
pub fn relabel_forecast_temp(label: &str, from: DisplayUnit, to: DisplayUnit) -> Option<String> {
    if from == to {
        return None;
    }

    let shown = f64::from(parse_leading_int(label)?);
    let converted = match to {
        DisplayUnit::Fahrenheit => celsius_to_fahrenheit(shown),
        DisplayUnit::Celsius => fahrenheit_to_celsius(shown),
    };

    Some(forecast_label(converted))
}

fn parse_leading_int(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }

    let value: i32 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
