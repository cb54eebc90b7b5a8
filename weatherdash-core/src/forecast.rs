//! Daily summary of the 3-hour forecast.
//!
//! Samples are bucketed by local calendar day in the order the days first
//! appear, and one representative sample is kept per day.

use chrono::{NaiveDateTime, TimeZone, Timelike};
use std::ops::RangeInclusive;

use crate::model::ForecastSample;

/// Number of days shown on the dashboard.
pub const FORECAST_DAYS: usize = 6;

/// Local hours that count as "midday" when picking a representative sample.
pub const MIDDAY_HOURS: RangeInclusive<u32> = 11..=14;

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

/// One display day of the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecastEntry {
    /// Local wall time of the first sample seen for this day.
    pub date: NaiveDateTime,
    pub sample: ForecastSample,
}

impl DailyForecastEntry {
    /// Short weekday, e.g. `"Mon"`.
    pub fn day_label(&self) -> String {
        self.date.format("%a").to_string()
    }

    /// Short month and day, e.g. `"Jan 15"`.
    pub fn date_label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }

    pub fn icon_url(&self) -> String {
        small_icon_url(&self.sample.icon)
    }
}

pub fn small_icon_url(icon: &str) -> String {
    format!("{ICON_URL_BASE}/{icon}.png")
}

pub fn large_icon_url(icon: &str) -> String {
    format!("{ICON_URL_BASE}/{icon}@2x.png")
}

/// Group `samples` into at most [`FORECAST_DAYS`] days, keeping the order in
/// which days first appear. Local time is taken in `tz`.
pub fn aggregate<Tz: TimeZone>(samples: &[ForecastSample], tz: &Tz) -> Vec<DailyForecastEntry> {
    let mut days: Vec<DayBucket<'_>> = Vec::new();

    for sample in samples {
        let local = sample.timestamp.with_timezone(tz).naive_local();
        let key = day_key(&local);

        match days.iter_mut().find(|d| d.key == key) {
            Some(day) => day.samples.push((local, sample)),
            None => days.push(DayBucket {
                key,
                first_seen: local,
                samples: vec![(local, sample)],
            }),
        }
    }

    days.into_iter()
        .take(FORECAST_DAYS)
        .filter_map(|day| {
            let sample = day.representative()?;
            Some(DailyForecastEntry {
                date: day.first_seen,
                sample: sample.clone(),
            })
        })
        .collect()
}

struct DayBucket<'a> {
    key: String,
    first_seen: NaiveDateTime,
    samples: Vec<(NaiveDateTime, &'a ForecastSample)>,
}

impl<'a> DayBucket<'a> {
    fn representative(&self) -> Option<&'a ForecastSample> {
        self.samples
            .iter()
            .find(|(local, _)| MIDDAY_HOURS.contains(&local.hour()))
            .or_else(|| self.samples.get(self.samples.len() / 2))
            .or_else(|| self.samples.first())
            .map(|(_, sample)| *sample)
    }
}

/// Localized weekday + month + day, e.g. `"Monday, 1/15"`.
fn day_key(local: &NaiveDateTime) -> String {
    local.format("%A, %-m/%-d").to_string()
}
