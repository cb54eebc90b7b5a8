//! Per-dashboard state: what is shown, in which unit, and which fetch is the
//! one whose answer still matters.

use std::sync::Arc;

use crate::model::{DisplayUnit, LocationQuery, WeatherSnapshot};

/// Identifies one issued fetch. Later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
pub struct Session {
    last_location: Option<LocationQuery>,
    snapshot: Option<Arc<WeatherSnapshot>>,
    unit: DisplayUnit,
    issued: u64,
}

impl Session {
    pub fn new(unit: DisplayUnit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    /// Issue a ticket for a new fetch, superseding every earlier one.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    pub fn is_latest(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Store a fetched snapshot if `ticket` is still the latest.
    ///
    /// The previous snapshot is replaced whole and the location is
    /// remembered by its resolved place name. A coordinate lookup the
    /// provider could not name is forgotten, so the next refresh locates
    /// again. Returns the stored snapshot, or `None` when the result is stale.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        query: &LocationQuery,
        snapshot: WeatherSnapshot,
    ) -> Option<Arc<WeatherSnapshot>> {
        if !self.is_latest(ticket) {
            return None;
        }

        let snapshot = Arc::new(snapshot);
        self.last_location = remembered_location(query, &snapshot);
        self.snapshot = Some(Arc::clone(&snapshot));
        Some(snapshot)
    }

    pub fn last_location(&self) -> Option<&LocationQuery> {
        self.last_location.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Arc<WeatherSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    /// Returns the previous unit.
    pub fn set_unit(&mut self, unit: DisplayUnit) -> DisplayUnit {
        std::mem::replace(&mut self.unit, unit)
    }
}

/// Unnamed coordinate results carry the coordinates themselves as the name.
fn remembered_location(query: &LocationQuery, snapshot: &WeatherSnapshot) -> Option<LocationQuery> {
    let name = snapshot.location_name.trim();
    if name.is_empty() || (!query.is_city() && name == query.to_string()) {
        return None;
    }
    Some(LocationQuery::city(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot_named(name: &str, temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: name.to_string(),
            country: "FR".to_string(),
            temperature_c: temp,
            feels_like_c: temp - 1.0,
            humidity_pct: 50,
            wind_speed_mps: 3.0,
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
            forecast: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn latest_ticket_is_applied() {
        let mut session = Session::default();
        let ticket = session.begin_fetch();

        let query = LocationQuery::city("paris");

        let stored = session.complete(ticket, &query, snapshot_named("Paris", 20.0));
        assert!(stored.is_some());
        assert_eq!(session.snapshot().unwrap().location_name, "Paris");
        assert_eq!(session.last_location(), Some(&LocationQuery::city("Paris")));
    }

    #[test]
    fn stale_ticket_is_dropped() {
        let mut session = Session::default();
        let first = session.begin_fetch();
        let second = session.begin_fetch();

        let rome = LocationQuery::city("Rome");
        let oslo = LocationQuery::city("Oslo");
        assert!(session.complete(second, &rome, snapshot_named("Rome", 25.0)).is_some());
        assert!(session.complete(first, &oslo, snapshot_named("Oslo", 2.0)).is_none());

        assert_eq!(session.snapshot().unwrap().location_name, "Rome");
        assert!(first < second);
    }

    #[test]
    fn named_coordinates_are_remembered_by_name() {
        let mut session = Session::default();
        let ticket = session.begin_fetch();
        let here = LocationQuery::coordinates(48.85, 2.35);

        session.complete(ticket, &here, snapshot_named("Paris", 20.0));
        assert_eq!(session.last_location(), Some(&LocationQuery::city("Paris")));
    }

    #[test]
    fn unnamed_coordinates_are_forgotten() {
        let mut session = Session::default();
        let here = LocationQuery::coordinates(10.0, -30.0);

        let first = session.begin_fetch();
        session.complete(first, &LocationQuery::city("Paris"), snapshot_named("Paris", 20.0));
        let second = session.begin_fetch();
        let stored = session.complete(second, &here, snapshot_named("10.0000,-30.0000", 26.0));

        assert!(stored.is_some());
        assert_eq!(session.snapshot().unwrap().location_name, "10.0000,-30.0000");
        assert_eq!(session.last_location(), None);
    }

    #[test]
    fn unit_defaults_to_celsius_and_swaps() {
        let mut session = Session::default();
        assert_eq!(session.unit(), DisplayUnit::Celsius);

        let previous = session.set_unit(DisplayUnit::Fahrenheit);
        assert_eq!(previous, DisplayUnit::Celsius);
        assert_eq!(session.unit(), DisplayUnit::Fahrenheit);
    }
}
