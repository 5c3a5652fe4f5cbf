//! Place lookup and local time handling at the library boundary.

use crate::ephemeris::GeoLocation;
use crate::error::{GocharaError, Result};
use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// A place with coordinates and a resolved timezone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlace {
    pub name: String,
    pub location: GeoLocation,
    #[serde(serialize_with = "serialize_offset")]
    pub utc_offset: FixedOffset,
}

fn serialize_offset<S: serde::Serializer>(offset: &FixedOffset, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(offset)
}

/// Turns a place name into coordinates and a timezone.
pub trait LocationResolver {
    fn resolve(&self, place: &str) -> Result<ResolvedPlace>;
}

#[derive(Debug, Clone)]
struct StaticEntry {
    name: String,
    location: GeoLocation,
    utc_offset: Option<FixedOffset>,
}

/// Case-insensitive table of known places.
#[derive(Debug, Clone, Default)]
pub struct StaticLocationResolver {
    places: HashMap<String, StaticEntry>,
}

impl StaticLocationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a place. Without an offset the place still resolves
    /// to coordinates but lookups fail with `TimezoneUnresolved`.
    pub fn insert(&mut self, name: impl Into<String>, location: GeoLocation, utc_offset: Option<FixedOffset>) {
        let name = name.into();
        self.places.insert(
            name.trim().to_lowercase(),
            StaticEntry {
                name,
                location,
                utc_offset,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl LocationResolver for StaticLocationResolver {
    fn resolve(&self, place: &str) -> Result<ResolvedPlace> {
        let entry = self
            .places
            .get(&place.trim().to_lowercase())
            .ok_or_else(|| GocharaError::LocationNotFound {
                place: place.to_string(),
            })?;
        let utc_offset = entry.utc_offset.ok_or_else(|| GocharaError::TimezoneUnresolved {
            place: entry.name.clone(),
        })?;
        Ok(ResolvedPlace {
            name: entry.name.clone(),
            location: entry.location,
            utc_offset,
        })
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM`, `Z` or `UTC`.
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset> {
    let invalid = |reason: &str| GocharaError::InvalidDateTimeInput {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| invalid("offset out of range"));
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid("expected a leading + or -")),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected HH:MM"));
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid("bad hours"))?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid("bad minutes"))?;
    if minutes >= 60 {
        return Err(invalid("minutes must be below 60"));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(|| invalid("offset out of range"))
}

/// Convert a local wall-clock time to UTC. A time that falls in a gap is
/// an error; an ambiguous one resolves to the earlier instant.
pub fn local_instant<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(GocharaError::InvalidDateTimeInput {
            input: naive.to_string(),
            reason: "local time does not exist in this timezone".to_string(),
        }),
    }
}

/// Parse a `YYYY-MM-DD` date and `HH:MM` time in `tz`.
pub fn parse_local_datetime<Tz: TimeZone>(date: &str, time: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let date_part = parse_date(date)?;
    let input = format!("{} {}", date.trim(), time.trim());
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|e| GocharaError::InvalidDateTimeInput {
        input,
        reason: e.to_string(),
    })?;
    local_instant(date_part.and_time(time), tz)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| GocharaError::InvalidDateTimeInput {
        input: date.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chennai() -> StaticLocationResolver {
        let mut resolver = StaticLocationResolver::new();
        resolver.insert(
            "Chennai",
            GeoLocation { lat: 13.0827, lon: 80.2707 },
            Some(parse_utc_offset("+05:30").unwrap()),
        );
        resolver.insert("Nowhere", GeoLocation { lat: 0.0, lon: 0.0 }, None);
        resolver
    }

    #[test]
    fn test_resolver_is_case_insensitive() {
        let place = chennai().resolve("  chennai ").unwrap();
        assert_eq!(place.name, "Chennai");
        assert_eq!(place.utc_offset.local_minus_utc(), 19800);
    }

    #[test]
    fn test_resolver_errors() {
        let resolver = chennai();
        assert!(matches!(
            resolver.resolve("Atlantis"),
            Err(GocharaError::LocationNotFound { .. })
        ));
        assert!(matches!(
            resolver.resolve("Nowhere"),
            Err(GocharaError::TimezoneUnresolved { .. })
        ));
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("-04:00").unwrap().local_minus_utc(), -4 * 3600);
        assert_eq!(parse_utc_offset("+0545").unwrap().local_minus_utc(), 5 * 3600 + 45 * 60);
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+05:75").is_err());
    }

    #[test]
    fn test_parse_local_datetime() {
        let ist = parse_utc_offset("+05:30").unwrap();
        let utc = parse_local_datetime("1990-07-14", "06:15", &ist).unwrap();
        assert_eq!(utc.to_rfc3339(), "1990-07-14T00:45:00+00:00");

        assert!(matches!(
            parse_local_datetime("1990-13-01", "06:15", &ist),
            Err(GocharaError::InvalidDateTimeInput { .. })
        ));
        assert!(parse_local_datetime("1990-07-14", "25:00", &ist).is_err());
    }
}
