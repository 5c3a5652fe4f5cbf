#![allow(dead_code)]

use chrono::{DateTime, Utc};
use gochara::ephemeris::{Body, EphemerisBackend, EphemerisError, GeoLocation, HouseSystem};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Call counts shared with the test after the backend moves into an adapter.
#[derive(Clone, Default)]
pub struct Counters {
    pub ascendant: Arc<AtomicUsize>,
    pub longitude: Arc<AtomicUsize>,
}

impl Counters {
    pub fn ascendant_calls(&self) -> usize {
        self.ascendant.load(Ordering::SeqCst)
    }

    pub fn longitude_calls(&self) -> usize {
        self.longitude.load(Ordering::SeqCst)
    }
}

/// Every body and the ascendant move at a constant rate from `epoch`.
/// Sidereal offset is zero, so positions come back exactly as configured.
pub struct LinearBackend {
    epoch: DateTime<Utc>,
    bodies: HashMap<Body, (f64, f64)>,
    ascendant: (f64, f64),
    failing: Option<(DateTime<Utc>, DateTime<Utc>)>,
    counters: Counters,
}

impl LinearBackend {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            bodies: HashMap::new(),
            ascendant: (0.0, 0.0),
            failing: None,
            counters: Counters::default(),
        }
    }

    /// `longitude` at the epoch, moving `per_day` degrees per day.
    pub fn body(mut self, body: Body, longitude: f64, per_day: f64) -> Self {
        self.bodies.insert(body, (longitude, per_day));
        self
    }

    pub fn fixed(mut self, placements: &[(Body, f64)]) -> Self {
        for (body, longitude) in placements {
            self.bodies.insert(*body, (*longitude, 0.0));
        }
        self
    }

    pub fn ascendant(mut self, longitude: f64, per_day: f64) -> Self {
        self.ascendant = (longitude, per_day);
        self
    }

    /// Ascendant queries in `[from, to)` fail.
    pub fn failing_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.failing = Some((from, to));
        self
    }

    pub fn counters(&self) -> Counters {
        self.counters.clone()
    }

    fn days(&self, instant: DateTime<Utc>) -> f64 {
        (instant - self.epoch).num_seconds() as f64 / 86_400.0
    }
}

impl EphemerisBackend for LinearBackend {
    fn sidereal_mode(&self, constant: &str) -> Option<i32> {
        match constant {
            "SIDM_LAHIRI" => Some(1),
            "SIDM_KRISHNAMURTI" => Some(5),
            _ => None,
        }
    }

    fn set_sidereal_mode(&mut self, _mode: i32) {}

    fn tropical_longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64, EphemerisError> {
        self.counters.longitude.fetch_add(1, Ordering::SeqCst);
        let (base, per_day) = self
            .bodies
            .get(&body)
            .copied()
            .ok_or(EphemerisError::UnsupportedBody { body })?;
        Ok(base + per_day * self.days(instant))
    }

    fn reference_offset(&self, _instant: DateTime<Utc>) -> Result<f64, EphemerisError> {
        Ok(0.0)
    }

    fn tropical_ascendant(
        &self,
        instant: DateTime<Utc>,
        _location: GeoLocation,
        _system: HouseSystem,
    ) -> Result<f64, EphemerisError> {
        self.counters.ascendant.fetch_add(1, Ordering::SeqCst);
        if let Some((from, to)) = self.failing {
            if from <= instant && instant < to {
                return Err(EphemerisError::HouseCalculationFailed {
                    instant,
                    message: "simulated failure".to_string(),
                });
            }
        }
        let (base, per_day) = self.ascendant;
        Ok(base + per_day * self.days(instant))
    }
}

pub fn chennai() -> GeoLocation {
    GeoLocation {
        lat: 13.0827,
        lon: 80.2707,
    }
}

/// Static sky where only an Aries ascendant passes all five muhurtha rules
/// for a Mercury karaka, and Ketu sits in Capricorn.
pub const ARIES_ONLY_SKY: [(Body, f64); 10] = [
    (Body::Sun, 280.0),
    (Body::Moon, 155.0),
    (Body::Mars, 280.0),
    (Body::Mercury, 100.0),
    (Body::Jupiter, 35.0),
    (Body::Venus, 280.0),
    (Body::Saturn, 190.0),
    (Body::Rahu, 95.0),
    (Body::Uranus, 10.0),
    (Body::Neptune, 320.0),
];
