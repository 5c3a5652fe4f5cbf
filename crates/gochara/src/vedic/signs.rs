//! Signs, sign lords, and ascendant-relative houses.

use crate::ephemeris::types::Body;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize degrees to [0, 360).
pub fn wrap360(value: f64) -> f64 {
    let normalized = value.rem_euclid(360.0);
    // rem_euclid can round a tiny negative up to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

const SIGNS: [Sign; 12] = [
    Sign::Aries,
    Sign::Taurus,
    Sign::Gemini,
    Sign::Cancer,
    Sign::Leo,
    Sign::Virgo,
    Sign::Libra,
    Sign::Scorpio,
    Sign::Sagittarius,
    Sign::Capricorn,
    Sign::Aquarius,
    Sign::Pisces,
];

const SIGN_NAMES: [&str; 12] = [
    "Aries",
    "Taurus",
    "Gemini",
    "Cancer",
    "Leo",
    "Virgo",
    "Libra",
    "Scorpio",
    "Sagittarius",
    "Capricorn",
    "Aquarius",
    "Pisces",
];

// Traditional rulerships; outer planets never rule.
const SIGN_LORDS: [Body; 12] = [
    Body::Mars,    // Aries
    Body::Venus,   // Taurus
    Body::Mercury, // Gemini
    Body::Moon,    // Cancer
    Body::Sun,     // Leo
    Body::Mercury, // Virgo
    Body::Venus,   // Libra
    Body::Mars,    // Scorpio
    Body::Jupiter, // Sagittarius
    Body::Saturn,  // Capricorn
    Body::Saturn,  // Aquarius
    Body::Jupiter, // Pisces
];

impl Sign {
    pub const ALL: [Sign; 12] = SIGNS;

    pub fn from_index(index: usize) -> Sign {
        SIGNS[index % 12]
    }

    /// Sign containing a longitude.
    pub fn from_longitude(longitude: f64) -> Sign {
        Sign::from_index((wrap360(longitude) / 30.0) as usize)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        SIGN_NAMES[self.index()]
    }

    pub fn lord(self) -> Body {
        SIGN_LORDS[self.index()]
    }

    /// The sign `count` places further on (0 = this sign).
    pub fn offset(self, count: usize) -> Sign {
        Sign::from_index(self.index() + count)
    }

    /// Forward distance in signs, 0..12.
    pub fn steps_to(self, other: Sign) -> usize {
        (other.index() + 12 - self.index()) % 12
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// House number (1..=12) of `sign` counted from the ascendant sign.
pub fn house_from_lagna(sign: Sign, lagna: Sign) -> u8 {
    lagna.steps_to(sign) as u8 + 1
}

/// Lord of house `house` (1..=12) for an ascendant sign.
pub fn house_lord(lagna: Sign, house: u8) -> Body {
    lagna.offset(house.saturating_sub(1) as usize).lord()
}

/// Format degrees as `DD°MM'`.
pub fn dms_short(degrees: f64) -> String {
    let d = degrees.trunc() as i64;
    let m = ((degrees - d as f64) * 60.0).trunc() as i64;
    format!("{:02}°{:02}'", d, m)
}

/// An inclusive degree range inside a sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegreeWindow {
    pub start: f64,
    pub end: f64,
}

impl DegreeWindow {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, degree: f64) -> bool {
        self.start <= degree && degree <= self.end
    }

    pub fn label(&self) -> String {
        format!("{} - {}", dms_short(self.start), dms_short(self.end))
    }
}

pub const PANAPHARA_WINDOWS: [DegreeWindow; 4] = [
    DegreeWindow::new(2.5, 5.0),
    DegreeWindow::new(10.0, 12.5),
    DegreeWindow::new(17.5, 20.0),
    DegreeWindow::new(25.0, 27.5),
];

pub const APOKLIMA_WINDOWS: [DegreeWindow; 4] = [
    DegreeWindow::new(5.0, 7.5),
    DegreeWindow::new(12.5, 15.0),
    DegreeWindow::new(20.0, 22.5),
    DegreeWindow::new(27.5, 30.0),
];

/// Succedent houses.
pub const PANAPHARA_HOUSES: [u8; 4] = [2, 5, 8, 11];
/// Cadent houses.
pub const APOKLIMA_HOUSES: [u8; 4] = [3, 6, 9, 12];

pub fn in_any_window(windows: &[DegreeWindow], degree: f64) -> bool {
    windows.iter().any(|w| w.contains(degree))
}

/// Signs occupying the given houses, in house order.
pub fn house_signs(lagna: Sign, houses: &[u8; 4]) -> [Sign; 4] {
    houses.map(|h| lagna.offset(h as usize - 1))
}
