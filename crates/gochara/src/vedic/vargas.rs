//! Divisional chart (varga) helpers.
//!
//! Only the navamsa (D9) is needed by the rule set. Each sign is split into
//! nine padas of 3°20'; the starting sign for pada 0 rotates with the sign's
//! position in its group of four.

use crate::vedic::signs::{wrap360, Sign};

/// Width of one navamsa pada, as truncated by the rule tables.
pub const NAVAMSA_PADA: f64 = 3.333333333;

// Rotation applied to the pada count, keyed by sign_index % 4.
const NAVAMSA_OFFSETS: [usize; 4] = [0, 9, 6, 3];

/// D9 sign for a sidereal longitude.
pub fn navamsa_sign(longitude: f64) -> Sign {
    let lon = wrap360(longitude);
    let sign = Sign::from_longitude(lon);
    let degree = lon - sign.index() as f64 * 30.0;
    let pada = (degree / NAVAMSA_PADA) as usize;
    Sign::from_index(pada + NAVAMSA_OFFSETS[sign.index() % 4])
}
