//! Nakshatra utilities.
//!
//! Nakshatras are 27 lunar mansions, each spanning 13°20' (360/27 degrees).

use crate::ephemeris::types::Body;
use crate::vedic::signs::wrap360;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

pub const NAKSHATRA_SEGMENT_SIZE: f64 = 360.0 / 27.0;

// (display_name, lord)
const NAKSHATRA_ORDER: [(&str, Body); 27] = [
    ("Ashwini", Body::Ketu),
    ("Bharani", Body::Venus),
    ("Krittika", Body::Sun),
    ("Rohini", Body::Moon),
    ("Mrigashira", Body::Mars),
    ("Ardra", Body::Rahu),
    ("Punarvasu", Body::Jupiter),
    ("Pushya", Body::Saturn),
    ("Ashlesha", Body::Mercury),
    ("Magha", Body::Ketu),
    ("Purva Phalguni", Body::Venus),
    ("Uttara Phalguni", Body::Sun),
    ("Hasta", Body::Moon),
    ("Chitra", Body::Mars),
    ("Swati", Body::Rahu),
    ("Vishakha", Body::Jupiter),
    ("Anuradha", Body::Saturn),
    ("Jyeshtha", Body::Mercury),
    ("Mula", Body::Ketu),
    ("Purva Ashadha", Body::Venus),
    ("Uttara Ashadha", Body::Sun),
    ("Shravana", Body::Moon),
    ("Dhanishta", Body::Mars),
    ("Shatabhisha", Body::Rahu),
    ("Purva Bhadrapada", Body::Jupiter),
    ("Uttara Bhadrapada", Body::Saturn),
    ("Revati", Body::Mercury),
];

fn build_lord_table() -> HashMap<Body, Vec<Nakshatra>> {
    let mut table: HashMap<Body, Vec<Nakshatra>> = HashMap::new();
    for (idx, (_, lord)) in NAKSHATRA_ORDER.iter().enumerate() {
        table.entry(*lord).or_default().push(Nakshatra(idx as u8));
    }
    table
}

lazy_static::lazy_static! {
    static ref NAKSHATRAS_BY_LORD: HashMap<Body, Vec<Nakshatra>> = build_lord_table();
}

/// One of the 27 nakshatras, by index from Ashwini.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nakshatra(u8);

impl Nakshatra {
    /// Nakshatra at `index` modulo 27.
    pub fn from_index(index: usize) -> Nakshatra {
        Nakshatra((index % 27) as u8)
    }

    pub fn containing(longitude: f64) -> Nakshatra {
        Nakshatra::from_index((wrap360(longitude) / NAKSHATRA_SEGMENT_SIZE) as usize)
    }

    /// Nakshatras ruled by `lord`, in zodiac order. Outer planets rule none.
    pub fn ruled_by(lord: Body) -> &'static [Nakshatra] {
        NAKSHATRAS_BY_LORD
            .get(&lord)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        NAKSHATRA_ORDER[self.index()].0
    }

    pub fn lord(self) -> Body {
        NAKSHATRA_ORDER[self.index()].1
    }

    /// The nakshatra `count` places further on (0 = this one).
    pub fn offset(self, count: usize) -> Nakshatra {
        Nakshatra::from_index(self.index() + count)
    }

    pub fn start(self) -> f64 {
        self.index() as f64 * NAKSHATRA_SEGMENT_SIZE
    }

    pub fn end(self) -> f64 {
        (self.index() + 1) as f64 * NAKSHATRA_SEGMENT_SIZE
    }

    /// Half-open membership test on sidereal longitude.
    pub fn contains(self, longitude: f64) -> bool {
        let lon = wrap360(longitude);
        self.start() <= lon && lon < self.end()
    }
}

impl fmt::Display for Nakshatra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Nakshatra {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
