use crate::chart::natal::NatalFeatures;
use crate::ephemeris::{Body, EphemerisError, EphemerisSession, GeoLocation};
use crate::vedic::{house_from_lagna, navamsa_sign, wrap360, Nakshatra, Sign};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bodies computed for a transit "moment" chart.
pub const MOMENT_BODIES: [Body; 8] = [
    Body::Sun,
    Body::Moon,
    Body::Mars,
    Body::Mercury,
    Body::Jupiter,
    Body::Venus,
    Body::Saturn,
    Body::Rahu,
];

/// Default bodies for a natal chart: the moment set plus the two outer
/// planets some rules read.
pub const NATAL_BODIES: [Body; 10] = [
    Body::Sun,
    Body::Moon,
    Body::Mars,
    Body::Mercury,
    Body::Jupiter,
    Body::Venus,
    Body::Saturn,
    Body::Rahu,
    Body::Uranus,
    Body::Neptune,
];

/// A sidereal longitude split into sign and degree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiderealPosition {
    pub longitude: f64,
    pub sign: Sign,
    pub degree_in_sign: f64,
}

impl SiderealPosition {
    pub fn from_longitude(longitude: f64) -> Self {
        let longitude = wrap360(longitude);
        let sign = Sign::from_longitude(longitude);
        Self {
            longitude,
            sign,
            degree_in_sign: longitude - sign.index() as f64 * 30.0,
        }
    }
}

/// Everything a rule reads about one point in a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    #[serde(flatten)]
    pub position: SiderealPosition,
    pub nakshatra: Nakshatra,
    pub nakshatra_lord: Body,
    pub navamsa: Sign,
}

impl Placement {
    pub fn from_longitude(longitude: f64) -> Self {
        let position = SiderealPosition::from_longitude(longitude);
        let nakshatra = Nakshatra::containing(position.longitude);
        Self {
            position,
            nakshatra,
            nakshatra_lord: nakshatra.lord(),
            navamsa: navamsa_sign(position.longitude),
        }
    }

    pub fn sign(&self) -> Sign {
        self.position.sign
    }

    pub fn degree(&self) -> f64 {
        self.position.degree_in_sign
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Natal,
    Moment,
}

/// Positions for one instant and place. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub instant: DateTime<Utc>,
    pub location: GeoLocation,
    pub kind: ChartKind,
    pub ascendant: Placement,
    placements: BTreeMap<Body, Placement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    natal: Option<NatalFeatures>,
}

impl Chart {
    /// Build a chart from sidereal longitudes already in hand.
    ///
    /// Ketu is derived from Rahu whenever Rahu is present.
    pub fn from_longitudes(
        instant: DateTime<Utc>,
        location: GeoLocation,
        ascendant: f64,
        longitudes: &[(Body, f64)],
        kind: ChartKind,
    ) -> Chart {
        let ascendant = Placement::from_longitude(ascendant);
        let mut placements: BTreeMap<Body, Placement> = longitudes
            .iter()
            .map(|(body, lon)| (*body, Placement::from_longitude(*lon)))
            .collect();
        if let Some(rahu) = placements.get(&Body::Rahu).copied() {
            placements.insert(
                Body::Ketu,
                Placement::from_longitude(rahu.position.longitude + 180.0),
            );
        }

        let natal = match kind {
            ChartKind::Natal => Some(NatalFeatures::derive(ascendant.sign(), &placements)),
            ChartKind::Moment => None,
        };

        Chart {
            instant,
            location,
            kind,
            ascendant,
            placements,
            natal,
        }
    }

    /// Natal chart for `bodies` (Ketu is implied by Rahu).
    pub fn natal(
        session: &EphemerisSession<'_>,
        instant: DateTime<Utc>,
        location: GeoLocation,
        bodies: &[Body],
    ) -> Result<Chart, EphemerisError> {
        Self::compute(session, instant, location, bodies, ChartKind::Natal)
    }

    /// Transit chart used by the muhurtha evaluator.
    pub fn moment(
        session: &EphemerisSession<'_>,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<Chart, EphemerisError> {
        Self::compute(session, instant, location, &MOMENT_BODIES, ChartKind::Moment)
    }

    fn compute(
        session: &EphemerisSession<'_>,
        instant: DateTime<Utc>,
        location: GeoLocation,
        bodies: &[Body],
        kind: ChartKind,
    ) -> Result<Chart, EphemerisError> {
        let ascendant = session.ascendant(instant, location)?;
        let mut longitudes = Vec::with_capacity(bodies.len());
        for &body in bodies.iter().filter(|b| **b != Body::Ketu) {
            longitudes.push((body, session.position(instant, body)?));
        }
        Ok(Chart::from_longitudes(
            instant, location, ascendant, &longitudes, kind,
        ))
    }

    pub fn lagna(&self) -> Sign {
        self.ascendant.sign()
    }

    pub fn placement(&self, body: Body) -> Option<&Placement> {
        self.placements.get(&body)
    }

    pub fn placements(&self) -> impl Iterator<Item = (Body, &Placement)> {
        self.placements.iter().map(|(b, p)| (*b, p))
    }

    pub fn tracks(&self, body: Body) -> bool {
        self.placements.contains_key(&body)
    }

    pub fn sign_of(&self, body: Body) -> Option<Sign> {
        self.placement(body).map(|p| p.sign())
    }

    /// House of `body` counted from the ascendant sign.
    pub fn house_of(&self, body: Body) -> Option<u8> {
        self.sign_of(body).map(|s| house_from_lagna(s, self.lagna()))
    }

    /// Derived natal sets; `None` for moment charts.
    pub fn natal_features(&self) -> Option<&NatalFeatures> {
        self.natal.as_ref()
    }
}
