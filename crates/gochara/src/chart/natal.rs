//! Sets derived once from a natal chart and read by the transit rules.

use crate::chart::data::{Chart, Placement};
use crate::ephemeris::Body;
use crate::vedic::{
    house_from_lagna, house_lord, house_signs, in_any_window, Sign, APOKLIMA_HOUSES,
    APOKLIMA_WINDOWS, PANAPHARA_HOUSES, PANAPHARA_WINDOWS,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// Candidates for the Panaphara-planet set; outer planets never qualify.
const PANAPHARA_CANDIDATES: [Body; 9] = [
    Body::Sun,
    Body::Moon,
    Body::Mars,
    Body::Mercury,
    Body::Jupiter,
    Body::Venus,
    Body::Saturn,
    Body::Rahu,
    Body::Ketu,
];

/// A natal body sitting in a Panaphara house inside a Panaphara window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanapharaPlanet {
    pub body: Body,
    pub sign: Sign,
    pub degree: f64,
    pub house: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct D9Dispositor {
    pub second_lord: Body,
    pub navamsa: Sign,
    pub dispositor: Body,
}

/// Which Apoklima house a lord rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LordRole {
    #[serde(rename = "3L")]
    Third,
    #[serde(rename = "6L")]
    Sixth,
    #[serde(rename = "9L")]
    Ninth,
    #[serde(rename = "12L")]
    Twelfth,
}

impl LordRole {
    pub const ALL: [LordRole; 4] = [
        LordRole::Third,
        LordRole::Sixth,
        LordRole::Ninth,
        LordRole::Twelfth,
    ];

    pub fn house(self) -> u8 {
        match self {
            LordRole::Third => 3,
            LordRole::Sixth => 6,
            LordRole::Ninth => 9,
            LordRole::Twelfth => 12,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LordRole::Third => "3L",
            LordRole::Sixth => "6L",
            LordRole::Ninth => "9L",
            LordRole::Twelfth => "12L",
        }
    }
}

impl fmt::Display for LordRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An Apoklima lord placed in an Apoklima house.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApoklimaLord {
    pub body: Body,
    pub role: LordRole,
    pub sign: Sign,
    pub degree: f64,
}

/// Derived natal sets. Built once per natal chart and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct NatalFeatures {
    pub ascendant_sign: Sign,
    pub panaphara_signs: [Sign; 4],
    pub apoklima_signs: [Sign; 4],
    pub panaphara_planets: Vec<PanapharaPlanet>,
    pub second_lord_dispositor: Option<D9Dispositor>,
    /// In an Apoklima house but outside every Apoklima window.
    pub lucky: Vec<ApoklimaLord>,
    /// In an Apoklima house and inside an Apoklima window.
    pub extremely_lucky: Vec<ApoklimaLord>,
}

impl NatalFeatures {
    pub(crate) fn derive(lagna: Sign, placements: &BTreeMap<Body, Placement>) -> Self {
        let panaphara_signs = house_signs(lagna, &PANAPHARA_HOUSES);
        let apoklima_signs = house_signs(lagna, &APOKLIMA_HOUSES);

        let panaphara_planets = PANAPHARA_CANDIDATES
            .iter()
            .filter_map(|body| placements.get(body).map(|p| (*body, p)))
            .filter(|(_, p)| {
                panaphara_signs.contains(&p.sign()) && in_any_window(&PANAPHARA_WINDOWS, p.degree())
            })
            .map(|(body, p)| PanapharaPlanet {
                body,
                sign: p.sign(),
                degree: p.degree(),
                house: house_from_lagna(p.sign(), lagna),
            })
            .collect();

        let second_lord = house_lord(lagna, 2);
        let second_lord_dispositor = placements.get(&second_lord).map(|p| D9Dispositor {
            second_lord,
            navamsa: p.navamsa,
            dispositor: p.navamsa.lord(),
        });

        let mut lucky = Vec::new();
        let mut extremely_lucky = Vec::new();
        for role in LordRole::ALL {
            let body = house_lord(lagna, role.house());
            let Some(p) = placements.get(&body) else {
                continue;
            };
            if !apoklima_signs.contains(&p.sign()) {
                continue;
            }
            let entry = ApoklimaLord {
                body,
                role,
                sign: p.sign(),
                degree: p.degree(),
            };
            if in_any_window(&APOKLIMA_WINDOWS, p.degree()) {
                extremely_lucky.push(entry);
            } else {
                lucky.push(entry);
            }
        }

        Self {
            ascendant_sign: lagna,
            panaphara_signs,
            apoklima_signs,
            panaphara_planets,
            second_lord_dispositor,
            lucky,
            extremely_lucky,
        }
    }

    /// Derive the sets for any chart, natal or not.
    pub fn from_chart(chart: &Chart) -> Self {
        let placements: BTreeMap<Body, Placement> =
            chart.placements().map(|(body, p)| (body, *p)).collect();
        Self::derive(chart.lagna(), &placements)
    }

    /// Lord of house `house` (1..=12) from the natal ascendant.
    pub fn house_lord(&self, house: u8) -> Body {
        house_lord(self.ascendant_sign, house)
    }

    pub fn house_of(&self, sign: Sign) -> u8 {
        house_from_lagna(sign, self.ascendant_sign)
    }

    /// Distinct Panaphara-planet bodies in first-appearance order.
    pub fn panaphara_bodies(&self) -> Vec<Body> {
        let mut bodies = Vec::new();
        for pp in &self.panaphara_planets {
            if !bodies.contains(&pp.body) {
                bodies.push(pp.body);
            }
        }
        bodies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placements(entries: &[(Body, f64)]) -> BTreeMap<Body, Placement> {
        entries
            .iter()
            .map(|(b, lon)| (*b, Placement::from_longitude(*lon)))
            .collect()
    }

    #[test]
    fn test_panaphara_planet_needs_house_and_window() {
        // Aries rising: Taurus is the 2nd house.
        let features = NatalFeatures::derive(
            Sign::Aries,
            &placements(&[
                (Body::Jupiter, 33.0), // Taurus 3°, inside 2.5-5.0
                (Body::Venus, 37.0),   // Taurus 7°, outside every window
                (Body::Mars, 3.0),     // Aries, not Panaphara
            ]),
        );
        assert_eq!(features.panaphara_planets.len(), 1);
        let pp = features.panaphara_planets[0];
        assert_eq!(pp.body, Body::Jupiter);
        assert_eq!(pp.house, 2);
        assert_eq!(pp.sign, Sign::Taurus);
    }

    #[test]
    fn test_second_lord_dispositor() {
        // Aries rising: 2L is Venus. Venus at 20° Aries -> D9 Libra -> Venus.
        let features = NatalFeatures::derive(Sign::Aries, &placements(&[(Body::Venus, 20.0)]));
        let d9 = features.second_lord_dispositor.unwrap();
        assert_eq!(d9.second_lord, Body::Venus);
        assert_eq!(d9.navamsa, Sign::Libra);
        assert_eq!(d9.dispositor, Body::Venus);

        let missing = NatalFeatures::derive(Sign::Aries, &placements(&[(Body::Sun, 20.0)]));
        assert!(missing.second_lord_dispositor.is_none());
    }

    #[test]
    fn test_lucky_split_by_window() {
        // Aries rising: 3L Mercury, 6L Mercury, 9L Jupiter, 12L Jupiter.
        // Mercury in Gemini 10° (3rd house, no window) -> lucky twice.
        // Jupiter in Pisces 6° (12th house, window 5.0-7.5) -> extremely lucky twice.
        let features = NatalFeatures::derive(
            Sign::Aries,
            &placements(&[(Body::Mercury, 70.0), (Body::Jupiter, 336.0)]),
        );
        let lucky: Vec<_> = features.lucky.iter().map(|l| (l.body, l.role)).collect();
        assert_eq!(
            lucky,
            vec![(Body::Mercury, LordRole::Third), (Body::Mercury, LordRole::Sixth)]
        );
        let extreme: Vec<_> = features.extremely_lucky.iter().map(|l| (l.body, l.role)).collect();
        assert_eq!(
            extreme,
            vec![(Body::Jupiter, LordRole::Ninth), (Body::Jupiter, LordRole::Twelfth)]
        );
    }
}
