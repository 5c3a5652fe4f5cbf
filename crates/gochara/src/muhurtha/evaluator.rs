//! Five-rule muhurtha assessment of a single transit chart.

use crate::chart::{Chart, Placement};
use crate::ephemeris::{Body, EphemerisSession, GeoLocation};
use crate::error::Result;
use crate::muhurtha::grade::{grade, ArcQuality, Grade};
use crate::vedic::{house_from_lagna, house_lord, Sign};
use chrono::{DateTime, Utc};
use serde::Serialize;

const KENDRA_OR_ELEVENTH: [u8; 5] = [1, 4, 7, 10, 11];
const DUSTHANA: [u8; 3] = [6, 8, 12];

/// Inclusive sign count between two signs, taking the shorter direction.
pub fn shorter_arc(a: Sign, b: Sign) -> u8 {
    let forward = a.steps_to(b) as u8 + 1;
    let backward = b.steps_to(a) as u8 + 1;
    forward.min(backward)
}

/// House placement check for one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LordCheck {
    pub body: Body,
    pub sign: Option<Sign>,
    pub house: Option<u8>,
    pub passed: bool,
}

impl LordCheck {
    /// Passes when the body sits in a kendra or the 11th and not in 6, 8
    /// or 12. A body the chart does not track fails.
    pub fn of(chart: &Chart, body: Body) -> Self {
        let sign = chart.sign_of(body);
        let house = sign.map(|s| house_from_lagna(s, chart.lagna()));
        let passed = house.map_or(false, |h| {
            KENDRA_OR_ELEVENTH.contains(&h) && !DUSTHANA.contains(&h)
        });
        Self {
            body,
            sign,
            house,
            passed,
        }
    }

    fn vetoed(mut self) -> Self {
        self.passed = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KarakaCheck {
    pub checks: Vec<LordCheck>,
    /// Every karaka passed individually.
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArcCheck {
    pub lagna_lord_sign: Option<Sign>,
    pub nakshatra_lord: Body,
    pub nakshatra_lord_sign: Option<Sign>,
    pub arc: Option<u8>,
    pub quality: ArcQuality,
    pub passed: bool,
}

impl ArcCheck {
    fn of(chart: &Chart, lagna_lord: Body) -> Self {
        let nakshatra_lord = chart.ascendant.nakshatra_lord;
        let lagna_lord_sign = chart.sign_of(lagna_lord);
        let nakshatra_lord_sign = chart.sign_of(nakshatra_lord);
        let arc = match (lagna_lord_sign, nakshatra_lord_sign) {
            (Some(a), Some(b)) => Some(shorter_arc(a, b)),
            _ => None,
        };
        let quality = arc.map_or(ArcQuality::Avoid, ArcQuality::from_arc);
        Self {
            lagna_lord_sign,
            nakshatra_lord,
            nakshatra_lord_sign,
            arc,
            quality,
            passed: quality.passes(),
        }
    }
}

/// Full evaluation of one instant for one karaka set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuhurthaMoment {
    pub instant: DateTime<Utc>,
    pub ascendant: Placement,
    pub lagna_lord: Body,
    pub lagna_lord_check: LordCheck,
    pub third_lord_check: LordCheck,
    pub eleventh_lord_check: LordCheck,
    pub karakas: KarakaCheck,
    pub arc: ArcCheck,
    pub ketu_in_lagna: bool,
    pub rules_pass: u8,
    pub grade: Grade,
}

impl MuhurthaMoment {
    pub fn score(&self) -> u8 {
        self.grade.score()
    }

    /// Pass/fail of rules 1 to 5, in order.
    pub fn verdicts(&self) -> [bool; 5] {
        [
            self.lagna_lord_check.passed,
            self.third_lord_check.passed,
            self.eleventh_lord_check.passed,
            self.karakas.passed,
            self.arc.passed,
        ]
    }
}

/// The karaka-independent part of a moment's evaluation.
///
/// Built once per chart; [`moment`](Self::moment) adds the karaka rule for
/// each activity without touching the ephemeris again.
#[derive(Debug, Clone)]
pub struct ChartAssessment<'c> {
    chart: &'c Chart,
    lagna_lord: Body,
    lagna_lord_check: LordCheck,
    third_lord_check: LordCheck,
    eleventh_lord_check: LordCheck,
    arc: ArcCheck,
    ketu_in_lagna: bool,
}

impl<'c> ChartAssessment<'c> {
    pub fn of(chart: &'c Chart) -> Self {
        let lagna = chart.lagna();
        let lagna_lord = lagna.lord();
        let ketu_in_lagna = chart.sign_of(Body::Ketu) == Some(lagna);

        let mut lagna_lord_check = LordCheck::of(chart, lagna_lord);
        let mut third_lord_check = LordCheck::of(chart, house_lord(lagna, 3));
        let mut eleventh_lord_check = LordCheck::of(chart, house_lord(lagna, 11));
        let mut arc = ArcCheck::of(chart, lagna_lord);

        if ketu_in_lagna {
            lagna_lord_check = lagna_lord_check.vetoed();
            third_lord_check = third_lord_check.vetoed();
            eleventh_lord_check = eleventh_lord_check.vetoed();
            arc.passed = false;
        }

        Self {
            chart,
            lagna_lord,
            lagna_lord_check,
            third_lord_check,
            eleventh_lord_check,
            arc,
            ketu_in_lagna,
        }
    }

    pub fn chart(&self) -> &Chart {
        self.chart
    }

    pub fn ketu_in_lagna(&self) -> bool {
        self.ketu_in_lagna
    }

    pub fn moment(&self, karakas: &[Body]) -> MuhurthaMoment {
        let checks: Vec<LordCheck> = karakas
            .iter()
            .map(|body| LordCheck::of(self.chart, *body))
            .collect();
        let karakas = KarakaCheck {
            passed: checks.iter().all(|c| c.passed),
            checks,
        };

        let (rules_pass, grade) = if self.ketu_in_lagna {
            (0, Grade::KetuInLagna)
        } else {
            let rules_pass = [
                self.lagna_lord_check.passed,
                self.third_lord_check.passed,
                self.eleventh_lord_check.passed,
                karakas.passed,
                self.arc.passed,
            ]
            .iter()
            .filter(|p| **p)
            .count() as u8;
            (rules_pass, grade(rules_pass, self.arc.quality))
        };

        MuhurthaMoment {
            instant: self.chart.instant,
            ascendant: self.chart.ascendant,
            lagna_lord: self.lagna_lord,
            lagna_lord_check: self.lagna_lord_check,
            third_lord_check: self.third_lord_check,
            eleventh_lord_check: self.eleventh_lord_check,
            karakas,
            arc: self.arc,
            ketu_in_lagna: self.ketu_in_lagna,
            rules_pass,
            grade,
        }
    }
}

/// Build the transit chart for `instant` and evaluate it. Any ephemeris
/// failure is returned to the caller.
pub fn evaluate_moment(
    session: &EphemerisSession<'_>,
    instant: DateTime<Utc>,
    location: GeoLocation,
    karakas: &[Body],
) -> Result<MuhurthaMoment> {
    let chart = Chart::moment(session, instant, location)?;
    Ok(ChartAssessment::of(&chart).moment(karakas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use chrono::TimeZone;

    fn chart(asc: f64, bodies: &[(Body, f64)]) -> Chart {
        Chart::from_longitudes(
            Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap(),
            GeoLocation { lat: 13.08, lon: 80.27 },
            asc,
            bodies,
            ChartKind::Moment,
        )
    }

    #[test]
    fn test_shorter_arc_is_symmetric() {
        assert_eq!(shorter_arc(Sign::Aries, Sign::Aries), 1);
        assert_eq!(shorter_arc(Sign::Aries, Sign::Cancer), 4);
        assert_eq!(shorter_arc(Sign::Cancer, Sign::Aries), 4);
        assert_eq!(shorter_arc(Sign::Aries, Sign::Libra), 7);
        assert_eq!(shorter_arc(Sign::Aries, Sign::Pisces), 2);
        for a in Sign::ALL {
            for b in Sign::ALL {
                assert_eq!(shorter_arc(a, b), shorter_arc(b, a));
                assert!((1..=7).contains(&shorter_arc(a, b)));
            }
        }
    }

    #[test]
    fn test_lagna_lord_in_fourth_passes() {
        // Aries rising, Mars in Cancer.
        let c = chart(5.0, &[(Body::Mars, 95.0)]);
        let check = LordCheck::of(&c, Body::Mars);
        assert_eq!(check.house, Some(4));
        assert!(check.passed);
    }

    #[test]
    fn test_missing_body_fails() {
        let c = chart(5.0, &[(Body::Mars, 95.0)]);
        let check = LordCheck::of(&c, Body::Uranus);
        assert_eq!(check.house, None);
        assert!(!check.passed);
    }

    #[test]
    fn test_all_rules_pass() {
        // Aries rising at 5° (Ashwini, lord Ketu). Ketu at 275 -> Capricorn.
        // Mars (1L) Capricorn 10H; Mercury (3L) Cancer 4H; Saturn (11L)
        // Libra 7H. Arc Mars..Ketu both Capricorn -> 1.
        let c = chart(
            5.0,
            &[
                (Body::Mars, 280.0),
                (Body::Mercury, 100.0),
                (Body::Saturn, 190.0),
                (Body::Jupiter, 5.0),
                (Body::Rahu, 95.0),
            ],
        );
        let assessment = ChartAssessment::of(&c);
        let moment = assessment.moment(&[Body::Jupiter]);
        assert_eq!(moment.verdicts(), [true; 5]);
        assert_eq!(moment.rules_pass, 5);
        assert_eq!(moment.arc.arc, Some(1));
        assert_eq!(moment.grade, Grade::Excellent);
        assert_eq!(moment.score(), 5);

        // A failing karaka only costs rule 4.
        let moment = assessment.moment(&[Body::Jupiter, Body::Mercury, Body::Saturn, Body::Mars, Body::Rahu]);
        assert!(moment.karakas.passed);
        let moment = assessment.moment(&[Body::Jupiter, Body::Venus]);
        assert!(!moment.karakas.passed);
        assert_eq!(moment.rules_pass, 4);
        assert_eq!(moment.grade, Grade::Good);
    }

    #[test]
    fn test_ketu_in_lagna_vetoes() {
        // Rahu in Libra puts Ketu in Aries with an Aries ascendant.
        let c = chart(
            5.0,
            &[
                (Body::Mars, 280.0),
                (Body::Mercury, 100.0),
                (Body::Saturn, 190.0),
                (Body::Jupiter, 5.0),
                (Body::Rahu, 190.0),
            ],
        );
        let assessment = ChartAssessment::of(&c);
        assert!(assessment.ketu_in_lagna());
        let moment = assessment.moment(&[Body::Jupiter]);
        assert_eq!(moment.rules_pass, 0);
        assert_eq!(moment.score(), 0);
        assert_eq!(moment.grade, Grade::KetuInLagna);
        assert_eq!(moment.verdicts(), [false, false, false, true, false]);
    }
}
