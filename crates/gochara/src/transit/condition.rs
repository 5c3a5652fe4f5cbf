//! Rule descriptors: immutable values describing one predicate and how its
//! events are labelled.

use crate::chart::SiderealPosition;
use crate::ephemeris::{Body, EphemerisError, EphemerisSession};
use crate::transit::rule::{Category, RuleId};
use crate::vedic::{house_from_lagna, in_any_window, DegreeWindow, Nakshatra, Sign};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// A time-varying test over transit positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `body` in `sign` with its degree inside `window`.
    InSignWindow {
        body: Body,
        sign: Sign,
        window: DegreeWindow,
    },
    /// `body` in `sign` and outside every one of `windows`.
    InSignOutsideWindows {
        body: Body,
        sign: Sign,
        windows: [DegreeWindow; 4],
    },
    /// `body` in `nakshatra` with its in-sign degree inside `window`.
    InNakshatraWindow {
        body: Body,
        nakshatra: Nakshatra,
        window: DegreeWindow,
    },
    InNakshatra {
        body: Body,
        nakshatra: Nakshatra,
    },
    /// Both bodies in their signs, both degrees inside the same window.
    JointSignWindow {
        first: Body,
        first_sign: Sign,
        second: Body,
        second_sign: Sign,
        window: DegreeWindow,
    },
    PairInSigns {
        first: Body,
        first_sign: Sign,
        second: Body,
        second_sign: Sign,
    },
    /// `body` in `sign` within `orb` degrees of `center`. No wrap across
    /// the sign boundary.
    WithinOrb {
        body: Body,
        sign: Sign,
        center: f64,
        orb: f64,
    },
    /// The forward sign distance from `first` to `second` is one of `steps`.
    SignRelation {
        first: Body,
        second: Body,
        steps: [usize; 2],
    },
    InSign {
        body: Body,
        sign: Sign,
    },
}

fn sample(
    session: &EphemerisSession<'_>,
    instant: DateTime<Utc>,
    body: Body,
) -> Result<SiderealPosition, EphemerisError> {
    Ok(SiderealPosition::from_longitude(session.position(instant, body)?))
}

impl Condition {
    pub fn holds(
        &self,
        session: &EphemerisSession<'_>,
        instant: DateTime<Utc>,
    ) -> Result<bool, EphemerisError> {
        let held = match *self {
            Condition::InSignWindow { body, sign, window } => {
                let p = sample(session, instant, body)?;
                p.sign == sign && window.contains(p.degree_in_sign)
            }
            Condition::InSignOutsideWindows {
                body,
                sign,
                ref windows,
            } => {
                let p = sample(session, instant, body)?;
                p.sign == sign && !in_any_window(windows, p.degree_in_sign)
            }
            Condition::InNakshatraWindow {
                body,
                nakshatra,
                window,
            } => {
                let p = sample(session, instant, body)?;
                nakshatra.contains(p.longitude) && window.contains(p.degree_in_sign)
            }
            Condition::InNakshatra { body, nakshatra } => {
                nakshatra.contains(sample(session, instant, body)?.longitude)
            }
            Condition::JointSignWindow {
                first,
                first_sign,
                second,
                second_sign,
                window,
            } => {
                let a = sample(session, instant, first)?;
                if a.sign != first_sign || !window.contains(a.degree_in_sign) {
                    return Ok(false);
                }
                let b = sample(session, instant, second)?;
                b.sign == second_sign && window.contains(b.degree_in_sign)
            }
            Condition::PairInSigns {
                first,
                first_sign,
                second,
                second_sign,
            } => {
                if sample(session, instant, first)?.sign != first_sign {
                    return Ok(false);
                }
                sample(session, instant, second)?.sign == second_sign
            }
            Condition::WithinOrb {
                body,
                sign,
                center,
                orb,
            } => {
                let p = sample(session, instant, body)?;
                p.sign == sign && center - orb <= p.degree_in_sign && p.degree_in_sign <= center + orb
            }
            Condition::SignRelation {
                first,
                second,
                steps,
            } => {
                let a = sample(session, instant, first)?.sign;
                let b = sample(session, instant, second)?.sign;
                steps.contains(&a.steps_to(b))
            }
            Condition::InSign { body, sign } => sample(session, instant, body)?.sign == sign,
        };
        Ok(held)
    }

    /// Transit bodies this condition queries.
    pub fn bodies(&self) -> Vec<Body> {
        match *self {
            Condition::InSignWindow { body, .. }
            | Condition::InSignOutsideWindows { body, .. }
            | Condition::InNakshatraWindow { body, .. }
            | Condition::InNakshatra { body, .. }
            | Condition::WithinOrb { body, .. }
            | Condition::InSign { body, .. } => vec![body],
            Condition::JointSignWindow { first, second, .. }
            | Condition::PairInSigns { first, second, .. }
            | Condition::SignRelation { first, second, .. } => vec![first, second],
        }
    }
}

/// One sign or a `first / second` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignRef {
    Single(Sign),
    Pair(Sign, Sign),
}

impl SignRef {
    pub fn houses(self, lagna: Sign) -> HouseRef {
        match self {
            SignRef::Single(s) => HouseRef::Single(house_from_lagna(s, lagna)),
            SignRef::Pair(a, b) => {
                HouseRef::Pair(house_from_lagna(a, lagna), house_from_lagna(b, lagna))
            }
        }
    }
}

impl fmt::Display for SignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignRef::Single(s) => write!(f, "{}", s),
            SignRef::Pair(a, b) => write!(f, "{} / {}", a, b),
        }
    }
}

impl Serialize for SignRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// House number(s) counted from the natal ascendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseRef {
    Single(u8),
    Pair(u8, u8),
}

impl fmt::Display for HouseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HouseRef::Single(h) => write!(f, "{}", h),
            HouseRef::Pair(a, b) => write!(f, "{} / {}", a, b),
        }
    }
}

// A single house stays numeric in rows; a pair becomes "a / b".
impl Serialize for HouseRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HouseRef::Single(h) => serializer.serialize_u8(*h),
            HouseRef::Pair(..) => serializer.collect_str(self),
        }
    }
}

/// Where an event's sign and house label come from.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPlacement {
    /// The sign(s) the rule was instantiated for.
    Fixed(SignRef),
    /// Wherever the body is at the interval start.
    AtStart(Body),
    PairAtStart(Body, Body),
    /// A fixed sign label, with the house of `body` at the interval start.
    FixedSignHouseAtStart { sign: Sign, body: Body },
    /// Like `AtStart`, but if the body's nakshatra at the interval start is
    /// one of `nakshatras` the event is reclassified as Money.
    AtStartWithException {
        body: Body,
        nakshatras: Vec<Nakshatra>,
    },
}

/// One instantiated rule: a condition plus everything needed to label the
/// events it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleInstance {
    pub rule: RuleId,
    pub category: Category,
    pub rule_label: &'static str,
    pub body_label: String,
    pub window_label: String,
    pub description: String,
    pub condition: Condition,
    pub placement: EventPlacement,
}

impl RuleInstance {
    pub fn new(rule: RuleId, condition: Condition, placement: EventPlacement) -> Self {
        Self {
            rule,
            category: rule.category(),
            rule_label: rule.label(),
            body_label: String::new(),
            window_label: String::new(),
            description: String::new(),
            condition,
            placement,
        }
    }

    pub fn labelled(mut self, rule_label: &'static str) -> Self {
        self.rule_label = rule_label;
        self
    }

    pub fn body(mut self, label: impl Into<String>) -> Self {
        self.body_label = label.into();
        self
    }

    pub fn window(mut self, label: impl Into<String>) -> Self {
        self.window_label = label.into();
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_ref_labels() {
        let pair = SignRef::Pair(Sign::Taurus, Sign::Scorpio);
        assert_eq!(pair.to_string(), "Taurus / Scorpio");
        assert_eq!(pair.houses(Sign::Aries), HouseRef::Pair(2, 8));
        assert_eq!(pair.houses(Sign::Aries).to_string(), "2 / 8");
        assert_eq!(SignRef::Single(Sign::Leo).houses(Sign::Aries), HouseRef::Single(5));
    }

    #[test]
    fn test_bodies() {
        let c = Condition::SignRelation {
            first: Body::Mercury,
            second: Body::Mars,
            steps: [5, 7],
        };
        assert_eq!(c.bodies(), vec![Body::Mercury, Body::Mars]);
    }
}
