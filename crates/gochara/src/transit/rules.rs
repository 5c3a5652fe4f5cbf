//! The rule library: turns a natal chart into rule instances.
//!
//! Every rule is expanded over the cross-product of its free parameters
//! (body x degree window x sign, and so on) into plain `RuleInstance`
//! values. Nothing here touches the ephemeris.

use crate::chart::{Chart, NatalFeatures};
use crate::ephemeris::Body;
use crate::error::{GocharaError, Result};
use crate::transit::condition::{Condition, EventPlacement, RuleInstance, SignRef};
use crate::transit::rule::{Category, RuleId};
use crate::vedic::{
    dms_short, DegreeWindow, Nakshatra, Sign, APOKLIMA_WINDOWS, PANAPHARA_WINDOWS,
};

/// Order in which transit bodies are tried against natal Panaphara degrees.
const TOUCH_ORDER: [Body; 10] = [
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

// Swati, excluded from the Loss #6 exception set.
const SWATI: usize = 14;

/// Knobs shared by every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOptions {
    /// Conjunction tolerance in degrees.
    pub orb: f64,
    /// Bodies the engine may query. Ketu comes with Rahu.
    pub tracked: Vec<Body>,
}

impl RuleOptions {
    pub fn tracks(&self, body: Body) -> bool {
        match body {
            Body::Ketu => self.tracked.contains(&Body::Rahu),
            other => self.tracked.contains(&other),
        }
    }
}

fn missing(rule: RuleId, body: Body) -> GocharaError {
    GocharaError::MissingChartDependency {
        rule: rule.label().to_string(),
        body,
    }
}

fn sorted(signs: [Sign; 4]) -> [Sign; 4] {
    let mut signs = signs;
    signs.sort();
    signs
}

fn orb_label(center: f64, orb: f64) -> String {
    format!("{} ±{}°", dms_short(center), orb)
}

struct RuleContext<'a> {
    natal: &'a Chart,
    features: &'a NatalFeatures,
    options: &'a RuleOptions,
}

/// The instances of one rule that can run, plus the untracked bodies that
/// cost it the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub rule: RuleId,
    pub instances: Vec<RuleInstance>,
    /// Distinct, in the order first met.
    pub missing: Vec<Body>,
}

impl Expansion {
    fn new(rule: RuleId) -> Self {
        Self {
            rule,
            instances: Vec::new(),
            missing: Vec::new(),
        }
    }

    fn note_missing(&mut self, body: Body) {
        if !self.missing.contains(&body) {
            self.missing.push(body);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// All instances, or `MissingChartDependency` naming the first absent body.
    pub fn require_complete(self) -> Result<Vec<RuleInstance>> {
        match self.missing.first() {
            Some(&body) => Err(missing(self.rule, body)),
            None => Ok(self.instances),
        }
    }
}

/// Expand `rule` against a natal chart.
///
/// An instance that needs a body which is not tracked, natally or in
/// transit, is left out and the body is listed in `missing`. Every other
/// instance of the rule is kept.
pub fn instantiate(rule: RuleId, natal: &Chart, options: &RuleOptions) -> Expansion {
    let derived;
    let features = match natal.natal_features() {
        Some(features) => features,
        None => {
            derived = NatalFeatures::from_chart(natal);
            &derived
        }
    };
    let ctx = RuleContext {
        natal,
        features,
        options,
    };

    let mut expansion = Expansion::new(rule);
    let mut natal_gaps = Vec::new();
    let instances = match rule {
        RuleId::Money1 => money_1(&ctx),
        RuleId::Money2 => money_2(&ctx),
        RuleId::Money3 => money_3(&ctx, &mut natal_gaps),
        RuleId::Money4 => money_4(&ctx),
        RuleId::Money5 => money_5(&ctx),
        RuleId::Money6 => money_6(&ctx),
        RuleId::Money7 => money_7(&ctx),
        RuleId::Money8 => money_8(&ctx),
        RuleId::Loss1 => loss_1(&ctx),
        RuleId::Loss2 => loss_2(&ctx),
        RuleId::Loss3 => loss_3(&ctx, &mut natal_gaps),
        RuleId::Loss4 => loss_4(&ctx, &mut natal_gaps),
        RuleId::Loss5 => loss_5(&ctx),
        RuleId::Loss6 => loss_6(&ctx),
    };
    for body in natal_gaps {
        expansion.note_missing(body);
    }

    for instance in instances {
        match instance
            .condition
            .bodies()
            .into_iter()
            .find(|b| !options.tracks(*b))
        {
            Some(body) => expansion.note_missing(body),
            None => expansion.instances.push(instance),
        }
    }
    expansion
}

fn house_sign_window(
    rule: RuleId,
    body: Body,
    signs: [Sign; 4],
    windows: &[DegreeWindow; 4],
    describe: impl Fn(u8) -> String,
    features: &NatalFeatures,
) -> Vec<RuleInstance> {
    let mut out = Vec::with_capacity(16);
    for window in windows {
        for sign in sorted(signs) {
            out.push(
                RuleInstance::new(
                    rule,
                    Condition::InSignWindow {
                        body,
                        sign,
                        window: *window,
                    },
                    EventPlacement::Fixed(SignRef::Single(sign)),
                )
                .body(body.name())
                .window(window.label())
                .describe(describe(features.house_of(sign))),
            );
        }
    }
    out
}

fn money_1(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let bodies = [Body::Jupiter, Body::Venus, ctx.features.house_lord(2)];
    bodies
        .iter()
        .flat_map(|&body| {
            house_sign_window(
                RuleId::Money1,
                body,
                ctx.features.panaphara_signs,
                &PANAPHARA_WINDOWS,
                |h| format!("{} in Panaphara house ({}) + Panaphara degree → Money", body, h),
                ctx.features,
            )
        })
        .collect()
}

fn money_2(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let mut out = Vec::new();
    for owner in ctx.features.panaphara_bodies() {
        for &nakshatra in Nakshatra::ruled_by(owner) {
            for window in PANAPHARA_WINDOWS {
                out.push(
                    RuleInstance::new(
                        RuleId::Money2,
                        Condition::InNakshatraWindow {
                            body: Body::Moon,
                            nakshatra,
                            window,
                        },
                        EventPlacement::AtStart(Body::Moon),
                    )
                    .body("Moon")
                    .window(window.label())
                    .describe(format!(
                        "Moon in {} (owned by {} - PP planet) + Panaphara degree → Money",
                        nakshatra, owner
                    )),
                );
            }
        }
    }
    out
}

fn money_3(ctx: &RuleContext<'_>, gaps: &mut Vec<Body>) -> Vec<RuleInstance> {
    let Some(d9) = ctx.features.second_lord_dispositor else {
        gaps.push(ctx.features.house_lord(2));
        return Vec::new();
    };
    let body = d9.dispositor;
    house_sign_window(
        RuleId::Money3,
        body,
        ctx.features.panaphara_signs,
        &PANAPHARA_WINDOWS,
        |h| format!("{} (D9 dispositor of 2L) in Panaphara house ({}) + degree → Money", body, h),
        ctx.features,
    )
}

fn money_4(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let signs = sorted(ctx.features.panaphara_signs);
    let mut out = Vec::with_capacity(64);
    for window in PANAPHARA_WINDOWS {
        for venus_sign in signs {
            for uranus_sign in signs {
                out.push(
                    RuleInstance::new(
                        RuleId::Money4,
                        Condition::JointSignWindow {
                            first: Body::Venus,
                            first_sign: venus_sign,
                            second: Body::Uranus,
                            second_sign: uranus_sign,
                            window,
                        },
                        EventPlacement::Fixed(SignRef::Pair(venus_sign, uranus_sign)),
                    )
                    .body("Venus/Uranus")
                    .window(window.label())
                    .describe(format!(
                        "Venus in {}H + Uranus in {}H (both Panaphara + degree) → Crorepati Yoga",
                        ctx.features.house_of(venus_sign),
                        ctx.features.house_of(uranus_sign)
                    )),
                );
            }
        }
    }
    out
}

fn money_5(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let fifth = ctx.features.house_lord(5);
    let ninth = ctx.features.house_lord(9);
    let pair = format!("{}/{}", fifth, ninth);
    let same_sign = Sign::ALL.iter().map(|&sign| {
        RuleInstance::new(
            RuleId::Money5,
            Condition::PairInSigns {
                first: fifth,
                first_sign: sign,
                second: ninth,
                second_sign: sign,
            },
            EventPlacement::Fixed(SignRef::Single(sign)),
        )
        .body(pair.clone())
        .window("Same Sign")
        .describe(format!(
            "5L ({}) and 9L ({}) in same sign ({}) → Money",
            fifth, ninth, sign
        ))
    });
    let mutual = Sign::ALL.iter().map(|&sign| {
        let opposite = sign.offset(6);
        RuleInstance::new(
            RuleId::Money5,
            Condition::PairInSigns {
                first: fifth,
                first_sign: sign,
                second: ninth,
                second_sign: opposite,
            },
            EventPlacement::Fixed(SignRef::Pair(sign, opposite)),
        )
        .body(pair.clone())
        .window("7th Aspect")
        .describe(format!(
            "5L ({}) and 9L ({}) in mutual 7th aspect → Money",
            fifth, ninth
        ))
    });
    same_sign.chain(mutual).collect()
}

fn money_6(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let second = ctx.features.house_lord(2);
    let mut out = Vec::with_capacity(48);
    for window in PANAPHARA_WINDOWS {
        for sign in Sign::ALL {
            out.push(
                RuleInstance::new(
                    RuleId::Money6,
                    Condition::InSignWindow {
                        body: second,
                        sign,
                        window,
                    },
                    EventPlacement::Fixed(SignRef::Single(sign)),
                )
                .body(second.name())
                .window(window.label())
                .describe(format!("2L ({}) in Panaphara degree → Money", second)),
            );
        }
    }
    out
}

fn money_7(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let signs = sorted(ctx.features.apoklima_signs);
    let mut out = Vec::new();

    for lord in &ctx.features.lucky {
        for sign in signs {
            let house = ctx.features.house_of(sign);
            out.push(
                RuleInstance::new(
                    RuleId::Money7,
                    Condition::InSignOutsideWindows {
                        body: lord.body,
                        sign,
                        windows: APOKLIMA_WINDOWS,
                    },
                    EventPlacement::Fixed(SignRef::Single(sign)),
                )
                .labelled("Rule #7 (Lucky)")
                .body(lord.body.name())
                .window("Apoklima House")
                .describe(format!(
                    "{} ({}) in Apoklima house ({}) → Lucky Day",
                    lord.body, lord.role, house
                )),
            );
        }
    }

    for lord in &ctx.features.extremely_lucky {
        for window in APOKLIMA_WINDOWS {
            for sign in signs {
                let house = ctx.features.house_of(sign);
                out.push(
                    RuleInstance::new(
                        RuleId::Money7,
                        Condition::InSignWindow {
                            body: lord.body,
                            sign,
                            window,
                        },
                        EventPlacement::Fixed(SignRef::Single(sign)),
                    )
                    .labelled("Rule #7 (Extremely Lucky)")
                    .body(lord.body.name())
                    .window(window.label())
                    .describe(format!(
                        "{} ({}) in Apoklima house ({}) + Apoklima degree → Extremely Lucky Day",
                        lord.body, lord.role, house
                    )),
                );
            }
        }
    }
    out
}

fn money_8(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let orb = ctx.options.orb;
    let mut out = Vec::new();
    for pp in &ctx.features.panaphara_planets {
        for &transit in TOUCH_ORDER.iter().filter(|b| ctx.options.tracks(**b)) {
            out.push(
                RuleInstance::new(
                    RuleId::Money8,
                    Condition::WithinOrb {
                        body: transit,
                        sign: pp.sign,
                        center: pp.degree,
                        orb,
                    },
                    EventPlacement::Fixed(SignRef::Single(pp.sign)),
                )
                .body(transit.name())
                .window(orb_label(pp.degree, orb))
                .describe(format!(
                    "{} touches natal {} degree ({}) in {} → Money",
                    transit,
                    pp.body,
                    dms_short(pp.degree),
                    pp.sign
                )),
            );
        }
    }
    out
}

fn loss_1(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    [Body::Saturn, Body::Venus, Body::Ketu]
        .iter()
        .flat_map(|&body| {
            house_sign_window(
                RuleId::Loss1,
                body,
                ctx.features.apoklima_signs,
                &APOKLIMA_WINDOWS,
                |h| format!("{} in Apoklima house ({}) + Apoklima degree → Loss", body, h),
                ctx.features,
            )
        })
        .collect()
}

fn loss_2(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    // A body ruling several of the 6th/8th/12th is listed once with all roles.
    let mut lords: Vec<(Body, Vec<&'static str>)> = Vec::new();
    for (house, role) in [(6, "6L"), (8, "8L"), (12, "12L")] {
        let lord = ctx.features.house_lord(house);
        match lords.iter_mut().find(|(body, _)| *body == lord) {
            Some((_, roles)) => roles.push(role),
            None => lords.push((lord, vec![role])),
        }
    }

    let mut out = Vec::new();
    for (lord, roles) in lords {
        let roles = roles.join("/");
        for &nakshatra in Nakshatra::ruled_by(lord) {
            for window in APOKLIMA_WINDOWS {
                out.push(
                    RuleInstance::new(
                        RuleId::Loss2,
                        Condition::InNakshatraWindow {
                            body: Body::Sun,
                            nakshatra,
                            window,
                        },
                        EventPlacement::AtStart(Body::Sun),
                    )
                    .body("Sun")
                    .window(window.label())
                    .describe(format!(
                        "Sun in {} (owned by {} - {}) + Apoklima degree → Loss",
                        nakshatra, lord, roles
                    )),
                );
            }
        }
    }
    out
}

fn loss_3(ctx: &RuleContext<'_>, gaps: &mut Vec<Body>) -> Vec<RuleInstance> {
    let mut out = Vec::with_capacity(2);
    for body in [Body::Moon, Body::Sun] {
        let Some(natal) = ctx.natal.placement(body) else {
            gaps.push(body);
            continue;
        };
        let sixth = natal.nakshatra.offset(5);
        out.push(
            RuleInstance::new(
                RuleId::Loss3,
                Condition::InNakshatra {
                    body,
                    nakshatra: sixth,
                },
                EventPlacement::AtStart(body),
            )
            .body(body.name())
            .window("Full Nakshatra")
            .describe(format!(
                "{} in {} (6th nakshatra from natal {}'s {}) → Loss",
                body, sixth, body, natal.nakshatra
            )),
        );
    }
    out
}

fn loss_4(ctx: &RuleContext<'_>, gaps: &mut Vec<Body>) -> Vec<RuleInstance> {
    let Some(neptune) = ctx.natal.placement(Body::Neptune) else {
        gaps.push(Body::Neptune);
        return Vec::new();
    };
    let sign = neptune.sign();
    let degree = neptune.degree();
    vec![RuleInstance::new(
        RuleId::Loss4,
        Condition::WithinOrb {
            body: Body::Moon,
            sign,
            center: degree,
            orb: ctx.options.orb,
        },
        EventPlacement::FixedSignHouseAtStart {
            sign,
            body: Body::Moon,
        },
    )
    .body("Moon")
    .window(orb_label(degree, ctx.options.orb))
    .describe(format!(
        "Moon conjunct Natal Neptune degree ({}) in {} → Loss",
        dms_short(degree),
        sign
    ))]
}

fn loss_5(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let sixth = ctx.features.house_lord(6);
    let eighth = ctx.features.house_lord(8);
    let mut instance = RuleInstance::new(
        RuleId::Loss5,
        Condition::SignRelation {
            first: sixth,
            second: eighth,
            steps: [5, 7],
        },
        EventPlacement::PairAtStart(sixth, eighth),
    )
    .body(format!("{}/{}", sixth, eighth))
    .window("6/8 Relation")
    .describe(format!(
        "6L ({}) and 8L ({}) in 6/8 relationship → EXPENSE",
        sixth, eighth
    ));
    instance.category = Category::Expense;
    vec![instance]
}

/// Nakshatras that turn a Loss #6 event into Money: those ruled by any
/// Panaphara planet or by the 2nd, 5th or 9th lord, except Swati.
pub fn loss_6_exceptions(features: &NatalFeatures) -> Vec<Nakshatra> {
    let mut owners = features.panaphara_bodies();
    for house in [2, 5, 9] {
        let lord = features.house_lord(house);
        if !owners.contains(&lord) {
            owners.push(lord);
        }
    }
    let mut nakshatras: Vec<Nakshatra> = owners
        .into_iter()
        .flat_map(|owner| Nakshatra::ruled_by(owner).iter().copied())
        .filter(|n| n.index() != SWATI)
        .collect();
    nakshatras.sort();
    nakshatras.dedup();
    nakshatras
}

fn loss_6(ctx: &RuleContext<'_>) -> Vec<RuleInstance> {
    let exceptions = loss_6_exceptions(ctx.features);
    [3u8, 6, 8, 12]
        .iter()
        .map(|&house| {
            let sign = ctx.features.ascendant_sign.offset(house as usize - 1);
            RuleInstance::new(
                RuleId::Loss6,
                Condition::InSign {
                    body: Body::Sun,
                    sign,
                },
                EventPlacement::AtStartWithException {
                    body: Body::Sun,
                    nakshatras: exceptions.clone(),
                },
            )
            .body("Sun")
            .window("Full Sign")
            .describe(format!("Sun in {}H ({}) → Loss", house, sign))
        })
        .collect()
}
