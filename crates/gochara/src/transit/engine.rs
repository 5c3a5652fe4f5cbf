use crate::chart::{Chart, SiderealPosition, NATAL_BODIES};
use crate::ephemeris::{
    Body, EphemerisAdapter, EphemerisError, EphemerisSession, FrameSelection, GeoLocation,
    ReferenceFrame,
};
use crate::error::Result;
use crate::search::{find_true_intervals, Interval, ScanControl, ScanSteps, ScanWindow};
use crate::transit::condition::{EventPlacement, HouseRef, RuleInstance, SignRef};
use crate::transit::event::Event;
use crate::transit::rule::{Category, RuleId, RuleSet};
use crate::transit::rules::{instantiate, RuleOptions};
use crate::vedic::{house_from_lagna, Nakshatra};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct TransitSettings {
    pub steps: ScanSteps,
    /// Conjunction tolerance in degrees.
    pub orb: f64,
    pub rules: RuleSet,
    /// Bodies computed for the natal chart and allowed in transit.
    pub natal_bodies: Vec<Body>,
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self {
            steps: ScanSteps::default(),
            orb: 1.0,
            rules: RuleSet::all(),
            natal_bodies: NATAL_BODIES.to_vec(),
        }
    }
}

/// Birth instant and place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BirthMoment {
    pub instant: DateTime<Utc>,
    pub location: GeoLocation,
}

/// Instances of `rule` left out because `body` is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissingDependency {
    pub rule: RuleId,
    pub body: Body,
}

/// Events plus everything the caller needs to judge how complete they are.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventScan {
    /// Stable-sorted by start; overlapping events from different rules are kept.
    pub events: Vec<Event>,
    pub failed_samples: usize,
    pub missing: Vec<MissingDependency>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitReport {
    pub natal: Chart,
    pub frame: FrameSelection,
    pub events: Vec<Event>,
    pub failed_samples: usize,
    pub missing: Vec<MissingDependency>,
}

/// Runs enabled rules against one natal chart over a scan window.
pub struct TransitEngine<'a> {
    adapter: &'a EphemerisAdapter,
    frame: ReferenceFrame,
    settings: TransitSettings,
}

impl<'a> TransitEngine<'a> {
    pub fn new(adapter: &'a EphemerisAdapter, frame: ReferenceFrame, settings: TransitSettings) -> Self {
        Self {
            adapter,
            frame,
            settings,
        }
    }

    pub fn settings(&self) -> &TransitSettings {
        &self.settings
    }

    /// Build the natal chart and scan every enabled rule.
    ///
    /// The whole run happens under one session, so no other caller can
    /// change the reference frame part way through. A natal chart failure
    /// is fatal; per-sample failures are counted on the report.
    pub fn run(&self, birth: &BirthMoment, window: ScanWindow, control: &ScanControl) -> Result<TransitReport> {
        let session = self.adapter.session(&self.frame);
        let natal = Chart::natal(&session, birth.instant, birth.location, &self.settings.natal_bodies)?;
        log::info!(
            "Natal chart: {} rising, frame {:?}",
            natal.lagna(),
            session.frame()
        );

        let scan = self.events(&session, &natal, &window, control)?;
        Ok(TransitReport {
            frame: session.frame().clone(),
            natal,
            events: scan.events,
            failed_samples: scan.failed_samples,
            missing: scan.missing,
        })
    }

    /// Scan every enabled rule inside an existing session.
    pub fn events(
        &self,
        session: &EphemerisSession<'_>,
        natal: &Chart,
        window: &ScanWindow,
        control: &ScanControl,
    ) -> Result<EventScan> {
        let options = RuleOptions {
            orb: self.settings.orb,
            tracked: self.settings.natal_bodies.clone(),
        };

        let mut scan = EventScan::default();
        let mut instance_count = 0usize;

        for rule in self.settings.rules.iter() {
            let expansion = instantiate(rule, natal, &options);
            for &body in &expansion.missing {
                log::warn!("{}: instances needing {} skipped, it is not tracked", rule, body);
                scan.missing.push(MissingDependency { rule, body });
            }
            let instances = expansion.instances;
            instance_count += instances.len();

            for instance in &instances {
                let discovery = find_true_intervals(window, &self.settings.steps, control, |t| {
                    instance.condition.holds(session, t)
                })?;
                scan.failed_samples += discovery.failed_samples;

                for interval in discovery.intervals {
                    match label_event(session, natal, instance, interval) {
                        Ok(event) => scan.events.push(event),
                        Err(e) => {
                            log::debug!(
                                "Dropping {} event at {}: {}",
                                instance.rule_label,
                                interval.start,
                                e
                            );
                            scan.failed_samples += 1;
                        }
                    }
                }
            }
        }

        // sort_by_key is stable
        scan.events.sort_by_key(|e| e.interval.start);

        log::info!(
            "{} events from {} rule instances ({} failed samples, {} missing dependencies)",
            scan.events.len(),
            instance_count,
            scan.failed_samples,
            scan.missing.len()
        );
        Ok(scan)
    }
}

fn position_at(
    session: &EphemerisSession<'_>,
    instant: DateTime<Utc>,
    body: Body,
) -> std::result::Result<SiderealPosition, EphemerisError> {
    Ok(SiderealPosition::from_longitude(session.position(instant, body)?))
}

fn label_event(
    session: &EphemerisSession<'_>,
    natal: &Chart,
    instance: &RuleInstance,
    interval: Interval,
) -> std::result::Result<Event, EphemerisError> {
    let lagna = natal.lagna();
    let start = interval.start;

    let mut event = Event {
        category: instance.category,
        rule: instance.rule,
        rule_label: instance.rule_label.to_string(),
        body: instance.body_label.clone(),
        interval,
        sign: SignRef::Single(lagna),
        house: HouseRef::Single(1),
        window: instance.window_label.clone(),
        description: instance.description.clone(),
    };

    let sign = match &instance.placement {
        EventPlacement::Fixed(sign) => *sign,
        EventPlacement::AtStart(body) => SignRef::Single(position_at(session, start, *body)?.sign),
        EventPlacement::PairAtStart(first, second) => SignRef::Pair(
            position_at(session, start, *first)?.sign,
            position_at(session, start, *second)?.sign,
        ),
        EventPlacement::FixedSignHouseAtStart { sign, body } => {
            let at_start = position_at(session, start, *body)?;
            event.sign = SignRef::Single(*sign);
            event.house = SignRef::Single(at_start.sign).houses(lagna);
            return Ok(event);
        }
        EventPlacement::AtStartWithException { body, nakshatras } => {
            let at_start = position_at(session, start, *body)?;
            let nakshatra = Nakshatra::containing(at_start.longitude);
            let house = house_from_lagna(at_start.sign, lagna);
            if nakshatras.contains(&nakshatra) {
                event.category = Category::Money;
                event.rule_label = format!("{} (Exception)", instance.rule.label());
                event.description = format!(
                    "{} in {}H ({}) in {} (owned by {} - PP planet) → Money",
                    body,
                    house,
                    at_start.sign,
                    nakshatra,
                    nakshatra.lord()
                );
            } else {
                event.description = format!(
                    "{} in {}H ({}) in {} → Loss",
                    body, house, at_start.sign, nakshatra
                );
            }
            SignRef::Single(at_start.sign)
        }
    };

    event.sign = sign;
    event.house = sign.houses(lagna);
    Ok(event)
}
