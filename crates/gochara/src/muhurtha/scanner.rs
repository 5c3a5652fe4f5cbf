//! Day and month muhurtha scanners.
//!
//! Both walk local time at a fixed two-minute stride. Every instant opens
//! its own ephemeris session, so other callers can interleave between
//! instants. Month scans build one chart per instant and share it across
//! every activity.

use crate::chart::Chart;
use crate::ephemeris::{Body, EphemerisAdapter, EphemerisError, FrameSelection, GeoLocation, ReferenceFrame};
use crate::error::{GocharaError, Result};
use crate::location::local_instant;
use crate::muhurtha::evaluator::{ChartAssessment, MuhurthaMoment};
use crate::muhurtha::presets::ActivityPreset;
use crate::muhurtha::window::MuhurthaWindow;
use crate::search::ScanControl;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;

pub const SCAN_STRIDE_MINUTES: i64 = 2;
pub const DEFAULT_MIN_RULES: u8 = 3;
/// Month windows are built from moments scoring at least this. A lower
/// threshold is a non-standard override.
pub const DEFAULT_MIN_SCORE: u8 = 4;
pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DayScanRequest {
    pub date: NaiveDate,
    pub tz: FixedOffset,
    pub location: GeoLocation,
    pub karakas: Vec<Body>,
    /// A moment belongs to a window when at least this many rules pass.
    pub min_rules: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayScan {
    pub frame: FrameSelection,
    /// Chronological.
    pub windows: Vec<MuhurthaWindow>,
    pub skipped_instants: usize,
}

impl DayScan {
    /// Best score first, earlier start breaking ties.
    pub fn ranked(&self) -> Vec<&MuhurthaWindow> {
        let mut ranked: Vec<&MuhurthaWindow> = self.windows.iter().collect();
        ranked.sort_by_key(|w| (Reverse(w.best_score()), w.start));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthScanRequest {
    pub year: i32,
    pub month: u32,
    pub tz: FixedOffset,
    pub location: GeoLocation,
    pub presets: Vec<ActivityPreset>,
    /// Lowest score a moment needs to belong to a window. The standard
    /// month report uses [`DEFAULT_MIN_SCORE`]; other values change what
    /// "qualifying" means and are only for exploratory runs.
    pub min_score: u8,
    /// Windows kept per activity.
    pub top_n: usize,
}

impl MonthScanRequest {
    /// A request with the standard threshold and `top_n`.
    pub fn new(
        year: i32,
        month: u32,
        tz: FixedOffset,
        location: GeoLocation,
        presets: Vec<ActivityPreset>,
    ) -> Self {
        Self {
            year,
            month,
            tz,
            location,
            presets,
            min_score: DEFAULT_MIN_SCORE,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// The top windows found for one activity.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityWindows {
    pub preset: ActivityPreset,
    pub windows: Vec<MuhurthaWindow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthScan {
    pub frame: FrameSelection,
    /// Same order as the request's presets.
    pub activities: Vec<ActivityWindows>,
    pub skipped_instants: usize,
}

/// Tracks the open window for one activity while a day is walked.
#[derive(Default)]
struct WindowTracker {
    open: Option<MuhurthaWindow>,
    closed: Vec<MuhurthaWindow>,
}

impl WindowTracker {
    fn observe(&mut self, moment: MuhurthaMoment, passes: bool) {
        if passes {
            match self.open.as_mut() {
                Some(window) => window.extend(moment),
                None => self.open = Some(MuhurthaWindow::open(moment)),
            }
        } else if let Some(window) = self.open.take() {
            self.closed.push(window.close(moment.instant));
        }
    }

    fn close_at(&mut self, end: DateTime<Utc>) {
        if let Some(window) = self.open.take() {
            self.closed.push(window.close(end));
        }
    }
}

/// UTC bounds of one local calendar day.
fn day_bounds(date: NaiveDate, tz: &FixedOffset) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date.succ_opt().ok_or_else(|| GocharaError::InvalidDateTimeInput {
        input: date.to_string(),
        reason: "date out of range".to_string(),
    })?;
    let start = local_instant(date.and_time(NaiveTime::MIN), tz)?;
    let end = local_instant(next.and_time(NaiveTime::MIN), tz)?;
    Ok((start, end))
}

/// Walk one day and collect every run where at least `min_rules` rules pass.
pub fn scan_day(
    adapter: &EphemerisAdapter,
    frame: &ReferenceFrame,
    request: &DayScanRequest,
    control: &ScanControl,
) -> Result<DayScan> {
    let (day_start, day_end) = day_bounds(request.date, &request.tz)?;
    let selection = adapter.session(frame).frame().clone();
    let stride = Duration::minutes(SCAN_STRIDE_MINUTES);

    let mut tracker = WindowTracker::default();
    let mut skipped_instants = 0usize;
    let mut instant = day_start;

    while instant < day_end {
        control.check()?;
        match moment_chart(adapter, frame, instant, request.location) {
            Ok(chart) => {
                let moment = ChartAssessment::of(&chart).moment(&request.karakas);
                let passes = moment.rules_pass >= request.min_rules;
                tracker.observe(moment, passes);
            }
            Err(e) => {
                log::debug!("Skipping {}: {}", instant, e);
                skipped_instants += 1;
            }
        }
        instant += stride;
    }
    tracker.close_at(day_end);

    log::info!(
        "Day scan {}: {} windows ({} instants skipped)",
        request.date,
        tracker.closed.len(),
        skipped_instants
    );

    Ok(DayScan {
        frame: selection,
        windows: tracker.closed,
        skipped_instants,
    })
}

/// Walk every day of a month for every preset, keeping each activity's
/// `top_n` windows whose moments all score at least `min_score`.
pub fn scan_month(
    adapter: &EphemerisAdapter,
    frame: &ReferenceFrame,
    request: &MonthScanRequest,
    control: &ScanControl,
) -> Result<MonthScan> {
    let first = NaiveDate::from_ymd_opt(request.year, request.month, 1).ok_or_else(|| {
        GocharaError::InvalidDateTimeInput {
            input: format!("{}-{:02}", request.year, request.month),
            reason: "not a valid month".to_string(),
        }
    })?;
    let selection = adapter.session(frame).frame().clone();
    let stride = Duration::minutes(SCAN_STRIDE_MINUTES);

    let mut trackers: Vec<WindowTracker> = request.presets.iter().map(|_| WindowTracker::default()).collect();
    let mut skipped_instants = 0usize;

    let mut date = first;
    while date.month() == request.month {
        let (day_start, day_end) = day_bounds(date, &request.tz)?;
        let mut instant = day_start;
        while instant < day_end {
            control.check()?;
            match moment_chart(adapter, frame, instant, request.location) {
                Ok(chart) => {
                    let assessment = ChartAssessment::of(&chart);
                    for (preset, tracker) in request.presets.iter().zip(trackers.iter_mut()) {
                        let moment = assessment.moment(&preset.karakas);
                        let passes = moment.score() >= request.min_score;
                        tracker.observe(moment, passes);
                    }
                }
                Err(e) => {
                    log::debug!("Skipping {}: {}", instant, e);
                    skipped_instants += 1;
                }
            }
            instant += stride;
        }
        for tracker in trackers.iter_mut() {
            tracker.close_at(day_end);
        }

        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    let activities: Vec<ActivityWindows> = request
        .presets
        .iter()
        .zip(trackers)
        .map(|(preset, tracker)| {
            let mut windows = tracker.closed;
            windows.sort_by_key(|w| (Reverse(w.best_score()), Reverse(w.duration_minutes())));
            windows.truncate(request.top_n);
            ActivityWindows {
                preset: preset.clone(),
                windows,
            }
        })
        .collect();

    log::info!(
        "Month scan {}-{:02}: {} activities ({} instants skipped)",
        request.year,
        request.month,
        activities.len(),
        skipped_instants
    );

    Ok(MonthScan {
        frame: selection,
        activities,
        skipped_instants,
    })
}

fn moment_chart(
    adapter: &EphemerisAdapter,
    frame: &ReferenceFrame,
    instant: DateTime<Utc>,
    location: GeoLocation,
) -> std::result::Result<Chart, EphemerisError> {
    let session = adapter.quiet_session(frame);
    Chart::moment(&session, instant, location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds_follow_local_midnight() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, end) = day_bounds(date, &ist).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-02-29T18:30:00+00:00");
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_month_request_uses_standard_threshold() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let location = GeoLocation { lat: 13.0827, lon: 80.2707 };
        let request = MonthScanRequest::new(2024, 2, ist, location, ActivityPreset::builtin());
        assert_eq!(request.min_score, 4);
        assert_eq!(request.top_n, 5);
    }
}
