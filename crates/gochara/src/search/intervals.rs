//! Interval discovery for time-continuous predicates.
//!
//! The window is walked at a coarse stride to find crude true-runs, then each
//! crude boundary is pushed outward at a fine stride while the predicate
//! still holds. Refinement is a linear creep, never a bisection, so the
//! boundary returned is always a sampled instant where the predicate held.

use crate::ephemeris::EphemerisError;
use crate::error::{GocharaError, Result};
use crate::search::control::ScanControl;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Closed `[start, end]` time range to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ScanWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(GocharaError::InvalidDateTimeInput {
                input: format!("{} .. {}", start, end),
                reason: "scan window ends before it starts".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Coarse and refine strides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSteps {
    coarse: Duration,
    refine: Duration,
}

impl Default for ScanSteps {
    fn default() -> Self {
        Self {
            coarse: Duration::seconds(3600),
            refine: Duration::seconds(60),
        }
    }
}

impl ScanSteps {
    /// Requires `0 < refine <= coarse`.
    pub fn new(coarse: Duration, refine: Duration) -> Result<Self> {
        if refine <= Duration::zero() || refine > coarse {
            return Err(GocharaError::InvalidScanSteps {
                coarse_secs: coarse.num_seconds(),
                refine_secs: refine.num_seconds(),
            });
        }
        Ok(Self { coarse, refine })
    }

    pub fn from_secs(coarse_secs: i64, refine_secs: i64) -> Result<Self> {
        Self::new(Duration::seconds(coarse_secs), Duration::seconds(refine_secs))
    }

    pub fn coarse(&self) -> Duration {
        self.coarse
    }

    pub fn refine(&self) -> Duration {
        self.refine
    }

    /// Most refine steps taken past one crude boundary: `ceil(coarse / refine) - 1`.
    ///
    /// Stopping short of a full coarse stride keeps the creep from reaching
    /// the neighbouring coarse sample, which is already known to be false.
    pub fn max_creep(&self) -> i64 {
        let coarse = self.coarse.num_milliseconds();
        let refine = self.refine.num_milliseconds().max(1);
        (coarse + refine - 1) / refine - 1
    }
}

/// A closed true-run of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Sorted and non-overlapping, each inside the scan window.
    pub intervals: Vec<Interval>,
    /// Samples whose predicate failed and were treated as false.
    pub failed_samples: usize,
}

struct Sampler<F> {
    predicate: F,
    failed: usize,
}

impl<F> Sampler<F>
where
    F: FnMut(DateTime<Utc>) -> std::result::Result<bool, EphemerisError>,
{
    fn holds(&mut self, instant: DateTime<Utc>) -> bool {
        match (self.predicate)(instant) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Sample at {} failed, treating as false: {}", instant, e);
                self.failed += 1;
                false
            }
        }
    }
}

/// Find every interval in `window` where `predicate` holds.
///
/// A failing sample counts as false and is tallied in
/// [`Discovery::failed_samples`]. `control` is checked before every sample.
pub fn find_true_intervals<F>(
    window: &ScanWindow,
    steps: &ScanSteps,
    control: &ScanControl,
    predicate: F,
) -> Result<Discovery>
where
    F: FnMut(DateTime<Utc>) -> std::result::Result<bool, EphemerisError>,
{
    let mut sampler = Sampler {
        predicate,
        failed: 0,
    };

    let crude = coarse_pass(window, steps, control, &mut sampler)?;

    let mut intervals = Vec::with_capacity(crude.len());
    for (start, end) in crude {
        let start = creep(start, -steps.refine, window, steps.max_creep(), control, &mut sampler)?;
        let end = creep(end, steps.refine, window, steps.max_creep(), control, &mut sampler)?;
        intervals.push(Interval { start, end });
    }

    Ok(Discovery {
        intervals,
        failed_samples: sampler.failed,
    })
}

/// Infallible form for predicates that cannot fail and scans that are never
/// cancelled.
pub fn find_intervals<F>(window: &ScanWindow, steps: &ScanSteps, mut predicate: F) -> Vec<Interval>
where
    F: FnMut(DateTime<Utc>) -> bool,
{
    find_true_intervals(window, steps, &ScanControl::new(), |t| Ok(predicate(t)))
        .map(|d| d.intervals)
        .unwrap_or_default()
}

fn coarse_pass<F>(
    window: &ScanWindow,
    steps: &ScanSteps,
    control: &ScanControl,
    sampler: &mut Sampler<F>,
) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>>
where
    F: FnMut(DateTime<Utc>) -> std::result::Result<bool, EphemerisError>,
{
    let mut crude = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;
    let mut current = window.start;

    while current <= window.end {
        control.check()?;
        if sampler.holds(current) {
            if open.is_none() {
                open = Some(current);
            }
        } else if let Some(start) = open.take() {
            crude.push((start, current - steps.coarse));
        }
        current += steps.coarse;
    }

    if let Some(start) = open {
        crude.push((start, window.end));
    }
    Ok(crude)
}

// Walk from `boundary` in `stride` steps while the predicate holds.
fn creep<F>(
    boundary: DateTime<Utc>,
    stride: Duration,
    window: &ScanWindow,
    limit: i64,
    control: &ScanControl,
    sampler: &mut Sampler<F>,
) -> Result<DateTime<Utc>>
where
    F: FnMut(DateTime<Utc>) -> std::result::Result<bool, EphemerisError>,
{
    let mut refined = boundary;
    let mut probe = boundary + stride;
    let mut taken = 0;
    while taken < limit && window.contains(probe) {
        control.check()?;
        if !sampler.holds(probe) {
            break;
        }
        refined = probe;
        probe += stride;
        taken += 1;
    }
    Ok(refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn hours(h: i64) -> DateTime<Utc> {
        t0() + Duration::hours(h)
    }

    #[test]
    fn test_steps_validation() {
        assert!(ScanSteps::from_secs(3600, 60).is_ok());
        assert!(ScanSteps::from_secs(60, 60).is_ok());
        assert!(matches!(
            ScanSteps::from_secs(60, 120),
            Err(GocharaError::InvalidScanSteps { .. })
        ));
        assert!(ScanSteps::from_secs(60, 0).is_err());
    }

    #[test]
    fn test_max_creep() {
        assert_eq!(ScanSteps::default().max_creep(), 59);
        assert_eq!(ScanSteps::from_secs(100, 30).unwrap().max_creep(), 3);
        assert_eq!(ScanSteps::from_secs(60, 60).unwrap().max_creep(), 0);
    }

    #[test]
    fn test_window_rejects_reversed() {
        assert!(matches!(
            ScanWindow::new(hours(2), hours(1)),
            Err(GocharaError::InvalidDateTimeInput { .. })
        ));
        assert!(ScanWindow::new(hours(1), hours(1)).is_ok());
    }

    #[test]
    fn test_open_run_closes_at_window_end() {
        // Window end is off the coarse grid.
        let window = ScanWindow::new(t0(), hours(5) + Duration::minutes(30)).unwrap();
        let found = find_intervals(&window, &ScanSteps::default(), |t| t >= hours(3));
        assert_eq!(found, vec![Interval { start: hours(3), end: window.end() }]);
    }

    #[test]
    fn test_failures_are_false_and_counted() {
        let window = ScanWindow::new(t0(), hours(4)).unwrap();
        let bad = hours(2);
        let discovery = find_true_intervals(&window, &ScanSteps::default(), &ScanControl::new(), |t| {
            if t == bad {
                Err(EphemerisError::UnsupportedBody {
                    body: crate::ephemeris::Body::Neptune,
                })
            } else {
                Ok(true)
            }
        })
        .unwrap();
        assert_eq!(discovery.failed_samples, 1);
        assert_eq!(discovery.intervals.len(), 2);
        assert_eq!(discovery.intervals[0].start, t0());
        assert_eq!(discovery.intervals[1].end, hours(4));
        assert!(discovery.intervals[0].end < bad);
        assert!(discovery.intervals[1].start > bad);
    }
}
