mod common;

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use common::{chennai, LinearBackend, ARIES_ONLY_SKY};
use gochara::ephemeris::{Body, EphemerisAdapter, FrameCatalog};
use gochara::muhurtha::{
    evaluate_moment, scan_day, scan_month, ActivityPreset, DayScanRequest, Grade, MonthScanRequest,
};
use gochara::{GocharaError, ScanControl};

fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
}

#[test]
fn test_lagna_lord_in_fourth_passes_rule_one() {
    let epoch = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let adapter = EphemerisAdapter::new(
        LinearBackend::new(epoch)
            .fixed(&ARIES_ONLY_SKY)
            .body(Body::Mars, 95.0, 0.0)
            .ascendant(5.0, 0.0),
    );
    let session = adapter.session(&FrameCatalog::default().frame("KP_old"));
    let moment = evaluate_moment(&session, epoch, chennai(), &[Body::Mercury]).unwrap();

    assert_eq!(moment.ascendant.sign().index(), 0);
    assert_eq!(moment.lagna_lord, Body::Mars);
    assert_eq!(moment.lagna_lord_check.house, Some(4));
    assert!(moment.lagna_lord_check.passed);
}

#[test]
fn test_ketu_in_lagna_forces_zero() {
    let epoch = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let adapter = EphemerisAdapter::new(
        LinearBackend::new(epoch)
            .fixed(&ARIES_ONLY_SKY)
            .body(Body::Rahu, 190.0, 0.0)
            .ascendant(5.0, 0.0),
    );
    let session = adapter.session(&FrameCatalog::default().frame("KP_old"));
    let moment = evaluate_moment(&session, epoch, chennai(), &[Body::Mercury]).unwrap();

    assert!(moment.ketu_in_lagna);
    assert_eq!(moment.rules_pass, 0);
    assert_eq!(moment.score(), 0);
    assert_eq!(moment.grade, Grade::KetuInLagna);
    // Rule 4 is still reported.
    assert!(moment.karakas.passed);
    assert!(!moment.lagna_lord_check.passed);
}

#[test]
fn test_single_moment_failure_is_fatal() {
    let epoch = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let adapter = EphemerisAdapter::new(LinearBackend::new(epoch).ascendant(5.0, 0.0));
    let session = adapter.session(&FrameCatalog::default().frame("KP_old"));
    let result = evaluate_moment(&session, epoch, chennai(), &[]);
    assert!(matches!(
        result,
        Err(GocharaError::EphemerisComputationFailure(_))
    ));
}

// Local midnight 2024-03-01 in IST. The ascendant turns once a day from
// 300.25°, so Aries rises 03:59 and sets 05:59 local.
fn day_backend() -> LinearBackend {
    let midnight = Utc.with_ymd_and_hms(2024, 2, 29, 18, 30, 0).unwrap();
    LinearBackend::new(midnight)
        .fixed(&ARIES_ONLY_SKY)
        .ascendant(300.25, 360.0)
}

fn day_request(min_rules: u8) -> DayScanRequest {
    DayScanRequest {
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        tz: ist(),
        location: chennai(),
        karakas: vec![Body::Mercury],
        min_rules,
    }
}

#[test]
fn test_day_window_closes_at_first_failing_instant() {
    let adapter = EphemerisAdapter::new(day_backend());
    let frame = FrameCatalog::default().frame("KP_old");
    let scan = scan_day(&adapter, &frame, &day_request(5), &ScanControl::new()).unwrap();

    assert!(scan.frame.is_selected());
    assert_eq!(scan.skipped_instants, 0);
    assert_eq!(scan.windows.len(), 1);

    let window = &scan.windows[0];
    assert_eq!(window.start, ist().with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap());
    assert_eq!(window.end, ist().with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap());
    assert_eq!(window.scores.len(), 60);
    assert_eq!(window.best_score(), 5);
    assert_eq!(window.average_score(), 5.0);
    assert_eq!(window.duration_label(), "2h 0m");

    let row = window.to_row("Writing", &ist());
    assert_eq!(row.start, "04:00 AM");
    assert_eq!(row.end, "06:00 AM");
    assert_eq!(row.grade, "Excellent Muhurtha");
    assert_eq!(row.lagna_lord, Body::Mars);
}

#[test]
fn test_day_scan_skips_failed_instants_without_closing() {
    let from = ist().with_ymd_and_hms(2024, 3, 1, 4, 30, 0).unwrap().with_timezone(&Utc);
    let to = ist().with_ymd_and_hms(2024, 3, 1, 4, 40, 0).unwrap().with_timezone(&Utc);
    let adapter = EphemerisAdapter::new(day_backend().failing_between(from, to));
    let frame = FrameCatalog::default().frame("KP_old");
    let scan = scan_day(&adapter, &frame, &day_request(5), &ScanControl::new()).unwrap();

    assert_eq!(scan.skipped_instants, 5);
    assert_eq!(scan.windows.len(), 1);
    assert_eq!(scan.windows[0].scores.len(), 55);
}

#[test]
fn test_day_ranking_prefers_score_then_start() {
    let adapter = EphemerisAdapter::new(day_backend());
    let frame = FrameCatalog::default().frame("KP_old");
    let scan = scan_day(&adapter, &frame, &day_request(3), &ScanControl::new()).unwrap();

    let ranked = scan.ranked();
    assert_eq!(ranked.len(), scan.windows.len());
    assert_eq!(ranked[0].best_score(), 5);
    for pair in ranked.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(a.best_score() > b.best_score() || (a.best_score() == b.best_score() && a.start <= b.start));
    }
}

#[test]
fn test_cancelled_day_scan() {
    let adapter = EphemerisAdapter::new(day_backend());
    let frame = FrameCatalog::default().frame("KP_old");
    let control = ScanControl::new();
    control.cancel();
    let result = scan_day(&adapter, &frame, &day_request(5), &control);
    assert!(matches!(result, Err(GocharaError::Cancelled)));
}

fn month_request(presets: Vec<ActivityPreset>) -> MonthScanRequest {
    MonthScanRequest::new(2024, 2, ist(), chennai(), presets)
}

fn month_backend() -> LinearBackend {
    let midnight = Utc.with_ymd_and_hms(2024, 1, 31, 18, 30, 0).unwrap();
    LinearBackend::new(midnight)
        .fixed(&ARIES_ONLY_SKY)
        .ascendant(300.25, 360.0)
}

#[test]
fn test_month_scan_keeps_top_windows_per_activity() {
    let adapter = EphemerisAdapter::new(month_backend());
    let frame = FrameCatalog::default().frame("KP_old");
    let presets = vec![
        ActivityPreset::new("Writing", vec![Body::Mercury]),
        ActivityPreset::new("Travel", vec![Body::Moon, Body::Mercury]),
    ];
    let scan = scan_month(&adapter, &frame, &month_request(presets), &ScanControl::new()).unwrap();

    assert_eq!(scan.activities.len(), 2);
    let writing = &scan.activities[0];
    assert_eq!(writing.preset.label, "Writing");
    assert_eq!(writing.windows.len(), 5);
    assert!(writing.windows.iter().all(|w| w.best_score() >= 4));
    // Equal score and duration every day, so the earliest days survive.
    assert_eq!(
        writing.windows[0].start,
        ist().with_ymd_and_hms(2024, 2, 1, 4, 0, 0).unwrap()
    );
    assert_eq!(writing.windows[0].duration_minutes(), 120);

    // Moon in the 6th from Aries costs rule 4: score 3 never qualifies.
    assert!(scan.activities[1].windows.is_empty());
}

#[test]
fn test_month_scan_builds_one_chart_per_instant() {
    let instants = 29 * 720;

    let backend = month_backend();
    let counters = backend.counters();
    let adapter = EphemerisAdapter::new(backend);
    let frame = FrameCatalog::default().frame("KP_old");
    scan_month(
        &adapter,
        &frame,
        &month_request(ActivityPreset::with_custom(
            ActivityPreset::builtin(),
            &[Body::Venus, Body::Saturn],
        )),
        &ScanControl::new(),
    )
    .unwrap();
    assert_eq!(counters.ascendant_calls(), instants);
    let longitude_calls = counters.longitude_calls();

    let backend = month_backend();
    let single = backend.counters();
    let adapter = EphemerisAdapter::new(backend);
    scan_month(
        &adapter,
        &frame,
        &month_request(vec![ActivityPreset::new("Writing", vec![Body::Mercury])]),
        &ScanControl::new(),
    )
    .unwrap();
    assert_eq!(single.ascendant_calls(), instants);
    assert_eq!(single.longitude_calls(), longitude_calls);
}

#[test]
fn test_month_scan_rejects_bad_month() {
    let adapter = EphemerisAdapter::new(month_backend());
    let frame = FrameCatalog::default().frame("KP_old");
    let mut request = month_request(ActivityPreset::builtin());
    request.month = 13;
    assert!(matches!(
        scan_month(&adapter, &frame, &request, &ScanControl::new()),
        Err(GocharaError::InvalidDateTimeInput { .. })
    ));
}
