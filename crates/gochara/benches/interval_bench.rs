use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gochara::search::{find_intervals, ScanSteps, ScanWindow};
use gochara::vedic::{in_any_window, wrap360, PANAPHARA_WINDOWS};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

// Moon-like motion: about 13.2° a day.
fn degree_in_sign(t: DateTime<Utc>) -> f64 {
    let days = (t - t0()).num_seconds() as f64 / 86_400.0;
    wrap360(17.0 + 13.2 * days) % 30.0
}

fn bench_month_window_scan(c: &mut Criterion) {
    let window = ScanWindow::new(t0(), t0() + Duration::days(30)).unwrap();
    let steps = ScanSteps::default();

    c.bench_function("find_intervals_month_hourly", |b| {
        b.iter(|| {
            find_intervals(black_box(&window), black_box(&steps), |t| {
                in_any_window(&PANAPHARA_WINDOWS, degree_in_sign(t))
            })
        })
    });
}

fn bench_fine_coarse_step(c: &mut Criterion) {
    let window = ScanWindow::new(t0(), t0() + Duration::days(30)).unwrap();
    let steps = ScanSteps::from_secs(600, 60).unwrap();

    c.bench_function("find_intervals_month_ten_minute", |b| {
        b.iter(|| {
            find_intervals(black_box(&window), black_box(&steps), |t| {
                in_any_window(&PANAPHARA_WINDOWS, degree_in_sign(t))
            })
        })
    });
}

criterion_group!(benches, bench_month_window_scan, bench_fine_coarse_step);
criterion_main!(benches);
