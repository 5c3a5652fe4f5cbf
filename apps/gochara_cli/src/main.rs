use anyhow::Context;
use chrono::{Duration, FixedOffset, NaiveTime};
use clap::{Args, Parser, Subcommand};
use gochara::muhurtha::{scan_day, scan_month, DayScanRequest, MonthScanRequest};
use gochara::{
    local_instant, parse_date, parse_local_datetime, parse_utc_offset, BirthMoment, Body,
    EphemerisAdapter, GeoLocation, LocationResolver, ResolvedPlace, RuleId, RuleSet, ScanControl,
    ScanWindow, TransitEngine,
};
use gochara_config::GocharaSettings;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Config file (default: configs/gochara.toml, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference frame name, overriding `ephemeris.reference_frame`.
    #[arg(long, global = true)]
    frame: Option<String>,

    /// Give up after this many seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List money and loss transit events for a birth chart.
    Transit(TransitArgs),
    /// Scan one local day for muhurtha windows.
    Day(DayArgs),
    /// Rank the best muhurtha windows of a month for each activity.
    Month(MonthArgs),
}

/// Either a configured place name or explicit coordinates.
#[derive(Args, Debug)]
struct PlaceArgs {
    /// Place name from the `[[places]]` table.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    place: Option<String>,

    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// "+05:30", "-0800" or "UTC". Required with --lat/--lon.
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<String>,
}

#[derive(Args, Debug)]
struct TransitArgs {
    /// Birth date, YYYY-MM-DD.
    #[arg(long)]
    birth_date: String,

    /// Birth time, HH:MM local to the birth place.
    #[arg(long)]
    birth_time: String,

    #[command(flatten)]
    place: PlaceArgs,

    /// First day scanned, YYYY-MM-DD.
    #[arg(long)]
    from: String,

    /// Last day scanned (inclusive), YYYY-MM-DD.
    #[arg(long)]
    to: String,

    /// Comma-separated rule keys (money_1 .. loss_6) replacing the configured set.
    #[arg(long, value_delimiter = ',')]
    rules: Vec<String>,
}

#[derive(Args, Debug)]
struct DayArgs {
    /// Local date, YYYY-MM-DD.
    #[arg(long)]
    date: String,

    #[command(flatten)]
    place: PlaceArgs,

    /// Activity label from the preset list.
    #[arg(long, conflicts_with = "karakas")]
    activity: Option<String>,

    /// Comma-separated karaka bodies.
    #[arg(long, value_delimiter = ',')]
    karakas: Vec<String>,

    #[arg(long)]
    min_rules: Option<u8>,
}

#[derive(Args, Debug)]
struct MonthArgs {
    #[arg(long)]
    year: i32,

    /// 1-12.
    #[arg(long)]
    month: u32,

    #[command(flatten)]
    place: PlaceArgs,

    /// Window threshold; the standard report uses 4.
    #[arg(long)]
    min_score: Option<u8>,

    #[arg(long)]
    top_n: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = gochara_config::load_settings(cli.config.as_deref())?;
    let adapter = EphemerisAdapter::swiss(settings.ephemeris_path.clone())
        .context("Failed to open the Swiss Ephemeris")?;
    let control = match cli.timeout_secs {
        Some(secs) => ScanControl::with_timeout(std::time::Duration::from_secs(secs)),
        None => ScanControl::new(),
    };
    let frame_name = cli.frame.as_deref().unwrap_or(&settings.reference_frame);
    let frame = settings.frames.frame(frame_name);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Transit(args) => {
            let place = resolve_place(&settings, &args.place)?;
            let tz = place.utc_offset;
            let birth = BirthMoment {
                instant: parse_local_datetime(&args.birth_date, &args.birth_time, &tz)
                    .context("Invalid birth date or time")?,
                location: place.location,
            };
            let window = scan_window(&args.from, &args.to, &tz)?;

            let mut transit = settings.transit.clone();
            if !args.rules.is_empty() {
                let rules = args
                    .rules
                    .iter()
                    .map(|r| r.parse::<RuleId>().map_err(anyhow::Error::msg))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                transit.rules = RuleSet::only(&rules);
            }

            let engine = TransitEngine::new(adapter, frame, transit);
            let report = engine
                .run(&birth, window, &control)
                .with_context(|| format!("Transit scan for {} failed", place.name))?;
            for event in &report.events {
                writeln!(out, "{}", serde_json::to_string(&event.to_row(&tz))?)?;
            }
        }
        Command::Day(args) => {
            let place = resolve_place(&settings, &args.place)?;
            let (label, karakas) = day_karakas(&settings, &args)?;
            let request = DayScanRequest {
                date: parse_date(&args.date)?,
                tz: place.utc_offset,
                location: place.location,
                karakas,
                min_rules: args.min_rules.unwrap_or(settings.muhurtha.min_rules),
            };
            let scan = scan_day(adapter, &frame, &request, &control)
                .with_context(|| format!("Day scan for {} failed", args.date))?;
            log::info!(
                "{}: {} window(s), {} skipped instant(s)",
                args.date,
                scan.windows.len(),
                scan.skipped_instants
            );
            for window in scan.ranked() {
                writeln!(out, "{}", serde_json::to_string(&window.to_row(&label, &request.tz))?)?;
            }
        }
        Command::Month(args) => {
            let place = resolve_place(&settings, &args.place)?;
            let mut request = MonthScanRequest::new(
                args.year,
                args.month,
                place.utc_offset,
                place.location,
                settings.muhurtha.presets.clone(),
            );
            request.min_score = args.min_score.unwrap_or(settings.muhurtha.min_score);
            request.top_n = args.top_n.unwrap_or(settings.muhurtha.top_n);
            let scan = scan_month(adapter, &frame, &request, &control)
                .with_context(|| format!("Month scan for {}-{:02} failed", args.year, args.month))?;
            for activity in &scan.activities {
                if activity.windows.is_empty() {
                    log::info!("{}: no qualifying windows", activity.preset.label);
                }
                for window in &activity.windows {
                    let row = window.to_row(&activity.preset.label, &request.tz);
                    writeln!(out, "{}", serde_json::to_string(&row)?)?;
                }
            }
        }
    }

    Ok(())
}

fn resolve_place(settings: &GocharaSettings, args: &PlaceArgs) -> anyhow::Result<ResolvedPlace> {
    match (args.lat, args.lon, &args.place) {
        (Some(lat), Some(lon), _) => {
            let offset = args
                .utc_offset
                .as_deref()
                .context("--utc-offset is required with --lat/--lon")?;
            Ok(ResolvedPlace {
                name: format!("{lat:.4}, {lon:.4}"),
                location: GeoLocation { lat, lon },
                utc_offset: parse_utc_offset(offset)?,
            })
        }
        (_, _, Some(name)) => {
            let mut place = settings.places.resolve(name)?;
            if let Some(offset) = args.utc_offset.as_deref() {
                place.utc_offset = parse_utc_offset(offset)?;
            }
            Ok(place)
        }
        _ => anyhow::bail!("Give either --place or --lat/--lon/--utc-offset"),
    }
}

/// `[from, to]` as whole local days.
fn scan_window(from: &str, to: &str, tz: &FixedOffset) -> anyhow::Result<ScanWindow> {
    let first = parse_date(from)?;
    let last = parse_date(to)?;
    let start = local_instant(first.and_time(NaiveTime::MIN), tz)?;
    let end = local_instant(last.and_time(NaiveTime::MIN), tz)? + Duration::days(1);
    Ok(ScanWindow::new(start, end)?)
}

fn day_karakas(settings: &GocharaSettings, args: &DayArgs) -> anyhow::Result<(String, Vec<Body>)> {
    if !args.karakas.is_empty() {
        let karakas = args
            .karakas
            .iter()
            .map(|k| k.parse::<Body>().map_err(anyhow::Error::msg))
            .collect::<anyhow::Result<Vec<_>>>()?;
        return Ok((gochara::muhurtha::CUSTOM_LABEL.to_string(), karakas));
    }
    if let Some(label) = &args.activity {
        let preset = settings
            .muhurtha
            .presets
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label))
            .with_context(|| format!("Unknown activity {label}"))?;
        return Ok((preset.label.clone(), preset.karakas.clone()));
    }
    if !settings.muhurtha.custom.is_empty() {
        return Ok((
            gochara::muhurtha::CUSTOM_LABEL.to_string(),
            settings.muhurtha.custom.clone(),
        ));
    }
    anyhow::bail!("Give --activity or --karakas (or set muhurtha.custom)")
}
