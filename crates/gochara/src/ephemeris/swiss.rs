use crate::ephemeris::adapter::{EphemerisAdapter, EphemerisBackend, EphemerisError};
use crate::ephemeris::types::{Body, GeoLocation, HouseSystem};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::env;
use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_int};
use std::path::PathBuf;
use std::sync::OnceLock;
use swisseph::swe::{calc_ut, houses_ex, julday};
use swisseph::AscMc;

// The swisseph crate links the C library but does not wrap these.
extern "C" {
    fn swe_set_ephe_path(path: *const c_char);
    fn swe_set_sid_mode(sid_mode: c_int, t0: c_double, ayan_t0: c_double);
    fn swe_get_ayanamsa_ut(tjd_ut: c_double) -> c_double;
}

// Swiss Ephemeris body codes. Rahu is the mean node (10), not the true node.
const BODY_CODES: &[(Body, i32)] = &[
    (Body::Sun, 0),
    (Body::Moon, 1),
    (Body::Mercury, 2),
    (Body::Venus, 3),
    (Body::Mars, 4),
    (Body::Jupiter, 5),
    (Body::Saturn, 6),
    (Body::Uranus, 7),
    (Body::Neptune, 8),
    (Body::Rahu, 10),
];

/// Sidereal-mode constants exposed by the Swiss Ephemeris C library.
const SIDEREAL_MODES: &[(&str, i32)] = &[
    ("SIDM_FAGAN_BRADLEY", 0),
    ("SE_SIDM_FAGAN_BRADLEY", 0),
    ("SIDM_LAHIRI", 1),
    ("SE_SIDM_LAHIRI", 1),
    ("SIDM_DELUCE", 2),
    ("SIDM_RAMAN", 3),
    ("SIDM_USHASHASHI", 4),
    ("SIDM_KRISHNAMURTI", 5),
    ("SE_SIDM_KRISHNAMURTI", 5),
    ("SIDM_DJWHAL_KHUL", 6),
    ("SIDM_YUKTESHWAR", 7),
    ("SIDM_JN_BHASIN", 8),
    ("SIDM_TRUE_CITRA", 27),
    ("SIDM_TRUE_REVATI", 28),
    ("SIDM_KRISHNAMURTI_VP291", 45),
];

const FLG_SWIEPH: i32 = 2;
const FLG_SPEED: i32 = 256;
const GREG_CAL: i32 = 1;

static SHARED: OnceLock<EphemerisAdapter> = OnceLock::new();

/// Swiss Ephemeris backend.
///
/// The C library keeps its sidereal mode and file path in process globals,
/// so there is only ever one of these per process; see [`EphemerisAdapter::swiss`].
pub struct SwissEphemeris {
    _ephemeris_path: PathBuf,
}

impl SwissEphemeris {
    fn new(ephemeris_path: Option<PathBuf>) -> Result<Self, EphemerisError> {
        let path = ephemeris_path.unwrap_or_else(|| {
            env::var("SWISS_EPHEMERIS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/usr/local/share/swisseph"))
        });

        if !path.exists() {
            return Err(EphemerisError::FileNotFound {
                path: path.display().to_string(),
                message: "Ephemeris path does not exist. Please ensure Swiss Ephemeris data files are installed.".to_string(),
            });
        }

        let c_path = CString::new(path.to_string_lossy().as_bytes()).map_err(|_| {
            EphemerisError::FileNotFound {
                path: path.display().to_string(),
                message: "Ephemeris path contains a NUL byte".to_string(),
            }
        })?;
        unsafe { swe_set_ephe_path(c_path.as_ptr()) };
        log::info!("Swiss Ephemeris files at {}", path.display());

        Ok(Self {
            _ephemeris_path: path,
        })
    }
}

impl EphemerisAdapter {
    /// The process-wide Swiss Ephemeris adapter.
    ///
    /// `ephemeris_path` is only used on first call.
    pub fn swiss(ephemeris_path: Option<PathBuf>) -> Result<&'static EphemerisAdapter, EphemerisError> {
        if let Some(adapter) = SHARED.get() {
            return Ok(adapter);
        }
        let adapter = EphemerisAdapter::new(SwissEphemeris::new(ephemeris_path)?);
        // Another thread may have won the race; theirs is just as good.
        let _ = SHARED.set(adapter);
        SHARED.get().ok_or_else(|| EphemerisError::FileNotFound {
            path: String::new(),
            message: "Swiss Ephemeris adapter failed to initialise".to_string(),
        })
    }
}

impl EphemerisBackend for SwissEphemeris {
    fn sidereal_mode(&self, constant: &str) -> Option<i32> {
        SIDEREAL_MODES
            .iter()
            .find(|(name, _)| *name == constant)
            .map(|(_, mode)| *mode)
    }

    fn set_sidereal_mode(&mut self, mode: i32) {
        unsafe { swe_set_sid_mode(mode, 0.0, 0.0) };
    }

    fn tropical_longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64, EphemerisError> {
        let code = BODY_CODES
            .iter()
            .find(|(b, _)| *b == body)
            .map(|(_, code)| *code)
            .ok_or(EphemerisError::UnsupportedBody { body })?;

        let jd = datetime_to_julian_day(instant);
        let result = calc_ut(jd, code as u32, (FLG_SWIEPH | FLG_SPEED) as u32).map_err(|e| {
            EphemerisError::CalculationFailed {
                body,
                instant,
                message: format!("Swiss Ephemeris error: {}", e),
            }
        })?;
        Ok(result.out[0])
    }

    fn reference_offset(&self, instant: DateTime<Utc>) -> Result<f64, EphemerisError> {
        let jd = datetime_to_julian_day(instant);
        Ok(unsafe { swe_get_ayanamsa_ut(jd) })
    }

    fn tropical_ascendant(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
        system: HouseSystem,
    ) -> Result<f64, EphemerisError> {
        let jd = datetime_to_julian_day(instant);
        let (_cusps, angles) = houses_ex(jd, 0, location.lat, location.lon, system.code() as i32);
        let ascendant = AscMc::from_array(angles).ascendant;
        if !ascendant.is_finite() {
            return Err(EphemerisError::HouseCalculationFailed {
                instant,
                message: format!("non-finite ascendant at {:?}", location),
            });
        }
        Ok(ascendant)
    }
}

/// Convert UTC datetime to Julian Day
fn datetime_to_julian_day(dt: DateTime<Utc>) -> f64 {
    let hour_decimal =
        dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;
    julday(dt.year(), dt.month() as i32, dt.day() as i32, hour_decimal, GREG_CAL as u32)
}
