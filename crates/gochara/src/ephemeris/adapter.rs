use crate::ephemeris::types::{Body, FrameSelection, GeoLocation, HouseSystem, ReferenceFrame};
use crate::vedic::wrap360;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur during ephemeris calculations
#[derive(Error, Debug)]
pub enum EphemerisError {
    #[error("Ephemeris file not found at path: {path}. {message}")]
    FileNotFound { path: String, message: String },
    #[error("Body {body} is not supported by this engine")]
    UnsupportedBody { body: Body },
    #[error("Failed to calculate position for {body} at {instant}: {message}")]
    CalculationFailed {
        body: Body,
        instant: DateTime<Utc>,
        message: String,
    },
    #[error("House calculation failed at {instant}: {message}")]
    HouseCalculationFailed {
        instant: DateTime<Utc>,
        message: String,
    },
    #[error("Reference frame '{name}' unavailable: {reason}")]
    UnsupportedReferenceFrame { name: String, reason: String },
}

/// A global-state astronomical engine.
///
/// `set_sidereal_mode` mutates process-wide state in real engines, which is
/// why implementations are only ever reached through [`EphemerisAdapter`].
pub trait EphemerisBackend: Send {
    /// Engine constant for a sidereal-mode name, if this engine build has it.
    fn sidereal_mode(&self, constant: &str) -> Option<i32>;

    fn set_sidereal_mode(&mut self, mode: i32);

    /// Tropical ecliptic longitude in degrees.
    fn tropical_longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64, EphemerisError>;

    /// Offset of the active sidereal mode at `instant`, in degrees.
    fn reference_offset(&self, instant: DateTime<Utc>) -> Result<f64, EphemerisError>;

    /// Tropical ascendant in degrees.
    fn tropical_ascendant(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
        system: HouseSystem,
    ) -> Result<f64, EphemerisError>;
}

/// Serializes every unit of work against one engine.
pub struct EphemerisAdapter {
    engine: Mutex<Box<dyn EphemerisBackend>>,
}

impl EphemerisAdapter {
    pub fn new(backend: impl EphemerisBackend + 'static) -> Self {
        Self {
            engine: Mutex::new(Box::new(backend)),
        }
    }

    /// Acquire the engine and select `frame`.
    ///
    /// If no candidate constant resolves, a warning is logged and the session
    /// proceeds in whatever frame is currently active. Check
    /// [`EphemerisSession::frame`] to find out which happened.
    pub fn session(&self, frame: &ReferenceFrame) -> EphemerisSession<'_> {
        self.open(frame, log::Level::Warn)
    }

    /// Same as [`session`](Self::session) but reports a frame fallback at
    /// debug level. For per-instant loops that already warned once.
    pub fn quiet_session(&self, frame: &ReferenceFrame) -> EphemerisSession<'_> {
        self.open(frame, log::Level::Debug)
    }

    fn open(&self, frame: &ReferenceFrame, fallback_level: log::Level) -> EphemerisSession<'_> {
        let mut engine = self.lock();
        let selection = select_frame(engine.as_mut(), frame);
        if let FrameSelection::Unresolved { frame, reason } = &selection {
            log::log!(
                fallback_level,
                "Could not set reference frame '{}' ({}); using the engine's active frame",
                frame,
                reason
            );
        }
        EphemerisSession { engine, selection }
    }

    /// Like [`session`](Self::session), but an unresolved frame is an error.
    pub fn strict_session(&self, frame: &ReferenceFrame) -> Result<EphemerisSession<'_>, EphemerisError> {
        let mut engine = self.lock();
        match select_frame(engine.as_mut(), frame) {
            FrameSelection::Unresolved { frame, reason } => {
                Err(EphemerisError::UnsupportedReferenceFrame { name: frame, reason })
            }
            selection => Ok(EphemerisSession { engine, selection }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn EphemerisBackend>> {
        // A panic mid-query leaves nothing half-written in the engine.
        self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn select_frame(engine: &mut dyn EphemerisBackend, frame: &ReferenceFrame) -> FrameSelection {
    if frame.candidates.is_empty() {
        return FrameSelection::Unresolved {
            frame: frame.name.clone(),
            reason: format!("Unknown reference frame: {}", frame.name),
        };
    }
    for candidate in &frame.candidates {
        if let Some(mode) = engine.sidereal_mode(candidate) {
            engine.set_sidereal_mode(mode);
            return FrameSelection::Selected {
                frame: frame.name.clone(),
                constant: candidate.clone(),
            };
        }
    }
    FrameSelection::Unresolved {
        frame: frame.name.clone(),
        reason: format!("No engine constant available for '{}'", frame.name),
    }
}

/// Exclusive access to the engine with a frame selected.
///
/// The lock is held until the session is dropped. The selected frame is left
/// in place afterwards; the next session selects its own.
pub struct EphemerisSession<'a> {
    engine: MutexGuard<'a, Box<dyn EphemerisBackend>>,
    selection: FrameSelection,
}

impl<'a> EphemerisSession<'a> {
    pub fn frame(&self) -> &FrameSelection {
        &self.selection
    }

    /// Sidereal longitude in [0, 360).
    pub fn position(&self, instant: DateTime<Utc>, body: Body) -> Result<f64, EphemerisError> {
        if body == Body::Ketu {
            let rahu = self.position(instant, Body::Rahu)?;
            return Ok(wrap360(rahu + 180.0));
        }
        let tropical = self.engine.tropical_longitude(instant, body)?;
        let offset = self.engine.reference_offset(instant)?;
        Ok(wrap360(tropical - offset))
    }

    /// Sidereal Placidus ascendant in [0, 360).
    pub fn ascendant(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, EphemerisError> {
        let tropical = self
            .engine
            .tropical_ascendant(instant, location, HouseSystem::Placidus)?;
        let offset = self.engine.reference_offset(instant)?;
        Ok(wrap360(tropical - offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedEngine {
        mode: Option<i32>,
    }

    impl EphemerisBackend for FixedEngine {
        fn sidereal_mode(&self, constant: &str) -> Option<i32> {
            match constant {
                "SIDM_KRISHNAMURTI" => Some(5),
                "SIDM_LAHIRI" => Some(1),
                _ => None,
            }
        }

        fn set_sidereal_mode(&mut self, mode: i32) {
            self.mode = Some(mode);
        }

        fn tropical_longitude(&self, _: DateTime<Utc>, body: Body) -> Result<f64, EphemerisError> {
            match body {
                Body::Rahu => Ok(10.0),
                Body::Sun => Ok(5.0),
                other => Err(EphemerisError::UnsupportedBody { body: other }),
            }
        }

        fn reference_offset(&self, _: DateTime<Utc>) -> Result<f64, EphemerisError> {
            Ok(self.mode.map(|m| m as f64 * 4.0).unwrap_or(0.0))
        }

        fn tropical_ascendant(&self, _: DateTime<Utc>, _: GeoLocation, _: HouseSystem) -> Result<f64, EphemerisError> {
            Ok(100.0)
        }
    }

    fn frame(name: &str, candidates: &[&str]) -> ReferenceFrame {
        ReferenceFrame {
            name: name.to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_available_candidate_wins() {
        let adapter = EphemerisAdapter::new(FixedEngine { mode: None });
        let session = adapter.session(&frame("KP_old", &["SIDM_KP_OLD", "SIDM_KRISHNAMURTI", "SIDM_LAHIRI"]));
        assert_eq!(
            session.frame(),
            &FrameSelection::Selected {
                frame: "KP_old".to_string(),
                constant: "SIDM_KRISHNAMURTI".to_string()
            }
        );
        // offset 20, tropical 5 -> 345
        assert!((session.position(noon(), Body::Sun).unwrap() - 345.0).abs() < 1e-9);
    }

    #[test]
    fn test_unresolved_frame_keeps_previous_mode() {
        let adapter = EphemerisAdapter::new(FixedEngine { mode: None });
        drop(adapter.session(&frame("Lahiri", &["SIDM_LAHIRI"])));

        let session = adapter.session(&frame("Tropical", &["SIDM_TROPICAL"]));
        assert!(!session.frame().is_selected());
        // Lahiri (offset 4) is still active.
        assert!((session.position(noon(), Body::Sun).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_strict_session_rejects_unknown_frame() {
        let adapter = EphemerisAdapter::new(FixedEngine { mode: None });
        let result = adapter.strict_session(&frame("Nope", &[]));
        assert!(matches!(
            result,
            Err(EphemerisError::UnsupportedReferenceFrame { .. })
        ));
    }

    #[test]
    fn test_ketu_is_opposite_rahu() {
        let adapter = EphemerisAdapter::new(FixedEngine { mode: None });
        let session = adapter.session(&frame("Lahiri", &["SIDM_LAHIRI"]));
        let rahu = session.position(noon(), Body::Rahu).unwrap();
        let ketu = session.position(noon(), Body::Ketu).unwrap();
        assert!((wrap360(ketu - rahu) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_engine_failure_surfaces() {
        let adapter = EphemerisAdapter::new(FixedEngine { mode: None });
        let session = adapter.session(&frame("Lahiri", &["SIDM_LAHIRI"]));
        assert!(session.position(noon(), Body::Neptune).is_err());
    }
}
