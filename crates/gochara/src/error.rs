use thiserror::Error;

use crate::ephemeris::EphemerisError;
use crate::ephemeris::types::Body;

/// Errors surfaced by transit and muhurtha operations.
///
/// Scan loops never return `EphemerisComputationFailure` for a single bad
/// sample; those are counted on the result instead. Only single-point
/// computations (natal chart, one muhurtha moment) propagate it.
#[derive(Error, Debug)]
pub enum GocharaError {
    #[error("Location not found: {place}")]
    LocationNotFound { place: String },
    #[error("Could not determine timezone for: {place}")]
    TimezoneUnresolved { place: String },
    #[error("Invalid date/time input '{input}': {reason}")]
    InvalidDateTimeInput { input: String, reason: String },
    #[error("Invalid scan steps: coarse {coarse_secs}s, refine {refine_secs}s")]
    InvalidScanSteps { coarse_secs: i64, refine_secs: i64 },
    #[error(transparent)]
    EphemerisComputationFailure(#[from] EphemerisError),
    #[error("{rule} needs {body}, which is not part of the tracked chart")]
    MissingChartDependency { rule: String, body: Body },
    #[error("Scan cancelled")]
    Cancelled,
    #[error("Scan exceeded its deadline")]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, GocharaError>;
