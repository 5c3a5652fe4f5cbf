//! Sidereal transit events and muhurtha timing.
//!
//! Layers, bottom up: [`ephemeris`] (engine access under one lock),
//! [`vedic`] and [`chart`] (signs, nakshatras, derived natal sets),
//! [`search`] (interval discovery), then [`transit`] and [`muhurtha`].

pub mod chart;
pub mod ephemeris;
pub mod error;
pub mod location;
pub mod muhurtha;
pub mod search;
pub mod transit;
pub mod vedic;

pub use chart::{Chart, ChartKind, NatalFeatures, Placement, SiderealPosition};
pub use ephemeris::{
    Body, EphemerisAdapter, EphemerisBackend, EphemerisError, EphemerisSession, FrameCatalog,
    FrameSelection, GeoLocation, ReferenceFrame, DEFAULT_FRAME,
};
pub use error::{GocharaError, Result};
pub use location::{
    local_instant, parse_date, parse_local_datetime, parse_utc_offset, LocationResolver,
    ResolvedPlace, StaticLocationResolver,
};
pub use muhurtha::{
    evaluate_moment, scan_day, scan_month, ActivityPreset, DayScan, DayScanRequest, Grade,
    MonthScan, MonthScanRequest, MuhurthaMoment, MuhurthaWindow, WindowRow,
};
pub use search::{find_intervals, find_true_intervals, Interval, ScanControl, ScanSteps, ScanWindow};
pub use transit::{
    BirthMoment, Category, Event, EventRow, RuleId, RuleSet, TransitEngine, TransitReport,
    TransitSettings,
};
pub use vedic::{Nakshatra, Sign};
