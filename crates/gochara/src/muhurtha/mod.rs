//! Muhurtha (auspicious timing) evaluation and scanning.

pub mod evaluator;
pub mod grade;
pub mod presets;
pub mod scanner;
pub mod window;

pub use evaluator::{evaluate_moment, shorter_arc, ArcCheck, ChartAssessment, KarakaCheck, LordCheck, MuhurthaMoment};
pub use grade::{grade, ArcQuality, Grade};
pub use presets::{ActivityPreset, CUSTOM_LABEL};
pub use scanner::{
    scan_day, scan_month, ActivityWindows, DayScan, DayScanRequest, MonthScan, MonthScanRequest,
    DEFAULT_MIN_RULES, DEFAULT_MIN_SCORE, DEFAULT_TOP_N, SCAN_STRIDE_MINUTES,
};
pub use window::{MuhurthaWindow, WindowRow};
