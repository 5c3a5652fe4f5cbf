pub mod control;
pub mod intervals;

pub use control::ScanControl;
pub use intervals::{
    find_intervals, find_true_intervals, Discovery, Interval, ScanSteps, ScanWindow,
};
