pub mod nakshatra;
pub mod signs;
pub mod vargas;

pub use nakshatra::{Nakshatra, NAKSHATRA_SEGMENT_SIZE};
pub use signs::{
    dms_short, house_from_lagna, house_lord, house_signs, in_any_window, wrap360, DegreeWindow,
    Sign, APOKLIMA_HOUSES, APOKLIMA_WINDOWS, PANAPHARA_HOUSES, PANAPHARA_WINDOWS,
};
pub use vargas::navamsa_sign;
