pub mod adapter;
pub mod swiss;
pub mod types;

pub use adapter::{EphemerisAdapter, EphemerisBackend, EphemerisError, EphemerisSession};
pub use swiss::SwissEphemeris;
pub use types::{
    Body, FrameCatalog, FrameSelection, GeoLocation, HouseSystem, ReferenceFrame, DEFAULT_FRAME,
};
