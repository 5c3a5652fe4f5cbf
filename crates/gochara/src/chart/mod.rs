pub mod data;
pub mod natal;

pub use data::{Chart, ChartKind, Placement, SiderealPosition, MOMENT_BODIES, NATAL_BODIES};
pub use natal::{ApoklimaLord, D9Dispositor, LordRole, NatalFeatures, PanapharaPlanet};
