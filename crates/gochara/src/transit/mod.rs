//! Transit rule engine: natal-relative event detection.

pub mod condition;
pub mod engine;
pub mod event;
pub mod rule;
pub mod rules;

pub use condition::{Condition, EventPlacement, HouseRef, RuleInstance, SignRef};
pub use engine::{BirthMoment, EventScan, MissingDependency, TransitEngine, TransitReport, TransitSettings};
pub use event::{Event, EventRow};
pub use rule::{Category, RuleId, RuleSet};
pub use rules::{instantiate, loss_6_exceptions, Expansion, RuleOptions};
