pub mod fleet;
pub mod merge;
pub mod models;
pub mod period;
pub mod today;

pub use fleet::FleetAggregator;
pub use merge::{merge_field, Roster, SiteField};
pub use models::{FleetSnapshot, GenerationCurve, SitePeriodRecord, SiteRecord, UNMONITORED_SITE};
pub use period::{PeriodAssembler, Resolution};
pub use today::todays_generation;
