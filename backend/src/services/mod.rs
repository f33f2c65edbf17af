//! Business logic services for the Harvest Rescue Engine

pub mod assay;
pub mod logistics;
pub mod rescue;

pub use assay::{AssayService, ScanInput};
pub use logistics::{LogisticsService, PickupCycleReport};
pub use rescue::{log_rescue_events, RescueEvent, RescueService};
