//! HTTP request handlers

pub mod assay;
pub mod carbon;
pub mod crops;
pub mod health;
pub mod logistics;
pub mod rescue;

pub use assay::{price_assay, scan_harvest, split_listings};
pub use carbon::carbon_footprint;
pub use crops::{get_crop, list_crops};
pub use health::health_check;
pub use logistics::{build_milk_run, enqueue_pickup, latest_cycle, run_cycle};
pub use rescue::{claim_rescue, evaluate, get_rescue, list_rescue};
