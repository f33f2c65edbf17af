//! Harvest tiering, pricing and perishable-rescue logistics engine
//!
//! Pure computations shared by the backend service and the WASM client:
//! the crop catalog, the tier classifier, the pricing ladder, split-stream
//! listings, the rescue radar, milk-run bundling and carbon estimates.

pub mod catalog;
pub mod error;
pub mod models;
pub mod params;
pub mod types;
pub mod validation;

pub use catalog::*;
pub use error::*;
pub use models::*;
pub use params::*;
pub use types::*;
pub use validation::*;
