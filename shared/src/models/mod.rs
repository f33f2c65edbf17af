//! Domain models and the pure operations over them

mod assay;
mod carbon;
mod classifier;
mod crop;
mod listing;
mod milk_run;
mod pricing;
mod rescue;

pub use assay::*;
pub use carbon::*;
pub use classifier::*;
pub use crop::*;
pub use listing::*;
pub use milk_run::*;
pub use pricing::*;
pub use rescue::*;
