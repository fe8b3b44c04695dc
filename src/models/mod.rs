//! Domain models for the harvest ledger.
//!
//! - [`HarvestRecord`]: one harvest event with its loss figures frozen at
//!   registration time. Records are never edited; they are only removed whole.
//! - [`NewHarvest`]: the validated scalars a registration starts from.
//! - [`HarvestMethod`]: how the cane was cut, which selects the loss rate.
//! - [`LossSummary`]: totals across a ledger.
//! - [`RowIdentifier`]: the short form of a stored row used to pick deletion targets.

mod harvest;
mod summary;

pub use harvest::*;
pub use summary::*;
