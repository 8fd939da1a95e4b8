pub mod catalog;
pub mod summary;
pub mod tracker;

pub use catalog::{CatalogError, StepCatalog, StepDefinition};
pub use summary::format_summary;
pub use tracker::{Progress, ProgressTracker, StepRecord, StepStatus};
