pub mod config;
pub mod driver;
pub mod error_mapping;
pub mod fallback;
pub mod progress;
pub mod resolution;
pub mod retry;
pub mod similarity;

pub use driver::{Driver, DriverError, ElementHandle, LoadState};
pub use fallback::{ConsoleOperator, InteractiveFallbackController, Operator, SnapshotCapture};
pub use progress::{ProgressTracker, StepCatalog, StepDefinition, StepStatus};
pub use resolution::{
    Action, ActionKind, ActionOutcome, ActionRequest, Locator, Strategy, StrategyResolver,
    TargetHints,
};
pub use retry::{RetryPolicy, TaskExecutor, execute_critical, execute_with_retries};
pub use similarity::{SimilarMatch, SimilarityMatcher};
