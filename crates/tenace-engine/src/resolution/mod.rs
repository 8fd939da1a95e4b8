pub mod action;
pub mod resolver;
pub mod result;
pub mod strategy;

pub use action::{Action, ActionKind, ActionRequest};
pub use resolver::StrategyResolver;
pub use result::{ActionOutcome, AttemptResult, ResolutionError, StrategyAttempt};
pub use strategy::{Locator, Strategy, TargetHints};
