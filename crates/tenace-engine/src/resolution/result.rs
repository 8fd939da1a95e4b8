use crate::driver::DriverError;
use crate::error_mapping::hint_for_code;
use thiserror::Error;

/// What happened when one strategy was tried.
#[derive(Debug, Clone)]
pub enum AttemptResult {
    /// The strategy located nothing.
    NoMatch,
    /// The driver could not evaluate the locator (bad selector, page gone).
    LookupFailed(DriverError),
    /// Candidates existed but the first never became actionable in time.
    NotActionable { candidates: usize },
    /// The target was actionable but the action itself failed.
    ActionFailed(DriverError),
    /// The action was performed.
    Acted,
}

impl AttemptResult {
    pub fn is_acted(&self) -> bool {
        matches!(self, AttemptResult::Acted)
    }

    /// What an operator could do about this failure, if anything.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            AttemptResult::LookupFailed(e) | AttemptResult::ActionFailed(e) => {
                Some(e.recovery_hint())
            }
            AttemptResult::NotActionable { .. } => hint_for_code("ELEMENT_NOT_INTERACTABLE"),
            AttemptResult::NoMatch | AttemptResult::Acted => None,
        }
    }
}

impl std::fmt::Display for AttemptResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptResult::NoMatch => write!(f, "no match"),
            AttemptResult::LookupFailed(e) => write!(f, "lookup failed: {}", e),
            AttemptResult::NotActionable { candidates } => {
                write!(f, "not actionable ({} candidates)", candidates)
            }
            AttemptResult::ActionFailed(e) => write!(f, "action failed: {}", e),
            AttemptResult::Acted => write!(f, "acted"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub result: AttemptResult,
}

#[derive(Debug, Clone, Error)]
#[error("Resolution failed for target '{target}': {reason}")]
pub struct ResolutionError {
    pub target: String,
    pub reason: String,
    pub attempted: Vec<String>, // Strategies tried
    /// Distinct recovery hints from the failed attempts, in attempt order.
    pub hints: Vec<&'static str>,
}

impl ResolutionError {
    /// The error message followed by its recovery hints, as recorded
    /// against a failed step.
    pub fn diagnostic(&self) -> String {
        if self.hints.is_empty() {
            return self.to_string();
        }
        format!("{} (hint: {})", self, self.hints.join("; "))
    }
}

/// Result of one action request. Construct through [`ActionOutcome::succeeded`]
/// or [`ActionOutcome::exhausted`]; a successful outcome always names its
/// winning strategy.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    success: bool,
    strategy: Option<String>,
    error: Option<ResolutionError>,
    attempts: Vec<StrategyAttempt>,
}

impl ActionOutcome {
    pub fn succeeded(strategy: impl Into<String>, attempts: Vec<StrategyAttempt>) -> Self {
        let mut strategy = strategy.into();
        if strategy.is_empty() {
            strategy = format!("strategy#{}", attempts.len().saturating_sub(1));
        }
        Self {
            success: true,
            strategy: Some(strategy),
            error: None,
            attempts,
        }
    }

    pub fn exhausted(error: ResolutionError, attempts: Vec<StrategyAttempt>) -> Self {
        Self {
            success: false,
            strategy: None,
            error: Some(error),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Name of the winning strategy.
    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    pub fn error(&self) -> Option<&ResolutionError> {
        self.error.as_ref()
    }

    pub fn attempts(&self) -> &[StrategyAttempt] {
        &self.attempts
    }
}
