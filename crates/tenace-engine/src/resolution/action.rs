use super::strategy::Strategy;

/// What to do with the target once a strategy has located it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click,
    /// Type `value` into the target, optionally clearing it first.
    Fill { value: String, clear: bool },
    /// Choose the option whose value or label is `value`.
    Select(String),
    Check,
}

/// Action discriminant, used where the payload does not matter
/// (actionability checks, logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Click,
    Fill,
    Select,
    Check,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Click => ActionKind::Click,
            Action::Fill { .. } => ActionKind::Fill,
            Action::Select(_) => ActionKind::Select,
            Action::Check => ActionKind::Check,
        }
    }

    pub fn fill(value: impl Into<String>) -> Self {
        Action::Fill {
            value: value.into(),
            clear: false,
        }
    }

    pub fn fill_cleared(value: impl Into<String>) -> Self {
        Action::Fill {
            value: value.into(),
            clear: true,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::Select => "select",
            ActionKind::Check => "check",
        };
        f.write_str(name)
    }
}

/// One logical interaction together with the strategies that may satisfy it.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: Action,
    pub strategies: Vec<Strategy>,
    /// Catalog step this interaction belongs to, if tracked.
    pub step: Option<u32>,
}

impl ActionRequest {
    pub fn new(action: Action, strategies: Vec<Strategy>) -> Self {
        Self {
            action,
            strategies,
            step: None,
        }
    }

    pub fn click(strategies: Vec<Strategy>) -> Self {
        Self::new(Action::Click, strategies)
    }

    pub fn fill(strategies: Vec<Strategy>, value: impl Into<String>) -> Self {
        Self::new(Action::fill(value), strategies)
    }

    pub fn select(strategies: Vec<Strategy>, value: impl Into<String>) -> Self {
        Self::new(Action::Select(value.into()), strategies)
    }

    pub fn check(strategies: Vec<Strategy>) -> Self {
        Self::new(Action::Check, strategies)
    }

    pub fn for_step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    /// Short description of the request for logs and error payloads.
    pub fn describe(&self) -> String {
        match &self.action {
            Action::Select(value) => format!("select {:?}", value),
            Action::Fill { .. } => "fill".to_string(),
            other => other.kind().to_string(),
        }
    }
}
