use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Step {0} is declared more than once")]
    DuplicateStep(u32),
}

/// One declared unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// A failed required step fails the run.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Whether the step may be re-run after an error.
    #[serde(default = "default_true")]
    pub retryable: bool,
}

fn default_true() -> bool {
    true
}

impl StepDefinition {
    pub fn new(number: u32, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            description: description.into(),
            required: true,
            retryable: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn not_retryable(mut self) -> Self {
        self.retryable = false;
        self
    }
}

/// Ordered, immutable list of declared steps. Cloning shares the same list.
#[derive(Debug, Clone)]
pub struct StepCatalog {
    steps: Arc<[StepDefinition]>,
}

impl StepCatalog {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.number) {
                return Err(CatalogError::DuplicateStep(step.number));
            }
        }
        Ok(Self {
            steps: steps.into(),
        })
    }

    pub fn get(&self, number: u32) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.number == number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
