use crate::resolution::{ActionKind, Locator};
use async_trait::async_trait;
use std::time::Duration;

/// Opaque reference to an element held by the driver.
///
/// Handles are only meaningful to the driver that produced them and may go
/// stale when the page re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u32);

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Page readiness milestones used by the layered navigation wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Document structure parsed.
    DomContentLoaded,
    /// No outstanding network activity for a short quiet window.
    NetworkIdle,
}

/// Error codes aligned with the codes returned by injected driver scripts.
#[derive(thiserror::Error, Debug, Clone)]
pub enum DriverError {
    // ============================================================
    // Element Errors
    // ============================================================
    #[error("Element {handle} not found")]
    ElementNotFound { handle: ElementHandle },

    #[error("Element {handle} is stale (removed from DOM)")]
    ElementStale { handle: ElementHandle },

    #[error("Element {handle} is not visible")]
    ElementNotVisible { handle: ElementHandle },

    #[error("Element {handle} is disabled")]
    ElementDisabled { handle: ElementHandle },

    #[error("Element {handle} is not interactable: {reason}")]
    ElementNotInteractable {
        handle: ElementHandle,
        reason: String,
    },

    #[error("Option not found: {value}")]
    OptionNotFound { value: String },

    #[error("Invalid selector: {selector}")]
    SelectorInvalid { selector: String },

    // ============================================================
    // Execution Errors
    // ============================================================
    #[error("Script execution error: {0}")]
    Script(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    // ============================================================
    // System Errors
    // ============================================================
    #[error("Not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Serialization(err.to_string())
    }
}

/// The interface every rendering-engine binding implements.
///
/// The resolution engine only ever talks to the page through this trait, so
/// strategies, retries and fallbacks stay independent of the browser
/// protocol in use.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Find every element currently matching the locator, in document order.
    async fn query(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError>;

    /// Whether the element can receive the given kind of action right now
    /// (attached, visible, enabled, not covered, editable when required).
    async fn is_actionable(
        &mut self,
        element: ElementHandle,
        kind: ActionKind,
    ) -> Result<bool, DriverError>;

    async fn click(&mut self, element: ElementHandle) -> Result<(), DriverError>;

    async fn fill(&mut self, element: ElementHandle, value: &str) -> Result<(), DriverError>;

    async fn clear(&mut self, element: ElementHandle) -> Result<(), DriverError>;

    /// Select an option by value, falling back to its visible label.
    async fn select_option(&mut self, element: ElementHandle, value: &str)
    -> Result<(), DriverError>;

    /// Put a checkbox or radio into the checked state. No-op if already checked.
    async fn check(&mut self, element: ElementHandle) -> Result<(), DriverError>;

    async fn scroll_into_view(&mut self, element: ElementHandle) -> Result<(), DriverError>;

    /// Wait until the page reaches `state`, failing with `Timeout` after `timeout`.
    async fn wait_for_load_state(
        &mut self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Capture a screenshot of the current viewport as PNG bytes.
    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        Err(DriverError::NotSupported("screenshot".into()))
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Err(DriverError::NotSupported("current_url".into()))
    }
}
