//! Error Code Mapping
//!
//! Maps the error codes returned by injected driver scripts onto `DriverError`
//! variants, and provides the recovery hints attached to failed resolutions
//! (see `ResolutionError::hints`) and recorded on the failing step.

use crate::driver::{DriverError, ElementHandle};
use serde_json::Value;

/// Maps a script error code and message to a `DriverError`.
///
/// # Arguments
/// * `code` - The error code string (e.g., "ELEMENT_NOT_FOUND")
/// * `message` - The human-readable error message
/// * `details` - Optional additional details as JSON value
pub fn map_driver_error(code: &str, message: &str, details: Option<&Value>) -> DriverError {
    match code {
        "ELEMENT_NOT_FOUND" => DriverError::ElementNotFound {
            handle: extract_handle(details),
        },
        "ELEMENT_STALE" => DriverError::ElementStale {
            handle: extract_handle(details),
        },
        "ELEMENT_NOT_VISIBLE" => DriverError::ElementNotVisible {
            handle: extract_handle(details),
        },
        "ELEMENT_DISABLED" => DriverError::ElementDisabled {
            handle: extract_handle(details),
        },
        "ELEMENT_NOT_INTERACTABLE" => DriverError::ElementNotInteractable {
            handle: extract_handle(details),
            reason: message.to_string(),
        },
        "OPTION_NOT_FOUND" => DriverError::OptionNotFound {
            value: detail_str(details, "value"),
        },
        "SELECTOR_INVALID" => DriverError::SelectorInvalid {
            selector: detail_str(details, "selector"),
        },
        "SCRIPT_ERROR" => DriverError::Script(message.to_string()),
        "TIMEOUT" => DriverError::Timeout {
            operation: message.to_string(),
        },
        "NAVIGATION_ERROR" => DriverError::Navigation(message.to_string()),
        "INTERNAL_ERROR" => DriverError::Other(message.to_string()),
        _ => DriverError::Other(format!("[{}] {}", code, message)),
    }
}

/// Returns a recovery hint for the given error code.
pub fn hint_for_code(code: &str) -> Option<&'static str> {
    match code {
        "ELEMENT_NOT_FOUND" | "ELEMENT_STALE" => {
            Some("The page may have re-rendered; add a strategy that does not depend on ids")
        }
        "ELEMENT_NOT_VISIBLE" => Some("Scroll element into view or wait until visible"),
        "ELEMENT_DISABLED" => Some("Wait for element to become enabled"),
        "ELEMENT_NOT_INTERACTABLE" => Some("Element may be covered; dismiss overlays first"),
        "TIMEOUT" => Some("Increase timeout or verify condition"),
        "OPTION_NOT_FOUND" => Some("Check available options in select element"),
        "SELECTOR_INVALID" => Some("Verify CSS/XPath selector syntax"),
        "NAVIGATION_ERROR" => Some("Check URL is valid and accessible"),
        _ => None,
    }
}

impl DriverError {
    /// The script-level error code this variant corresponds to.
    pub fn code(&self) -> &'static str {
        match self {
            DriverError::ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            DriverError::ElementStale { .. } => "ELEMENT_STALE",
            DriverError::ElementNotVisible { .. } => "ELEMENT_NOT_VISIBLE",
            DriverError::ElementDisabled { .. } => "ELEMENT_DISABLED",
            DriverError::ElementNotInteractable { .. } => "ELEMENT_NOT_INTERACTABLE",
            DriverError::OptionNotFound { .. } => "OPTION_NOT_FOUND",
            DriverError::SelectorInvalid { .. } => "SELECTOR_INVALID",
            DriverError::Script(_) => "SCRIPT_ERROR",
            DriverError::Timeout { .. } => "TIMEOUT",
            DriverError::Navigation(_) => "NAVIGATION_ERROR",
            DriverError::NotReady => "NOT_READY",
            DriverError::Io(_) => "IO_ERROR",
            DriverError::Serialization(_) => "SERIALIZATION_ERROR",
            DriverError::NotSupported(_) => "NOT_SUPPORTED",
            DriverError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        hint_for_code(self.code()).unwrap_or("Inspect the page state manually")
    }
}

fn extract_handle(details: Option<&Value>) -> ElementHandle {
    ElementHandle(
        details
            .and_then(|d| d.get("id"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32,
    )
}

fn detail_str(details: Option<&Value>, key: &str) -> String {
    details
        .and_then(|d| d.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_element_not_found() {
        let details = json!({"id": 42});
        let err = map_driver_error("ELEMENT_NOT_FOUND", "Element 42 not found", Some(&details));
        assert!(matches!(
            err,
            DriverError::ElementNotFound {
                handle: ElementHandle(42)
            }
        ));
        assert_eq!(err.code(), "ELEMENT_NOT_FOUND");
    }

    #[test]
    fn test_map_element_not_interactable() {
        let details = json!({"id": 3});
        let err = map_driver_error(
            "ELEMENT_NOT_INTERACTABLE",
            "Element is covered",
            Some(&details),
        );
        match err {
            DriverError::ElementNotInteractable { handle, reason } => {
                assert_eq!(handle, ElementHandle(3));
                assert_eq!(reason, "Element is covered");
            }
            _ => panic!("Expected ElementNotInteractable"),
        }
    }

    #[test]
    fn test_map_option_not_found() {
        let details = json!({"value": "Sociedad Anonima"});
        let err = map_driver_error("OPTION_NOT_FOUND", "Option not found", Some(&details));
        match err {
            DriverError::OptionNotFound { value } => assert_eq!(value, "Sociedad Anonima"),
            _ => panic!("Expected OptionNotFound"),
        }
    }

    #[test]
    fn test_map_timeout() {
        let err = map_driver_error("TIMEOUT", "networkidle", None);
        match &err {
            DriverError::Timeout { operation } => assert_eq!(operation, "networkidle"),
            _ => panic!("Expected Timeout"),
        }
        assert_eq!(err.code(), "TIMEOUT");
    }

    #[test]
    fn test_map_unknown_code_fallback() {
        let err = map_driver_error("SOME_NEW_CODE", "Something happened", None);
        match err {
            DriverError::Other(msg) => {
                assert!(msg.contains("SOME_NEW_CODE"));
                assert!(msg.contains("Something happened"));
            }
            _ => panic!("Expected Other"),
        }
    }

    #[test]
    fn test_recovery_hints() {
        let err = DriverError::ElementNotVisible {
            handle: ElementHandle(1),
        };
        assert!(err.recovery_hint().contains("Scroll"));

        let err = DriverError::NotReady;
        assert_eq!(err.recovery_hint(), "Inspect the page state manually");

        assert_eq!(hint_for_code("UNKNOWN_CODE"), None);
    }
}
