use chromiumoxide::Page;
use serde_json::{Value, json};
use std::time::Duration;
use tenace_engine::DriverError;
use tenace_engine::error_mapping::map_driver_error;
use tenace_engine::resolution::Locator;

const BRIDGE_JS: &str = include_str!("bridge.js");

/// Default timeout for JavaScript evaluation (10 seconds).
/// A pending alert/confirm/prompt blocks the JS thread until it is handled.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

/// Delay between retries when context is not found (page navigating).
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(page: &Page, expression: &str) -> Result<Value, EvalError> {
    let eval_result = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => Ok(remote_object
            .into_value::<Value>()
            .unwrap_or(Value::Null)),
    }
}

/// Install the bridge script unless the current document already has it.
/// Navigation discards it, so every call re-checks.
async fn ensure_bridge(page: &Page) -> Result<(), EvalError> {
    let loaded = evaluate_with_timeout(page, "typeof window.__tenace !== 'undefined'").await?;
    if loaded.as_bool() != Some(true) {
        evaluate_with_timeout(page, BRIDGE_JS).await?;
    }
    Ok(())
}

/// Invoke a bridge method in the page and unwrap its `{ok, value}` envelope.
///
/// Script-level failures come back as their mapped `DriverError`; context
/// errors while the page is navigating are retried a bounded number of times.
pub async fn call(page: &Page, method: &str, params: Value) -> Result<Value, DriverError> {
    let expression = format!(
        "window.__tenace.call({}, {})",
        serde_json::to_string(method)?,
        serde_json::to_string(&params)?
    );
    tracing::trace!("Bridge call: {}", expression);

    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        let result = match ensure_bridge(page).await {
            Ok(()) => evaluate_with_timeout(page, &expression).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(envelope) => return unwrap_envelope(envelope),
            Err(EvalError::Timeout) => {
                return Err(DriverError::Timeout {
                    operation: format!(
                        "{} (possibly blocked by a dialog: alert/confirm/prompt)",
                        method
                    ),
                });
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during {} (attempt {}/{}), retrying...",
                    method,
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => {
                return Err(DriverError::Script(err_str));
            }
        }
    }

    Err(DriverError::Script(last_error.unwrap_or_else(|| {
        format!("{} failed after {} context retries", method, MAX_CONTEXT_RETRIES)
    })))
}

fn unwrap_envelope(envelope: Value) -> Result<Value, DriverError> {
    if envelope.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(envelope.get("value").cloned().unwrap_or(Value::Null));
    }
    let code = envelope
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("INTERNAL_ERROR");
    let message = envelope
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("bridge returned no result");
    Err(map_driver_error(code, message, envelope.get("details")))
}

/// Wire form of a locator as understood by the bridge script.
pub fn locator_params(locator: &Locator) -> Value {
    let (kind, value) = match locator {
        Locator::Id(v) => ("id", v),
        Locator::Name(v) => ("name", v),
        Locator::Text(v) => ("text", v),
        Locator::TextContains(v) => ("text_contains", v),
        Locator::Label(v) => ("label", v),
        Locator::TestId(v) => ("testid", v),
        Locator::Css(v) => ("css", v),
        Locator::XPath(v) => ("xpath", v),
        Locator::Role { role, name } => {
            return json!({ "kind": "role", "role": role, "name": name });
        }
    };
    json!({ "kind": kind, "value": value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_params() {
        assert_eq!(
            locator_params(&Locator::TestId("submit".into())),
            json!({ "kind": "testid", "value": "submit" })
        );
        assert_eq!(
            locator_params(&Locator::Role {
                role: "button".into(),
                name: None
            }),
            json!({ "kind": "role", "role": "button", "name": null })
        );
    }

    #[test]
    fn test_envelope_ok() {
        let value = unwrap_envelope(json!({ "ok": true, "value": [1, 2] })).unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn test_envelope_error_is_mapped() {
        let err = unwrap_envelope(json!({
            "ok": false,
            "code": "ELEMENT_STALE",
            "message": "gone",
            "details": { "id": 7 }
        }))
        .unwrap_err();
        assert!(matches!(err, DriverError::ElementStale { handle } if handle.0 == 7));
    }

    #[test]
    fn test_context_error_detection() {
        assert!(is_context_error("Execution context was destroyed"));
        assert!(!is_context_error("TypeError: x is undefined"));
    }
}
