use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tenace_engine::config::InteractiveConfig;
use tenace_engine::driver::DriverError;
use tenace_engine::fallback::{InteractiveFallbackController, Operator, SnapshotCapture};
use tokio::time::Instant;

#[derive(Default)]
struct OperatorLog {
    notices: Mutex<Vec<(String, String)>>,
    resumes: AtomicU32,
}

struct ScriptedOperator {
    log: Arc<OperatorLog>,
    resume_fails: bool,
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn notify(&self, task: &str, error: &str) {
        self.log
            .notices
            .lock()
            .unwrap()
            .push((task.to_string(), error.to_string()));
    }

    async fn wait_for_resume(&self) -> std::io::Result<()> {
        self.log.resumes.fetch_add(1, Ordering::SeqCst);
        if self.resume_fails {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "operator went away",
            ));
        }
        Ok(())
    }
}

struct RecordingSnapshots {
    labels: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

#[async_trait]
impl SnapshotCapture for RecordingSnapshots {
    async fn capture(&self, label: &str) -> Result<PathBuf, DriverError> {
        self.labels.lock().unwrap().push(label.to_string());
        if self.fail {
            return Err(DriverError::NotSupported("snapshot".into()));
        }
        Ok(PathBuf::from(format!("/tmp/{}.png", label)))
    }
}

fn config(enabled: bool) -> InteractiveConfig {
    InteractiveConfig {
        enabled,
        retry_step_ms: 1000,
        ..InteractiveConfig::default()
    }
}

fn controller(enabled: bool, resume_fails: bool) -> (InteractiveFallbackController, Arc<OperatorLog>) {
    let log = Arc::new(OperatorLog::default());
    let operator = ScriptedOperator {
        log: log.clone(),
        resume_fails,
    };
    (
        InteractiveFallbackController::new(&config(enabled), Box::new(operator)),
        log,
    )
}

#[tokio::test(start_paused = true)]
async fn test_unattended_returns_last_error_after_attempts() {
    let (controller, log) = controller(false, false);
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<(), String> = controller
        .execute_with_interactive_support(
            "select company",
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("attempt {} failed", n))
                }
            },
            3,
        )
        .await;

    assert_eq!(result, Err("attempt 3 failed".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(log.notices.lock().unwrap().is_empty());
    assert_eq!(log.resumes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_attended_makes_one_more_attempt_after_resume() {
    let (controller, log) = controller(true, false);
    let labels = Arc::new(Mutex::new(Vec::new()));
    let controller = controller.with_snapshots(Box::new(RecordingSnapshots {
        labels: labels.clone(),
        fail: false,
    }));
    let calls = Arc::new(AtomicU32::new(0));

    let result = controller
        .execute_with_interactive_support(
            "solve captcha",
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n <= 2 { Err("captcha shown".to_string()) } else { Ok(n) }
                }
            },
            2,
        )
        .await;

    assert_eq!(result, Ok(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *log.notices.lock().unwrap(),
        vec![("solve captcha".to_string(), "captcha shown".to_string())]
    );
    assert_eq!(log.resumes.load(Ordering::SeqCst), 1);
    assert_eq!(*labels.lock().unwrap(), vec!["solve captcha".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_attended_failure_after_resume_is_returned() {
    let (controller, log) = controller(true, false);
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<(), String> = controller
        .execute_with_interactive_support(
            "upload",
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("failure {}", n))
                }
            },
            2,
        )
        .await;

    // Two automated attempts plus exactly one after the operator resumed.
    assert_eq!(result, Err("failure 3".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(log.resumes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_error_returns_last_automated_error() {
    let (controller, log) = controller(true, true);
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<(), String> = controller
        .execute_with_interactive_support(
            "sign",
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("failure {}", n))
                }
            },
            1,
        )
        .await;

    assert_eq!(result, Err("failure 1".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.notices.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_failure_does_not_block_resume() {
    let (controller, _log) = controller(true, false);
    let controller = controller.with_snapshots(Box::new(RecordingSnapshots {
        labels: Arc::new(Mutex::new(Vec::new())),
        fail: true,
    }));
    let calls = Arc::new(AtomicU32::new(0));

    let result = controller
        .execute_with_interactive_support(
            "pay fee",
            || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("gateway timeout".to_string())
                    } else {
                        Ok("paid")
                    }
                }
            },
            1,
        )
        .await;

    assert_eq!(result, Ok("paid"));
}

#[tokio::test(start_paused = true)]
async fn test_retry_delays_grow_linearly() {
    let (controller, _log) = controller(false, false);
    let stamps = Arc::new(Mutex::new(Vec::new()));

    let _: Result<(), String> = controller
        .execute_with_interactive_support(
            "search",
            || {
                let stamps = stamps.clone();
                async move {
                    stamps.lock().unwrap().push(Instant::now());
                    Err("not yet".to_string())
                }
            },
            4,
        )
        .await;

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 4);
    for i in 0..3 {
        let waited = stamps[i + 1] - stamps[i];
        assert!(waited >= Duration::from_secs(i as u64 + 1), "wait {} was {:?}", i, waited);
    }
}

#[tokio::test]
async fn test_zero_retries_still_attempts_once() {
    let controller = InteractiveFallbackController::unattended();
    assert!(!controller.is_interactive());

    let calls = Arc::new(AtomicU32::new(0));
    let result = controller
        .execute_with_interactive_support(
            "noop",
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                }
            },
            0,
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_execute_uses_configured_attempts() {
    let config = InteractiveConfig {
        attempts: 2,
        ..InteractiveConfig::default()
    };
    let log = Arc::new(OperatorLog::default());
    let controller = InteractiveFallbackController::new(
        &config,
        Box::new(ScriptedOperator {
            log,
            resume_fails: false,
        }),
    );
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<(), String> = controller
        .execute("download receipt", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("not ready".to_string())
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
