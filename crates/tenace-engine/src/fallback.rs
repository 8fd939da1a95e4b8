//! Human-in-the-loop fallback for attended runs.
//!
//! A task gets a few automated attempts on a linear schedule. When they are
//! spent and the run is attended, the operator is shown the failing task and
//! its last error, a diagnostic snapshot is captured, and execution blocks
//! until the operator resumes; then exactly one more attempt is made.
//! Unattended runs never suspend: the last error is returned at once.

use crate::config::schema::InteractiveConfig;
use crate::driver::DriverError;
use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

/// The person supervising an attended run.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Tell the operator which task is stuck and why.
    async fn notify(&self, task: &str, error: &str);

    /// Block until the operator signals that automation may continue.
    async fn wait_for_resume(&self) -> std::io::Result<()>;
}

/// Collaborator that saves diagnostic state (usually a screenshot).
#[async_trait]
pub trait SnapshotCapture: Send + Sync {
    async fn capture(&self, label: &str) -> Result<PathBuf, DriverError>;
}

/// Operator on the controlling terminal: messages go to stderr and Enter on
/// stdin resumes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOperator;

#[async_trait]
impl Operator for ConsoleOperator {
    async fn notify(&self, task: &str, error: &str) {
        let message = format!(
            "\n⚠️  Manual intervention required\n   Task:  {}\n   Error: {}\n   Complete the step in the browser window.\n",
            task, error
        );
        let mut stderr = tokio::io::stderr();
        if let Err(e) = stderr.write_all(message.as_bytes()).await {
            warn!("Failed to write operator notice: {}", e);
        }
    }

    async fn wait_for_resume(&self) -> std::io::Result<()> {
        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(b"   Press Enter to resume automation... ")
            .await?;
        stderr.flush().await?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed before the operator resumed",
            ));
        }
        Ok(())
    }
}

pub struct InteractiveFallbackController {
    interactive: bool,
    attempts: u32,
    retry_step: Duration,
    operator: Box<dyn Operator>,
    snapshots: Option<Box<dyn SnapshotCapture>>,
}

impl InteractiveFallbackController {
    pub fn new(config: &InteractiveConfig, operator: Box<dyn Operator>) -> Self {
        Self {
            interactive: config.enabled,
            attempts: config.attempts,
            retry_step: config.retry_step(),
            operator,
            snapshots: None,
        }
    }

    /// Controller for unattended runs: it only ever retries and fails.
    pub fn unattended() -> Self {
        Self::new(&InteractiveConfig::default(), Box::new(ConsoleOperator))
    }

    pub fn with_snapshots(mut self, snapshots: Box<dyn SnapshotCapture>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// [`Self::execute_with_interactive_support`] with the configured
    /// attempt count.
    pub async fn execute<T, E, F, Fut>(&self, task: &str, operation: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_interactive_support(task, operation, self.attempts)
            .await
    }

    /// Run `operation` up to `retries` times, waiting `attempt × step`
    /// between attempts, then fall back to the operator if attended.
    pub async fn execute_with_interactive_support<T, E, F, Fut>(
        &self,
        task: &str,
        mut operation: F,
        retries: u32,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = retries.max(1);
        let mut attempt = 1;

        let last_error = loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= attempts {
                        break e;
                    }
                    let delay = self.retry_step.saturating_mul(attempt);
                    warn!(
                        "{}: attempt {}/{} failed: {}; retrying in {:?}",
                        task, attempt, attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        };

        if !self.interactive {
            error!(
                "{}: failed after {} attempts: {}",
                task, attempts, last_error
            );
            return Err(last_error);
        }

        warn!(
            "{}: automated attempts exhausted ({}); handing over to the operator",
            task, last_error
        );
        let message = last_error.to_string();
        self.operator.notify(task, &message).await;
        self.capture_snapshot(task).await;

        if let Err(e) = self.operator.wait_for_resume().await {
            error!("{}: operator did not resume ({}); giving up", task, e);
            return Err(last_error);
        }

        info!("{}: resuming after manual intervention", task);
        match operation().await {
            Ok(value) => {
                info!("{}: succeeded after manual intervention", task);
                Ok(value)
            }
            Err(e) => {
                error!(
                    "{}: still failing after manual intervention: {}",
                    task, e
                );
                Err(e)
            }
        }
    }

    async fn capture_snapshot(&self, task: &str) {
        let Some(snapshots) = &self.snapshots else {
            return;
        };
        match snapshots.capture(task).await {
            Ok(path) => info!("Diagnostic snapshot saved to {}", path.display()),
            Err(e) => warn!("Failed to capture diagnostic snapshot: {}", e),
        }
    }
}
