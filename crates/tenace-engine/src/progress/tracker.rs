use super::catalog::StepCatalog;
use crate::resolution::ActionOutcome;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    InProgress,
    Success,
    Error,
}

impl StepStatus {
    /// Allowed moves: pending → in_progress → {success, error}, and a
    /// finished step may re-enter in_progress when retried.
    pub fn can_transition_to(self, next: StepStatus) -> bool {
        use StepStatus::*;
        matches!(
            (self, next),
            (Pending | Success | Error, InProgress) | (InProgress, Success | Error)
        )
    }

    pub fn icon(self) -> &'static str {
        match self {
            StepStatus::Pending => "⏳",
            StepStatus::InProgress => "🔄",
            StepStatus::Success => "✅",
            StepStatus::Error => "❌",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Success => "success",
            StepStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct StepRecord {
    pub number: u32,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub status: StepStatus,
    pub started_at: Option<Instant>,
    pub ended_at: Option<Instant>,
    pub strategy: Option<String>,
    pub error: Option<String>,
    /// Times the step has entered in_progress.
    pub attempts: u32,
}

impl StepRecord {
    /// Description, or the step name when the catalog gave none.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.status = StepStatus::Pending;
        self.started_at = None;
        self.ended_at = None;
        self.strategy = None;
        self.error = None;
        self.attempts = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent.
    pub percentage: u32,
}

/// Status of every catalog step for one run.
///
/// The run controller owns the tracker and lends it out by `&mut`; undeclared
/// step numbers and disallowed transitions are logged and ignored.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    catalog: StepCatalog,
    records: Vec<StepRecord>,
    index: HashMap<u32, usize>,
}

impl ProgressTracker {
    pub fn new(catalog: StepCatalog) -> Self {
        let records: Vec<StepRecord> = catalog
            .iter()
            .map(|def| StepRecord {
                number: def.number,
                name: def.name.clone(),
                description: def.description.clone(),
                required: def.required,
                status: StepStatus::Pending,
                started_at: None,
                ended_at: None,
                strategy: None,
                error: None,
                attempts: 0,
            })
            .collect();
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.number, i))
            .collect();

        Self {
            catalog,
            records,
            index,
        }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn start_step(&mut self, number: u32) {
        let Some(record) = self.transition(number, StepStatus::InProgress) else {
            return;
        };
        record.started_at = Some(Instant::now());
        record.ended_at = None;
        record.attempts += 1;
        info!(
            "▶ Step {}: {} (attempt {})",
            record.number,
            record.label(),
            record.attempts
        );
    }

    pub fn log_success(&mut self, number: u32, strategy: Option<&str>) {
        let Some(record) = self.transition(number, StepStatus::Success) else {
            return;
        };
        record.ended_at = Some(Instant::now());
        record.strategy = strategy.map(str::to_string);
        record.error = None;
        match &record.strategy {
            Some(s) => info!("✓ Step {} completed via '{}'", record.number, s),
            None => info!("✓ Step {} completed", record.number),
        }
    }

    pub fn log_error(&mut self, number: u32, message: &str) {
        let Some(record) = self.transition(number, StepStatus::Error) else {
            return;
        };
        record.ended_at = Some(Instant::now());
        record.error = Some(message.to_string());
        warn!("✗ Step {} failed: {}", record.number, message);
    }

    /// Record a resolver outcome against an in-progress step.
    pub fn record_outcome(&mut self, number: u32, outcome: &ActionOutcome) {
        if outcome.is_success() {
            self.log_success(number, outcome.strategy());
        } else {
            let message = outcome
                .error()
                .map(|e| e.diagnostic())
                .unwrap_or_else(|| "all strategies failed".to_string());
            self.log_error(number, &message);
        }
    }

    pub fn progress(&self) -> Progress {
        let completed = self
            .records
            .iter()
            .filter(|r| r.status == StepStatus::Success)
            .count();
        let total = self.records.len();
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Progress {
            completed,
            total,
            percentage,
        }
    }

    pub fn step(&self, number: u32) -> Option<&StepRecord> {
        self.index.get(&number).map(|&i| &self.records[i])
    }

    /// Records in catalog order.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Required steps whose latest status is error.
    pub fn failed_required(&self) -> Vec<&StepRecord> {
        self.records
            .iter()
            .filter(|r| r.required && r.status == StepStatus::Error)
            .collect()
    }

    /// Put every step back to pending.
    pub fn reset(&mut self) {
        for record in &mut self.records {
            record.reset();
        }
        debug!("Progress tracker reset ({} steps)", self.records.len());
    }

    fn transition(&mut self, number: u32, next: StepStatus) -> Option<&mut StepRecord> {
        let Some(&i) = self.index.get(&number) else {
            warn!("Step {} is not declared in the catalog; ignoring {}", number, next);
            return None;
        };
        let record = &mut self.records[i];
        if !record.status.can_transition_to(next) {
            warn!(
                "Step {}: ignoring transition {} -> {}",
                number, record.status, next
            );
            return None;
        }
        record.status = next;
        Some(record)
    }
}
