use crate::progress::StepDefinition;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenaceConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub interactive: InteractiveConfig,
    /// Step catalog, in execution order.
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_actionability_timeout_ms")]
    pub actionability_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_dom_ready_timeout_ms")]
    pub dom_ready_timeout_ms: u64,
    #[serde(default = "default_network_idle_timeout_ms")]
    pub network_idle_timeout_ms: u64,
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            actionability_timeout_ms: default_actionability_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            dom_ready_timeout_ms: default_dom_ready_timeout_ms(),
            network_idle_timeout_ms: default_network_idle_timeout_ms(),
            fallback_delay_ms: default_fallback_delay_ms(),
        }
    }
}

impl ResolverConfig {
    pub fn actionability_timeout(&self) -> Duration {
        Duration::from_millis(self.actionability_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn dom_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.dom_ready_timeout_ms)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.network_idle_timeout_ms)
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }
}

fn default_actionability_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_dom_ready_timeout_ms() -> u64 {
    15000
}

fn default_network_idle_timeout_ms() -> u64 {
    5000
}

fn default_fallback_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveConfig {
    /// Attended run: hand failing tasks to an operator instead of aborting.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Delay unit for the linear retry schedule (attempt × step).
    #[serde(default = "default_retry_step_ms")]
    pub retry_step_ms: u64,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attempts: default_attempts(),
            retry_step_ms: default_retry_step_ms(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

impl InteractiveConfig {
    pub fn retry_step(&self) -> Duration {
        Duration::from_millis(self.retry_step_ms)
    }
}

fn default_attempts() -> u32 {
    3
}

fn default_retry_step_ms() -> u64 {
    1000
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("./snapshots")
}
