//! Strategy Resolution
//!
//! Tries the strategies of an [`ActionRequest`] strictly in order and performs
//! the action on the first target that is found, becomes actionable in time,
//! and accepts the action. A strategy that does not apply is an expected,
//! frequent outcome: it is recorded as an [`AttemptResult`] and the next
//! strategy is tried. Only exhaustion of the whole list is reported as a
//! failed [`ActionOutcome`].

use super::action::{Action, ActionKind, ActionRequest};
use super::result::{ActionOutcome, AttemptResult, ResolutionError, StrategyAttempt};
use super::strategy::Strategy;
use crate::config::schema::ResolverConfig;
use crate::driver::{Driver, DriverError, ElementHandle, LoadState};
use crate::progress::ProgressTracker;
use tracing::{debug, info, warn};

pub struct StrategyResolver {
    config: ResolverConfig,
}

impl Default for StrategyResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl StrategyResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Perform the request, stopping at the first strategy that acts.
    pub async fn perform<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        request: &ActionRequest,
    ) -> ActionOutcome {
        let target = request.describe();
        let mut attempts = Vec::with_capacity(request.strategies.len());

        for (index, strategy) in request.strategies.iter().enumerate() {
            let result = self.attempt(driver, strategy, &request.action).await;
            debug!(
                "[{}] strategy {}/{} '{}' ({}): {}",
                target,
                index + 1,
                request.strategies.len(),
                strategy.name,
                strategy.locator,
                result
            );

            let acted = result.is_acted();
            attempts.push(StrategyAttempt {
                strategy: strategy.name.clone(),
                result,
            });

            if acted {
                info!("[{}] succeeded with strategy '{}'", target, strategy.name);
                return ActionOutcome::succeeded(strategy.name.clone(), attempts);
            }
        }

        let reason = if request.strategies.is_empty() {
            "no strategies supplied".to_string()
        } else {
            format!("all {} strategies failed", request.strategies.len())
        };
        warn!("[{}] {}", target, reason);

        let attempted = attempts.iter().map(|a| a.strategy.clone()).collect();
        let mut hints = Vec::new();
        for hint in attempts.iter().filter_map(|a| a.result.recovery_hint()) {
            if !hints.contains(&hint) {
                hints.push(hint);
            }
        }
        ActionOutcome::exhausted(
            ResolutionError {
                target,
                reason,
                attempted,
                hints,
            },
            attempts,
        )
    }

    /// Perform the request and record its outcome against the request's step.
    pub async fn perform_tracked<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        request: &ActionRequest,
        tracker: &mut ProgressTracker,
    ) -> ActionOutcome {
        if let Some(step) = request.step {
            tracker.start_step(step);
        }

        let outcome = self.perform(driver, request).await;

        if let Some(step) = request.step {
            tracker.record_outcome(step, &outcome);
        }
        outcome
    }

    /// Fill the first usable target, clearing its current value first when
    /// `clear` is set. A failing clear does not stop the fill.
    pub async fn fill<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        strategies: &[Strategy],
        value: &str,
        clear: bool,
    ) -> ActionOutcome {
        let action = Action::Fill {
            value: value.to_string(),
            clear,
        };
        self.perform(driver, &ActionRequest::new(action, strategies.to_vec()))
            .await
    }

    /// Scroll the first located target into view. Never fails; returns
    /// whether anything was scrolled.
    pub async fn scroll_into_view<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        strategies: &[Strategy],
    ) -> bool {
        for strategy in strategies {
            let candidates = match strategy.resolve(driver).await {
                Ok(c) => c,
                Err(e) => {
                    debug!("scroll: strategy '{}' lookup failed: {}", strategy.name, e);
                    continue;
                }
            };
            let Some(&first) = candidates.first() else {
                continue;
            };
            match driver.scroll_into_view(first).await {
                Ok(()) => {
                    debug!("scroll: scrolled {} via '{}'", first, strategy.name);
                    return true;
                }
                Err(e) => debug!("scroll: '{}' failed on {}: {}", strategy.name, first, e),
            }
        }
        debug!("scroll: no strategy located a target");
        false
    }

    /// Wait for the page to settle after a navigation-triggering action.
    ///
    /// Waits for document structure, then for network idle with a shorter
    /// budget, and falls back to a fixed delay when the network never goes
    /// quiet. Timeouts only degrade the wait; they are never returned.
    pub async fn wait_for_navigation<D: Driver + ?Sized>(&self, driver: &mut D) {
        let dom_budget = self.config.dom_ready_timeout();
        match tokio::time::timeout(
            dom_budget,
            driver.wait_for_load_state(LoadState::DomContentLoaded, dom_budget),
        )
        .await
        {
            Ok(Ok(())) => debug!("navigation: document ready"),
            Ok(Err(e)) => warn!("navigation: document not ready: {}", e),
            Err(_) => warn!("navigation: document not ready after {:?}", dom_budget),
        }

        let idle_budget = self.config.network_idle_timeout();
        let idle = tokio::time::timeout(
            idle_budget,
            driver.wait_for_load_state(LoadState::NetworkIdle, idle_budget),
        )
        .await;

        match idle {
            Ok(Ok(())) => debug!("navigation: network idle"),
            Ok(Err(e)) => {
                debug!("navigation: network not idle ({}), using fixed delay", e);
                tokio::time::sleep(self.config.fallback_delay()).await;
            }
            Err(_) => {
                debug!("navigation: network not idle after {:?}, using fixed delay", idle_budget);
                tokio::time::sleep(self.config.fallback_delay()).await;
            }
        }
    }

    async fn attempt<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        strategy: &Strategy,
        action: &Action,
    ) -> AttemptResult {
        let candidates = match strategy.resolve(driver).await {
            Ok(c) => c,
            Err(e) => return AttemptResult::LookupFailed(e),
        };

        let Some(&target) = candidates.first() else {
            return AttemptResult::NoMatch;
        };

        if !self.wait_actionable(driver, target, action.kind()).await {
            return AttemptResult::NotActionable {
                candidates: candidates.len(),
            };
        }

        match Self::act(driver, target, action).await {
            Ok(()) => AttemptResult::Acted,
            Err(e) => AttemptResult::ActionFailed(e),
        }
    }

    /// Poll until the element is actionable or the actionability budget runs out.
    async fn wait_actionable<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        element: ElementHandle,
        kind: ActionKind,
    ) -> bool {
        let poll = self.config.poll_interval();
        let check = async {
            loop {
                match driver.is_actionable(element, kind).await {
                    Ok(true) => return true,
                    Ok(false) => {}
                    Err(DriverError::ElementStale { .. } | DriverError::ElementNotFound { .. }) => {
                        return false;
                    }
                    Err(e) => debug!("actionability check on {} failed: {}", element, e),
                }
                tokio::time::sleep(poll).await;
            }
        };

        tokio::time::timeout(self.config.actionability_timeout(), check)
            .await
            .unwrap_or(false)
    }

    async fn act<D: Driver + ?Sized>(
        driver: &mut D,
        element: ElementHandle,
        action: &Action,
    ) -> Result<(), DriverError> {
        match action {
            Action::Click => driver.click(element).await,
            Action::Fill { value, clear } => {
                if *clear {
                    if let Err(e) = driver.clear(element).await {
                        debug!("clear before fill failed on {}: {}", element, e);
                    }
                }
                driver.fill(element, value).await
            }
            Action::Select(value) => driver.select_option(element, value).await,
            Action::Check => driver.check(element).await,
        }
    }
}
