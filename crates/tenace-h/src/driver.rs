use crate::cdp::{CdpClient, LaunchOptions};
use crate::inject::{call, locator_params};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::page::ScreenshotParams;
use serde_json::{Value, json};
use std::time::Duration;
use tenace_engine::resolution::{ActionKind, Locator};
use tenace_engine::{Driver, DriverError, ElementHandle, LoadState};
use tracing::info;

/// Poll interval for load-state checks.
const LOAD_POLL: Duration = Duration::from_millis(100);

/// Resource-free window that counts as network idle.
const NETWORK_QUIET: Duration = Duration::from_millis(500);

/// `Driver` backed by a Chromium page over the DevTools protocol.
pub struct HeadlessDriver {
    client: Option<CdpClient>,
    options: LaunchOptions,
}

impl HeadlessDriver {
    pub fn new(options: LaunchOptions) -> Self {
        Self {
            client: None,
            options,
        }
    }

    pub async fn launch(&mut self) -> Result<(), DriverError> {
        info!("Launching headless driver (Chromium)...");
        let client = CdpClient::launch(&self.options)
            .await
            .map_err(|e| DriverError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| DriverError::Other(e.to_string()))?;
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    pub async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let page = self.page()?;
        info!("Navigating to: {}", url);
        page.goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(())
    }

    /// The controlled page, for callers that need raw protocol access.
    pub fn page(&self) -> Result<&Page, DriverError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
            .ok_or(DriverError::NotReady)
    }

    async fn invoke(&self, method: &str, params: Value) -> Result<Value, DriverError> {
        call(self.page()?, method, params).await
    }

    async fn on_element(&self, method: &str, element: ElementHandle) -> Result<(), DriverError> {
        self.invoke(method, json!({ "id": element.0 })).await?;
        Ok(())
    }

    async fn reached(&self, state: LoadState) -> Result<bool, DriverError> {
        let ready = self.invoke("ready_state", Value::Null).await?;
        let ready = ready.as_str().unwrap_or("loading");
        match state {
            LoadState::DomContentLoaded => Ok(ready != "loading"),
            LoadState::NetworkIdle => {
                if ready != "complete" {
                    return Ok(false);
                }
                let idle = self
                    .invoke(
                        "network_idle",
                        json!({ "quiet_ms": NETWORK_QUIET.as_millis() as u64 }),
                    )
                    .await?;
                Ok(idle.as_bool().unwrap_or(false))
            }
        }
    }
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new(LaunchOptions::from_env(false))
    }
}

#[async_trait]
impl Driver for HeadlessDriver {
    async fn query(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let ids = self
            .invoke("query", json!({ "locator": locator_params(locator) }))
            .await?;
        let ids: Vec<u32> = serde_json::from_value(ids)?;
        Ok(ids.into_iter().map(ElementHandle).collect())
    }

    async fn is_actionable(
        &mut self,
        element: ElementHandle,
        kind: ActionKind,
    ) -> Result<bool, DriverError> {
        let result = self
            .invoke(
                "actionable",
                json!({ "id": element.0, "kind": kind.to_string() }),
            )
            .await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    async fn click(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        self.on_element("click", element).await
    }

    async fn fill(&mut self, element: ElementHandle, value: &str) -> Result<(), DriverError> {
        self.invoke("fill", json!({ "id": element.0, "value": value }))
            .await?;
        Ok(())
    }

    async fn clear(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        self.on_element("clear", element).await
    }

    async fn select_option(
        &mut self,
        element: ElementHandle,
        value: &str,
    ) -> Result<(), DriverError> {
        self.invoke("select", json!({ "id": element.0, "value": value }))
            .await?;
        Ok(())
    }

    async fn check(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        self.on_element("check", element).await
    }

    async fn scroll_into_view(&mut self, element: ElementHandle) -> Result<(), DriverError> {
        self.on_element("scroll", element).await
    }

    async fn wait_for_load_state(
        &mut self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let poll = async {
            loop {
                if self.reached(state).await? {
                    return Ok::<(), DriverError>(());
                }
                tokio::time::sleep(LOAD_POLL).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::Timeout {
                operation: format!("wait for {:?}", state),
            }),
        }
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.page()?
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| DriverError::Other(format!("Screenshot failed: {}", e)))
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        let url = self
            .page()?
            .url()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }
}
