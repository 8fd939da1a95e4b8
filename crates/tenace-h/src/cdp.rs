use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

type LaunchError = Box<dyn std::error::Error + Send + Sync>;

/// How to start Chromium.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Show the browser window. Attended runs need this so the operator can
    /// take over the page.
    pub visible: bool,
    pub executable: Option<PathBuf>,
    /// Persistent profile directory. When unset a throwaway profile is
    /// created and removed on close.
    pub user_data_dir: Option<PathBuf>,
}

impl LaunchOptions {
    /// Options from `CHROME_BIN` and `TENACE_USER_DATA_DIR`.
    pub fn from_env(visible: bool) -> Self {
        Self {
            visible,
            executable: std::env::var_os("CHROME_BIN").map(PathBuf::from),
            user_data_dir: std::env::var_os("TENACE_USER_DATA_DIR").map(PathBuf::from),
        }
    }
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    profile: PathBuf,
    ephemeral_profile: bool,
}

impl CdpClient {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, LaunchError> {
        let (profile, ephemeral_profile) = match &options.user_data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                tracing::info!("Using persistent profile: {}", dir.display());
                (dir.clone(), false)
            }
            None => (ephemeral_profile_dir()?, true),
        };

        let mut builder = BrowserConfig::builder()
            .no_sandbox() // needed in docker/CI
            .user_data_dir(&profile);
        if options.visible {
            tracing::info!("Launching browser in visible mode");
            builder = builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }
        if let Some(executable) = &options.executable {
            tracing::info!("Using custom Chrome binary: {}", executable.display());
            builder = builder.chrome_executable(executable);
        }

        let config = builder
            .build()
            .map_err(|e| format!("Failed to build browser config: {}", e))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        forward_console(&page).await?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            profile,
            ephemeral_profile,
        })
    }

    pub async fn close(mut self) -> Result<(), LaunchError> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;

        if self.ephemeral_profile {
            if let Err(e) = std::fs::remove_dir_all(&self.profile) {
                tracing::debug!(
                    "Failed to clean up profile {}: {}",
                    self.profile.display(),
                    e
                );
            }
        }
        Ok(())
    }
}

/// Page console output goes to the debug log.
async fn forward_console(page: &Page) -> Result<(), LaunchError> {
    let mut events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| arg.description.clone().unwrap_or_else(|| "?".to_string()))
                .collect();
            tracing::debug!("Browser console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });
    Ok(())
}

/// An open alert/confirm/prompt blocks script evaluation, so every dialog
/// is accepted as soon as it opens.
async fn accept_dialogs(page: &Page) -> Result<(), LaunchError> {
    let mut events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!("Accepting {:?} dialog: {}", event.r#type, event.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::error!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

fn ephemeral_profile_dir() -> Result<PathBuf, LaunchError> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock error: {}", e))?
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "tenace-chromium-profile-{}-{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&path)?;
    tracing::info!("Using isolated profile: {}", path.display());
    Ok(path)
}
