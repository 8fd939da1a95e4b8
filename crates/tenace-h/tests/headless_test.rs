use serial_test::serial;
use tenace_engine::config::{InteractiveConfig, ResolverConfig};
use tenace_engine::progress::{ProgressTracker, StepCatalog, StepDefinition, StepStatus};
use tenace_engine::resolution::{ActionRequest, Locator, Strategy, StrategyResolver, TargetHints};
use tenace_engine::{Driver, SnapshotCapture};
use tenace_h::{HeadlessDriver, LaunchOptions, ScreenshotCapture};

const FORM: &str = "<html><head><title>Registro</title></head><body>\
<form onsubmit='return false'>\
<label for='company'>Empresa</label><input id='company' name='company' value='old'>\
<select name='province'><option value='M'>Madrid</option><option value='B'>Barcelona</option></select>\
<input type='checkbox' id='terms' aria-label='Acepto'>\
<button type='button' style='display:none' id='hidden-submit'>Enviar</button>\
<button type='button' data-testid='send' onclick=\"document.title='sent'\">Enviar solicitud</button>\
</form></body></html>";

fn fast_resolver() -> StrategyResolver {
    StrategyResolver::new(ResolverConfig {
        actionability_timeout_ms: 500,
        poll_interval_ms: 50,
        dom_ready_timeout_ms: 5000,
        network_idle_timeout_ms: 2000,
        fallback_delay_ms: 200,
    })
}

async fn launch() -> Option<HeadlessDriver> {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();

    let mut driver = HeadlessDriver::new(LaunchOptions::from_env(false));
    match driver.launch().await {
        Ok(()) => Some(driver),
        Err(e) => {
            eprintln!("Skipping test: Headless browser not available: {}", e);
            None
        }
    }
}

async fn title(driver: &HeadlessDriver) -> String {
    driver
        .page()
        .expect("page")
        .get_title()
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[tokio::test]
#[serial]
async fn test_form_interactions_fall_through_strategies() {
    let Some(mut driver) = launch().await else {
        return;
    };
    driver
        .navigate(&format!("data:text/html,{}", FORM))
        .await
        .expect("Navigation failed");

    let resolver = fast_resolver();
    resolver.wait_for_navigation(&mut driver).await;

    let catalog = StepCatalog::new(vec![
        StepDefinition::new(1, "company", "Fill the company"),
        StepDefinition::new(2, "submit", "Send the request"),
    ])
    .unwrap();
    let mut tracker = ProgressTracker::new(catalog);

    let company = resolver
        .fill(
            &mut driver,
            &TargetHints::new().id("missing").label("Empresa").strategies(),
            "EPSA PUBLISHING S.A.",
            true,
        )
        .await;
    assert!(company.is_success(), "{:?}", company.error());
    assert_eq!(company.strategy(), Some("label:Empresa"));

    let handles = driver
        .query(&Locator::Css("input[value]".into()))
        .await
        .unwrap();
    assert!(!handles.is_empty());

    let province = resolver
        .perform(
            &mut driver,
            &ActionRequest::select(vec![Strategy::by_name("province")], "Barcelona"),
        )
        .await;
    assert!(province.is_success());

    let terms = resolver
        .perform(
            &mut driver,
            &ActionRequest::check(vec![Strategy::by_label("Acepto")]),
        )
        .await;
    assert!(terms.is_success());

    // The hidden button matches the exact text but never becomes actionable.
    let submit = ActionRequest::click(vec![
        Strategy::by_css("button[type=submit]"),
        Strategy::by_text("Enviar"),
        Strategy::by_test_id("send"),
    ])
    .for_step(2);
    let outcome = resolver
        .perform_tracked(&mut driver, &submit, &mut tracker)
        .await;

    assert!(outcome.is_success(), "{:?}", outcome.error());
    assert_eq!(outcome.strategy(), Some("testid:send"));
    assert_eq!(outcome.attempts().len(), 3);
    assert_eq!(tracker.step(2).unwrap().status, StepStatus::Success);
    assert_eq!(title(&driver).await, "sent");

    driver.close().await.expect("Close failed");
}

#[tokio::test]
#[serial]
async fn test_missing_target_reports_every_strategy() {
    let Some(mut driver) = launch().await else {
        return;
    };
    driver
        .navigate("data:text/html,<html><body><p>Nothing here</p></body></html>")
        .await
        .expect("Navigation failed");

    let resolver = fast_resolver();
    let outcome = resolver
        .perform(
            &mut driver,
            &ActionRequest::click(vec![
                Strategy::by_id("go"),
                Strategy::by_xpath("//button"),
                Strategy::by_css("[[broken"),
            ]),
        )
        .await;

    assert!(!outcome.is_success());
    let error = outcome.error().unwrap();
    assert_eq!(error.attempted, vec!["id:go", "xpath://button", "css:[[broken"]);

    assert!(
        !resolver
            .scroll_into_view(&mut driver, &[Strategy::by_id("go")])
            .await
    );

    driver.close().await.expect("Close failed");
}

#[tokio::test]
#[serial]
async fn test_snapshot_is_written_to_directory() {
    let Some(mut driver) = launch().await else {
        return;
    };
    driver
        .navigate("data:text/html,<html><body><h1>Snapshot</h1></body></html>")
        .await
        .expect("Navigation failed");

    let dir = std::env::temp_dir().join(format!("tenace-snapshots-{}", std::process::id()));
    let capture = ScreenshotCapture::new(&driver, &dir).unwrap();
    let path = capture.capture("Select company").await.expect("Capture failed");

    assert!(path.starts_with(&dir));
    assert!(path.exists());
    let url = driver.current_url().await.unwrap();
    assert!(url.starts_with("data:text/html"));

    std::fs::remove_dir_all(&dir).ok();
    driver.close().await.expect("Close failed");
}

#[tokio::test]
#[serial]
async fn test_snapshot_uses_configured_directory() {
    let Some(mut driver) = launch().await else {
        return;
    };
    driver
        .navigate("data:text/html,<html><body><h1>Captcha</h1></body></html>")
        .await
        .expect("Navigation failed");

    let config = InteractiveConfig {
        enabled: true,
        snapshot_dir: std::env::temp_dir().join(format!("tenace-configured-{}", std::process::id())),
        ..InteractiveConfig::default()
    };
    let capture = ScreenshotCapture::from_config(&driver, &config).unwrap();
    assert_eq!(capture.dir(), config.snapshot_dir.as_path());

    let path = capture.capture("Solve captcha").await.expect("Capture failed");
    assert!(path.starts_with(&config.snapshot_dir));
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("solve-captcha-"));

    std::fs::remove_dir_all(&config.snapshot_dir).ok();
    driver.close().await.expect("Close failed");
}

#[tokio::test]
async fn test_snapshot_needs_a_launched_browser() {
    let driver = HeadlessDriver::new(LaunchOptions::from_env(false));
    assert!(ScreenshotCapture::from_config(&driver, &InteractiveConfig::default()).is_err());
}
