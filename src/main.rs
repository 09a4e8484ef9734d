//! Rewards Runner - headless service
//!
//! Drives a local Chrome instance through a daily rewards-and-search run,
//! controlled over a small HTTP API.
//!
//! Environment variables:
//! - `REWARDS_RUNNER_WEB_PORT` - Control server port (default: 8080)
//! - `REWARDS_RUNNER_WEB_USER` - Basic auth username (default: "admin")
//! - `REWARDS_RUNNER_WEB_PASS` - Basic auth password (auth disabled if not set)

use app_lib::browser::BrowserSessionConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = app_lib::init_logging();

    info!("Starting Rewards Runner");

    if let Some(dir) = app_lib::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let port: u16 = std::env::var("REWARDS_RUNNER_WEB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    if std::env::var("REWARDS_RUNNER_WEB_PASS").map(|p| !p.is_empty()).unwrap_or(false) {
        let user = std::env::var("REWARDS_RUNNER_WEB_USER").unwrap_or_else(|_| "admin".to_string());
        info!("Basic auth enabled (user: {})", user);
    } else {
        info!("Basic auth disabled (set REWARDS_RUNNER_WEB_PASS to enable)");
    }

    // With a display (real or Xvfb) run headed; otherwise force headless.
    let has_display = std::env::var("DISPLAY").map(|d| !d.is_empty()).unwrap_or(false);
    let browser_config = BrowserSessionConfig::default().headless(!has_display);
    if has_display {
        info!(
            "DISPLAY={} detected - running headed",
            std::env::var("DISPLAY").unwrap_or_default()
        );
    } else {
        info!("No DISPLAY - running headless");
    }

    let state = app_lib::AppState::init(browser_config)
        .await
        .map_err(|e| anyhow::anyhow!("browser launch failed: {}", e))?;
    state.start();

    info!("Control API: http://0.0.0.0:{}/api", port);

    let result = app_lib::web::start_server(state.clone(), port).await;

    state.shutdown().await;
    result.map_err(|e| anyhow::anyhow!("server error: {}", e))
}
