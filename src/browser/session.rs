//! Browser session management
//!
//! Launches and controls the shared Chrome instance. Tabs are opened in the
//! background so runs never steal focus from whatever the user is doing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::BrowserError;

/// How often the readiness poll re-checks `document.readyState`.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Find Chrome/Chromium executable on the system
fn find_chrome() -> Option<std::path::PathBuf> {
    let candidates: Vec<std::path::PathBuf> = if cfg!(target_os = "windows") {
        let mut paths = vec![
            std::path::PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            std::path::PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(std::path::PathBuf::from(format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                local
            )));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![std::path::PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else {
        vec![
            std::path::PathBuf::from("/usr/bin/google-chrome"),
            std::path::PathBuf::from("/usr/bin/google-chrome-stable"),
            std::path::PathBuf::from("/usr/bin/chromium"),
            std::path::PathBuf::from("/usr/bin/chromium-browser"),
        ]
    };

    candidates.into_iter().find(|p| p.exists())
}

/// Configuration for the browser session
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSessionConfig {
    /// Path to Chrome/Chromium executable
    pub chrome_path: Option<String>,
    /// Run in headless mode
    pub headless: bool,
    /// User data directory
    pub user_data_dir: Option<String>,
    /// Page-load wait timeout in seconds
    pub load_timeout_secs: u64,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_data_dir: None,
            load_timeout_secs: 15,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl BrowserSessionConfig {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Page-load timeout as a Duration
    pub fn load_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

/// A lightweight view of an open tab, enough to reason about cleanup:
/// its identity, what opened it, and where it points.
#[derive(Debug, Clone)]
pub struct TabRecord {
    pub id: String,
    pub opener: Option<String>,
    pub url: String,
}

/// The shared browser session for automation
pub struct BrowserSession {
    /// The browser instance
    browser: Arc<RwLock<Option<Browser>>>,
    /// Session configuration
    config: BrowserSessionConfig,
    /// Whether the browser process is still connected
    alive: Arc<AtomicBool>,
}

impl BrowserSession {
    /// Launch Chrome with the given config
    pub async fn launch(config: BrowserSessionConfig) -> Result<Self, BrowserError> {
        info!("Launching browser (headless: {})", config.headless);

        if config.chrome_path.is_none() && find_chrome().is_none() {
            return Err(BrowserError::LaunchFailed(
                "Chrome/Chromium not found. Install it or set the chromePath setting.".to_string(),
            ));
        }

        let mut builder = BrowserConfig::builder();

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        } else if let Some(chrome_path) = find_chrome() {
            info!("Auto-detected Chrome at: {}", chrome_path.display());
            builder = builder.chrome_executable(chrome_path);
        }

        if let Some(ref dir) = config.user_data_dir {
            let _ = std::fs::create_dir_all(dir);
            builder = builder.user_data_dir(dir);
        }

        builder = builder
            .window_size(config.window_width, config.window_height)
            .arg("--no-default-browser-check")
            .arg("--disable-notifications")
            .arg("--disable-session-crashed-bubble")
            // Required when running as root (e.g., in Docker or on a VPS)
            .arg("--no-sandbox");

        let browser_config = builder
            .build()
            .map_err(BrowserError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Drain the CDP event stream; when it ends, Chrome has disconnected.
        let alive_flag = Arc::new(AtomicBool::new(true));
        let alive_for_handler = alive_flag.clone();
        tokio::spawn(async move {
            while let Some(res) = handler.next().await {
                if let Err(e) = res {
                    debug!("Browser handler error: {}", e);
                }
            }
            warn!("Chrome disconnected (event handler ended)");
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        info!("Browser session created");

        Ok(Self {
            browser: Arc::new(RwLock::new(Some(browser))),
            config,
            alive: alive_flag,
        })
    }

    /// Check if the browser is still connected
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Configured page-load timeout
    pub fn load_timeout(&self) -> Duration {
        self.config.load_timeout_duration()
    }

    /// Open a new tab at the given URL, optionally in the background
    pub async fn open_tab(&self, url: &str, background: bool) -> Result<Page, BrowserError> {
        let params = CreateTargetParams::builder()
            .url(url)
            .background(background)
            .build()
            .map_err(BrowserError::NavigationFailed)?;

        let browser = self.browser.read().await;
        let browser = browser
            .as_ref()
            .ok_or_else(|| BrowserError::ConnectionLost("Browser closed".into()))?;

        debug!("Opening tab: {}", url);
        browser
            .new_page(params)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))
    }

    /// Navigate an existing tab to a URL
    pub async fn navigate(&self, page: &Page, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating tab to: {}", url);
        page.goto(url)
            .await
            .map_err(|e| BrowserError::TabGone(e.to_string()))?;
        Ok(())
    }

    /// Wait until the tab reports load-complete, bounded by `timeout`.
    ///
    /// Two paths race inside one suspension point: the navigation event from
    /// the protocol, and a readyState poll for pages that were already
    /// complete before we started listening. Timing out is a soft failure at
    /// the call sites; they proceed best-effort.
    pub async fn wait_for_load(&self, page: &Page, timeout: Duration) -> Result<(), BrowserError> {
        let event_path = page.wait_for_navigation();
        let poll_path = async {
            loop {
                if let Ok(ready) = page.evaluate("document.readyState").await {
                    if ready.value().and_then(|v| v.as_str()) == Some("complete") {
                        return;
                    }
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, async {
            tokio::select! {
                _ = event_path => {}
                _ = poll_path => {}
            }
        })
        .await
        .map_err(|_| BrowserError::Timeout("Tab load timeout".into()))?;

        Ok(())
    }

    /// Execute JavaScript in a tab with the default 60 second timeout
    pub async fn evaluate(&self, page: &Page, script: &str) -> Result<serde_json::Value, BrowserError> {
        self.evaluate_with_timeout(page, script, 60).await
    }

    /// Execute JavaScript in a tab with a custom timeout (in seconds).
    /// Promises are awaited, so injected async procedures resolve fully.
    pub async fn evaluate_with_timeout(
        &self,
        page: &Page,
        script: &str,
        timeout_secs: u64,
    ) -> Result<serde_json::Value, BrowserError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::JavaScriptError)?;

        let result = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            page.evaluate(params),
        )
        .await
        .map_err(|_| {
            BrowserError::Timeout(format!("JavaScript execution timed out after {}s", timeout_secs))
        })?
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Identities of all currently open tabs
    pub async fn tab_ids(&self) -> Result<HashSet<String>, BrowserError> {
        let browser = self.browser.read().await;
        let browser = browser
            .as_ref()
            .ok_or_else(|| BrowserError::ConnectionLost("Browser closed".into()))?;

        let pages = browser
            .pages()
            .await
            .map_err(|e| BrowserError::ConnectionLost(e.to_string()))?;

        Ok(pages
            .iter()
            .map(|p| p.target_id().as_ref().to_string())
            .collect())
    }

    /// Snapshot all page targets with their opener links, for tab
    /// reconciliation after a rewards pass.
    pub async fn tab_records(&self) -> Result<Vec<TabRecord>, BrowserError> {
        let mut browser = self.browser.write().await;
        let browser = browser
            .as_mut()
            .ok_or_else(|| BrowserError::ConnectionLost("Browser closed".into()))?;

        let targets = browser
            .fetch_targets()
            .await
            .map_err(|e| BrowserError::ConnectionLost(e.to_string()))?;

        Ok(targets
            .into_iter()
            .filter(|t| t.r#type == "page")
            .map(|t| TabRecord {
                id: t.target_id.as_ref().to_string(),
                opener: t.opener_id.map(|o| o.as_ref().to_string()),
                url: t.url,
            })
            .collect())
    }

    /// Close a tab by identity. Returns false if the tab was already gone.
    pub async fn close_tab_by_id(&self, id: &str) -> Result<bool, BrowserError> {
        let page = {
            let browser = self.browser.read().await;
            let browser = browser
                .as_ref()
                .ok_or_else(|| BrowserError::ConnectionLost("Browser closed".into()))?;

            let pages = browser
                .pages()
                .await
                .map_err(|e| BrowserError::ConnectionLost(e.to_string()))?;

            pages
                .into_iter()
                .find(|p| p.target_id().as_ref() == id)
        };

        match page {
            Some(page) => {
                page.close()
                    .await
                    .map_err(|e| BrowserError::TabGone(e.to_string()))?;
                Ok(true)
            }
            None => {
                debug!("Tab {} already gone, nothing to close", id);
                Ok(false)
            }
        }
    }

    /// Close the browser session
    pub async fn close(&self) -> Result<(), BrowserError> {
        self.alive.store(false, Ordering::Relaxed);

        let mut browser = self.browser.write().await;
        if let Some(mut b) = browser.take() {
            // Graceful close first, then force kill so no Chrome processes linger
            let _ = b.close().await;
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = b.kill().await;
        }

        info!("Browser session closed");
        Ok(())
    }
}
