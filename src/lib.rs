//! Rewards Runner
//!
//! A headless automation service that once a day opens the rewards pages,
//! clicks through the task cards, and then runs a paced sequence of
//! simulated searches in a dedicated browser tab.

pub mod browser;
pub mod queries;
pub mod rewards;
pub mod run;
pub mod scheduler;
pub mod search;
pub mod settings;
pub mod status;
pub mod web;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use browser::{BrowserSession, BrowserSessionConfig};
use rewards::RewardsActivator;
use run::RunExecutor;
use scheduler::Scheduler;
use search::SearchActor;
use settings::SettingsStore;
use status::BadgeFeed;

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rewards-runner").join("logs"))
}

/// Application state shared across the service
pub struct AppState {
    /// Durable settings record
    pub store: Arc<SettingsStore>,
    /// The shared browser session
    pub session: Arc<BrowserSession>,
    /// Run executor
    pub executor: Arc<RunExecutor>,
    /// Scheduler for the daily trigger
    pub scheduler: Scheduler,
    /// Last-published badge state
    pub badge: Arc<BadgeFeed>,
}

impl AppState {
    /// Launch the browser and wire up all components.
    pub async fn init(
        browser_config: BrowserSessionConfig,
    ) -> Result<Arc<Self>, browser::BrowserError> {
        let store = Arc::new(SettingsStore::load());
        let session = Arc::new(BrowserSession::launch(browser_config).await?);

        let search = Arc::new(SearchActor::new(session.clone()));
        let rewards = Arc::new(RewardsActivator::new(session.clone(), search.clone()));
        let badge = Arc::new(BadgeFeed::new());
        let executor = RunExecutor::new(store.clone(), rewards, search, badge.clone());
        let scheduler = Scheduler::new(store.clone(), executor.clone(), badge.clone());

        Ok(Arc::new(Self {
            store,
            session,
            executor,
            scheduler,
            badge,
        }))
    }

    /// Arm the schedule and start reacting to settings changes.
    pub fn start(&self) {
        self.scheduler.schedule_next();
        self.scheduler.spawn_change_listener();
        info!("Scheduler armed and settings listener running");
    }

    /// Shut down the browser session.
    pub async fn shutdown(&self) {
        let _ = self.session.close().await;
    }
}

/// Initialize logging
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "rewards-runner.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
