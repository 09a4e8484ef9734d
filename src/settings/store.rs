//! Settings store
//!
//! One flat JSON record holding both user settings and runtime state
//! (next scheduled run, run-in-progress markers). Runtime fields are
//! persisted in the same record so an armed schedule survives restarts.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// User-controlled settings, mutated only through the control surface.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Master switch for the daily schedule
    pub enabled: bool,
    /// Scheduled run time, 24h "HH:MM" local clock
    pub time: String,
    /// How many queries to open per run
    pub searches_per_run: u32,
    /// Min seconds between search actions
    pub interval_min: u64,
    /// Max seconds between search actions
    pub interval_max: u64,
    /// Newline or comma separated custom query list
    pub custom_queries_raw: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            time: "06:30".to_string(),
            searches_per_run: 50,
            interval_min: 10,
            interval_max: 120,
            custom_queries_raw: String::new(),
        }
    }
}

/// Runtime state owned by the scheduler and run executor.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    /// When the next run is armed to fire; absent when disabled
    pub next_run_at: Option<DateTime<Utc>>,
    /// Whether a run is currently in progress
    pub running: bool,
    /// When the next search action within a run fires
    pub next_open_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Stored {
    #[serde(flatten)]
    settings: Settings,
    #[serde(flatten)]
    state: RunState,
}

/// Durable settings store with change notifications.
pub struct SettingsStore {
    path: Option<PathBuf>,
    inner: RwLock<Stored>,
    tx: watch::Sender<Settings>,
}

impl SettingsStore {
    /// Default on-disk location for the settings record
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rewards-runner").join("settings.json"))
    }

    /// Load from the default location (or defaults if missing/unreadable)
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from an explicit path; `None` keeps the store memory-only.
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let stored = path
            .as_ref()
            .and_then(|p| Self::read_file(p))
            .unwrap_or_default();

        let (tx, _) = watch::channel(stored.settings.clone());
        Self {
            path,
            inner: RwLock::new(stored),
            tx,
        }
    }

    fn read_file(path: &PathBuf) -> Option<Stored> {
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(stored) => {
                    info!("Loaded settings from {:?}", path);
                    Some(stored)
                }
                Err(e) => {
                    warn!("Failed to parse settings file: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                None
            }
        }
    }

    /// Current settings snapshot
    pub fn settings(&self) -> Settings {
        self.inner.read().settings.clone()
    }

    /// Current runtime state snapshot
    pub fn run_state(&self) -> RunState {
        self.inner.read().state.clone()
    }

    /// Subscribe to settings changes. The receiver observes a snapshot of the
    /// full settings record each time any field changes.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    /// Replace the user settings, persist, and notify subscribers.
    pub fn update_settings(&self, settings: Settings) {
        let snapshot = {
            let mut inner = self.inner.write();
            inner.settings = settings.clone();
            inner.clone()
        };
        self.persist(&snapshot);
        self.tx.send_replace(settings);
    }

    /// Record when the next run is armed to fire (absent clears it)
    pub fn set_next_run_at(&self, at: Option<DateTime<Utc>>) {
        let snapshot = {
            let mut inner = self.inner.write();
            inner.state.next_run_at = at;
            inner.clone()
        };
        self.persist(&snapshot);
    }

    /// Set both run-progress markers in one write
    pub fn set_progress(&self, running: bool, next_open_at: Option<DateTime<Utc>>) {
        let snapshot = {
            let mut inner = self.inner.write();
            inner.state.running = running;
            inner.state.next_open_at = next_open_at;
            inner.clone()
        };
        self.persist(&snapshot);
    }

    /// Advance the next-action marker within a running run
    pub fn set_next_open_at(&self, at: Option<DateTime<Utc>>) {
        let snapshot = {
            let mut inner = self.inner.write();
            inner.state.next_open_at = at;
            inner.clone()
        };
        self.persist(&snapshot);
    }

    fn persist(&self, stored: &Stored) {
        let Some(path) = &self.path else { return };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("Failed to create settings directory: {}", e);
                return;
            }
        }

        match serde_json::to_string_pretty(stored) {
            Ok(content) => {
                if let Err(e) = std::fs::write(path, content) {
                    error!("Failed to save settings: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize settings: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.enabled);
        assert_eq!(s.time, "06:30");
        assert_eq!(s.searches_per_run, 50);
        assert_eq!(s.interval_min, 10);
        assert_eq!(s.interval_max, 120);
        assert!(s.custom_queries_raw.is_empty());
    }

    #[test]
    fn test_update_notifies_subscribers() {
        let store = SettingsStore::load_from(None);
        let rx = store.subscribe();

        let mut settings = store.settings();
        settings.enabled = false;
        settings.time = "09:15".to_string();
        store.update_settings(settings);

        let seen = rx.borrow().clone();
        assert!(!seen.enabled);
        assert_eq!(seen.time, "09:15");
    }

    #[test]
    fn test_runtime_state_starts_cleared() {
        let store = SettingsStore::load_from(None);
        let state = store.run_state();
        assert!(state.next_run_at.is_none());
        assert!(!state.running);
        assert!(state.next_open_at.is_none());
    }

    #[test]
    fn test_progress_markers_roundtrip() {
        let store = SettingsStore::load_from(None);
        let at = Utc::now();

        store.set_progress(true, Some(at));
        let state = store.run_state();
        assert!(state.running);
        assert_eq!(state.next_open_at, Some(at));

        store.set_progress(false, None);
        let state = store.run_state();
        assert!(!state.running);
        assert!(state.next_open_at.is_none());
    }

    #[tokio::test]
    async fn test_change_notification_wakes_subscriber() {
        let store = SettingsStore::load_from(None);
        let mut rx = store.subscribe();

        let mut settings = store.settings();
        settings.time = "10:00".to_string();
        store.update_settings(settings);

        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow().time, "10:00");
    }

    #[test]
    fn test_stored_record_is_flat_json() {
        let stored = Stored::default();
        let json = serde_json::to_value(&stored).unwrap();
        assert!(json.get("enabled").is_some());
        assert!(json.get("nextRunAt").is_some());
        assert!(json.get("settings").is_none());
    }
}
