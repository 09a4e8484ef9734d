//! Run executor
//!
//! One run = rewards activation to completion, then N search actions at
//! strictly increasing cumulative offsets drawn from the pacing bounds.
//! The whole search phase is a single ordered queue: one task sleeps from
//! offset to offset and fires each action, so the schedule can never
//! reorder. Individual search failures are logged and the queue keeps
//! moving.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::queries;
use crate::rewards::RewardsActivator;
use crate::search::SearchActor;
use crate::settings::SettingsStore;
use crate::status::{BadgeFeed, StatusSnapshot};

/// How often live progress is republished while a run is in flight.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What happened when a run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    SkippedDisabled,
    AlreadyRunning,
}

/// The precomputed pacing plan for one run: each action's query and the
/// delay preceding it.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub queries: Vec<String>,
    pub delays_secs: Vec<u64>,
}

impl RunPlan {
    /// Draw one uniform delay in `[min, max]` (inclusive) per query.
    pub fn build(queries: Vec<String>, min_secs: u64, max_secs: u64) -> Self {
        let (lo, hi) = if min_secs <= max_secs {
            (min_secs, max_secs)
        } else {
            (max_secs, min_secs)
        };
        let mut rng = rand::thread_rng();
        let delays_secs = queries.iter().map(|_| rng.gen_range(lo..=hi)).collect();
        Self {
            queries,
            delays_secs,
        }
    }

    /// Cumulative offsets from run start; strictly increasing when every
    /// delay is positive.
    pub fn offsets_secs(&self) -> Vec<u64> {
        self.delays_secs
            .iter()
            .scan(0u64, |acc, d| {
                *acc += d;
                Some(*acc)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// Run executor
pub struct RunExecutor {
    store: Arc<SettingsStore>,
    rewards: Arc<RewardsActivator>,
    search: Arc<SearchActor>,
    badge: Arc<BadgeFeed>,
    /// First-wins guard: a second run while one is live is rejected.
    in_progress: AtomicBool,
    /// The live progress ticker, replaced (never duplicated) per run
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RunExecutor {
    pub fn new(
        store: Arc<SettingsStore>,
        rewards: Arc<RewardsActivator>,
        search: Arc<SearchActor>,
        badge: Arc<BadgeFeed>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            rewards,
            search,
            badge,
            in_progress: AtomicBool::new(false),
            ticker: Mutex::new(None),
        })
    }

    /// Whether a run is currently executing.
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Relaxed)
    }

    /// Execute one full run. `force` is the manual-trigger path: it runs
    /// even when the schedule is disabled (manual override).
    pub async fn run_task(&self, force: bool) -> RunOutcome {
        let settings = self.store.settings();
        if !settings.enabled && !force {
            debug!("Run skipped: schedule disabled");
            if !self.is_running() {
                self.store.set_progress(false, None);
            }
            return RunOutcome::SkippedDisabled;
        }

        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Run already in progress, ignoring trigger");
            return RunOutcome::AlreadyRunning;
        }

        let run_id = Uuid::new_v4();
        info!("Run {} starting ({} searches planned)", run_id, settings.searches_per_run);

        // Rewards first, searches after; activation problems never cancel
        // the search phase.
        if let Err(e) = self.rewards.activate().await {
            warn!("Run {}: rewards activation failed: {}", run_id, e);
        }

        let custom = queries::parse_custom_queries(&settings.custom_queries_raw);
        let query_list = queries::build_queries(settings.searches_per_run as usize, &custom);
        let plan = RunPlan::build(query_list, settings.interval_min, settings.interval_max);

        self.execute_plan(run_id, plan).await;

        self.in_progress.store(false, Ordering::SeqCst);
        info!("Run {} finished", run_id);
        RunOutcome::Completed
    }

    async fn execute_plan(&self, run_id: Uuid, plan: RunPlan) {
        if plan.is_empty() {
            self.store.set_progress(false, None);
            self.publish_badge();
            return;
        }

        let offsets = plan.offsets_secs();
        let start = Utc::now();
        let base = tokio::time::Instant::now();

        self.store
            .set_progress(true, Some(start + chrono::Duration::seconds(offsets[0] as i64)));
        self.start_ticker();

        for (i, query) in plan.queries.iter().enumerate() {
            tokio::time::sleep_until(base + Duration::from_secs(offsets[i])).await;

            debug!("Run {}: action {}/{} firing", run_id, i + 1, plan.queries.len());
            let search = self.search.clone();
            let query = query.clone();
            let id = run_id;
            // Fire and forget: the next action's timing never waits on this
            // search finishing.
            tokio::spawn(async move {
                if let Err(e) = search.open_and_search(&query).await {
                    warn!("Run {}: search failed: {}", id, e);
                }
            });

            let next_open_at = offsets
                .get(i + 1)
                .map(|&o| start + chrono::Duration::seconds(o as i64));
            self.store.set_next_open_at(next_open_at);
            self.publish_badge();
        }

        self.store.set_progress(false, None);
        self.stop_ticker();
        self.publish_badge();
    }

    /// Arm the 1s progress ticker, replacing any prior instance.
    fn start_ticker(&self) {
        let mut ticker = self.ticker.lock();
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let store = self.store.clone();
        let badge = self.badge.clone();
        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                let snapshot = StatusSnapshot::new(&store.settings(), &store.run_state());
                badge.publish(&snapshot);
            }
        }));
    }

    fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }

    fn publish_badge(&self) {
        let snapshot = StatusSnapshot::new(&self.store.settings(), &self.store.run_state());
        self.badge.publish(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_draws_one_delay_per_query() {
        let queries = vec!["a".into(), "b".into(), "c".into()];
        let plan = RunPlan::build(queries, 10, 120);
        assert_eq!(plan.delays_secs.len(), 3);
        assert!(plan.delays_secs.iter().all(|&d| (10..=120).contains(&d)));
    }

    #[test]
    fn test_plan_offsets_strictly_increase() {
        let queries: Vec<String> = (0..50).map(|i| format!("q{}", i)).collect();
        let plan = RunPlan::build(queries, 10, 120);
        let offsets = plan.offsets_secs();
        assert_eq!(offsets.len(), 50);
        for pair in offsets.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_plan_fixed_interval_offsets_are_exact() {
        let queries = vec!["a".into(), "b".into(), "c".into()];
        let plan = RunPlan::build(queries, 10, 10);
        assert_eq!(plan.offsets_secs(), vec![10, 20, 30]);
    }

    #[test]
    fn test_plan_tolerates_swapped_bounds() {
        let plan = RunPlan::build(vec!["a".into(); 20], 120, 10);
        assert!(plan.delays_secs.iter().all(|&d| (10..=120).contains(&d)));
    }

    #[test]
    fn test_empty_plan() {
        let plan = RunPlan::build(Vec::new(), 10, 120);
        assert!(plan.is_empty());
        assert!(plan.offsets_secs().is_empty());
    }
}
