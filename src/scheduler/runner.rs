//! Schedule runner
//!
//! Owns the one-shot timer for the next daily run. Arming is always
//! clear-then-arm so repeated calls can never stack timers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::run::RunExecutor;
use crate::settings::SettingsStore;
use crate::status::{BadgeFeed, StatusSnapshot};

/// Parse "HH:MM". The setting is free text; malformed parts fall back to
/// zero rather than failing the schedule.
fn parse_time(time_hhmm: &str) -> NaiveTime {
    let mut parts = time_hhmm.splitn(2, ':');
    let hour: u32 = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    let minute: u32 = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN)
}

/// Next occurrence of the given wall-clock time strictly after `now`:
/// today's if it hasn't passed yet, otherwise tomorrow's.
pub fn compute_next_run(time_hhmm: &str, now: DateTime<Local>) -> DateTime<Local> {
    let time = parse_time(time_hhmm);

    let today = now
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest();

    match today {
        Some(t) if t > now => t,
        _ => now
            .date_naive()
            .succ_opt()
            .and_then(|d| d.and_time(time).and_local_timezone(Local).earliest())
            .unwrap_or(now + chrono::Duration::days(1)),
    }
}

struct Inner {
    store: Arc<SettingsStore>,
    executor: Arc<RunExecutor>,
    badge: Arc<BadgeFeed>,
    /// The armed one-shot timer, replaced atomically on rearm
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Scheduler for the daily run
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(
        store: Arc<SettingsStore>,
        executor: Arc<RunExecutor>,
        badge: Arc<BadgeFeed>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                executor,
                badge,
                timer: Mutex::new(None),
            }),
        }
    }

    /// Recompute and re-arm the next run trigger from current settings.
    ///
    /// Idempotent: any previously armed timer is aborted before a new one is
    /// spawned. Disabled settings clear both the timer and the persisted
    /// next-run marker.
    pub fn schedule_next(&self) {
        Inner::arm(&self.inner);
    }

    /// React to settings changes for as long as the process lives. Every
    /// field in the settings record is schedule-relevant, so any change
    /// triggers a re-arm.
    pub fn spawn_change_listener(&self) -> JoinHandle<()> {
        let mut rx = self.inner.store.subscribe();
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut prev = rx.borrow().clone();
            while rx.changed().await.is_ok() {
                let current = rx.borrow().clone();
                if current != prev {
                    info!("Settings changed, rescheduling");
                    Inner::arm(&inner);
                }
                prev = current;
            }
            warn!("Settings store dropped, change listener exiting");
        })
    }
}

impl Inner {
    fn arm(this: &Arc<Self>) {
        let mut timer = this.timer.lock();
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let settings = this.store.settings();
        if !settings.enabled {
            this.store.set_next_run_at(None);
            this.publish_badge();
            info!("Schedule disabled, timer cleared");
            return;
        }

        let next = compute_next_run(&settings.time, Local::now());
        this.store.set_next_run_at(Some(next.with_timezone(&Utc)));
        this.publish_badge();
        info!("Next run scheduled at: {}", next);

        let delay = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);

        let inner = this.clone();
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!("Schedule fired, starting run");

            let executor = inner.executor.clone();
            tokio::spawn(async move {
                executor.run_task(false).await;
            });

            // Re-arm for the following day. Arming aborts this task's own
            // handle, but the whole section is synchronous, so it completes
            // before the abort can land.
            Inner::arm(&inner);
        }));
    }

    fn publish_badge(&self) {
        let snapshot = StatusSnapshot::new(&self.store.settings(), &self.store.run_state());
        self.badge.publish(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let now = local(2026, 3, 10, 6, 0);
        let next = compute_next_run("06:30", now);
        assert_eq!(next, local(2026, 3, 10, 6, 30));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let now = local(2026, 3, 10, 7, 0);
        let next = compute_next_run("06:30", now);
        assert_eq!(next, local(2026, 3, 11, 6, 30));
    }

    #[test]
    fn test_exact_trigger_time_rolls_to_tomorrow() {
        let now = local(2026, 3, 10, 6, 30);
        let next = compute_next_run("06:30", now);
        assert_eq!(next, local(2026, 3, 11, 6, 30));
    }

    #[test]
    fn test_next_run_always_future_and_within_a_day() {
        let times = ["00:00", "06:30", "12:00", "23:59"];
        let now = local(2026, 7, 4, 13, 37);
        for t in times {
            let next = compute_next_run(t, now);
            assert!(next > now, "{} not in the future", t);
            assert!(
                next - now <= chrono::Duration::hours(24),
                "{} more than 24h away",
                t
            );
        }
    }

    #[test]
    fn test_malformed_time_falls_back_to_midnight() {
        let now = local(2026, 3, 10, 7, 0);
        let next = compute_next_run("garbage", now);
        assert_eq!(next, local(2026, 3, 11, 0, 0));
    }

    #[test]
    fn test_partial_time_parses_hour_only() {
        let now = local(2026, 3, 10, 7, 0);
        let next = compute_next_run("9:xx", now);
        assert_eq!(next, local(2026, 3, 10, 9, 0));
    }
}
