//! Status projection
//!
//! Pure projection of scheduler/run state into the short badge string shown
//! by whatever front-end is watching, plus a feed the run ticker republishes
//! into every second while a run is live.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::settings::{RunState, Settings};

/// Everything the badge projection consumes.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub enabled: bool,
    pub running: bool,
    pub next_run_at: Option<DateTime<Utc>>,
    pub next_open_at: Option<DateTime<Utc>>,
}

impl StatusSnapshot {
    pub fn new(settings: &Settings, state: &RunState) -> Self {
        Self {
            enabled: settings.enabled,
            running: state.running,
            next_run_at: state.next_run_at,
            next_open_at: state.next_open_at,
        }
    }
}

/// Project the current state into badge text.
///
/// Disabled shows nothing. A run in progress shows seconds remaining to the
/// next action. A scheduled future run shows minutes remaining, rounded up,
/// with a "<1m" floor. Anything else shows nothing.
pub fn badge_text(snapshot: &StatusSnapshot, now: DateTime<Utc>) -> Option<String> {
    if !snapshot.enabled {
        return None;
    }

    if snapshot.running {
        let remain_ms = snapshot
            .next_open_at
            .map(|at| (at - now).num_milliseconds().max(0))
            .unwrap_or(0);
        let secs = (remain_ms + 999) / 1000;
        return Some(if secs > 0 {
            format!("{}s", secs)
        } else {
            "0s".to_string()
        });
    }

    let remain_ms = snapshot
        .next_run_at
        .map(|at| (at - now).num_milliseconds().max(0))
        .unwrap_or(0);
    if remain_ms <= 0 {
        return None;
    }
    let mins = (remain_ms + 59_999) / 60_000;
    Some(if mins >= 1 {
        format!("{}m", mins)
    } else {
        "<1m".to_string()
    })
}

/// Last-published badge value, refreshed by the run ticker and on schedule
/// changes, observable by the control surface.
pub struct BadgeFeed {
    tx: watch::Sender<Option<String>>,
}

impl BadgeFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Recompute and publish the badge for the given snapshot.
    pub fn publish(&self, snapshot: &StatusSnapshot) {
        self.tx.send_replace(badge_text(snapshot, Utc::now()));
    }

    /// The most recently published badge value.
    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }
}

impl Default for BadgeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(
        enabled: bool,
        running: bool,
        next_run_at: Option<DateTime<Utc>>,
        next_open_at: Option<DateTime<Utc>>,
    ) -> StatusSnapshot {
        StatusSnapshot {
            enabled,
            running,
            next_run_at,
            next_open_at,
        }
    }

    #[test]
    fn test_disabled_shows_nothing() {
        let now = Utc::now();
        let s = snapshot(false, true, Some(now), Some(now));
        assert_eq!(badge_text(&s, now), None);
    }

    #[test]
    fn test_running_shows_seconds_to_next_action() {
        let now = Utc::now();
        let s = snapshot(true, true, None, Some(now + Duration::seconds(42)));
        assert_eq!(badge_text(&s, now), Some("42s".to_string()));
    }

    #[test]
    fn test_running_with_no_pending_action_shows_zero() {
        let now = Utc::now();
        let s = snapshot(true, true, None, None);
        assert_eq!(badge_text(&s, now), Some("0s".to_string()));
    }

    #[test]
    fn test_scheduled_shows_minutes_rounded_up() {
        let now = Utc::now();
        let s = snapshot(true, false, Some(now + Duration::seconds(61)), None);
        assert_eq!(badge_text(&s, now), Some("2m".to_string()));
    }

    #[test]
    fn test_imminent_run_shows_sub_minute_floor() {
        let now = Utc::now();
        let s = snapshot(true, false, Some(now + Duration::milliseconds(1)), None);
        // Rounds up to a full minute; the floor text only appears at zero remaining.
        assert_eq!(badge_text(&s, now), Some("1m".to_string()));
    }

    #[test]
    fn test_past_or_absent_schedule_shows_nothing() {
        let now = Utc::now();
        let s = snapshot(true, false, Some(now - Duration::seconds(5)), None);
        assert_eq!(badge_text(&s, now), None);
        let s = snapshot(true, false, None, None);
        assert_eq!(badge_text(&s, now), None);
    }

    #[test]
    fn test_feed_publishes_latest_value() {
        let feed = BadgeFeed::new();
        assert_eq!(feed.current(), None);

        let now = Utc::now();
        let s = snapshot(true, true, None, Some(now + Duration::seconds(30)));
        feed.publish(&s);
        let published = feed.current().expect("badge published");
        assert!(published.ends_with('s'));
    }
}
