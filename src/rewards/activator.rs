//! Rewards activator
//!
//! Processes the fixed rewards page list strictly in order: open the page in
//! a background tab, discover task cards, click them with fixed spacing,
//! wait for crediting to settle, then close everything the page spawned.
//! Every step past the initial tab open is best-effort; a page that never
//! renders yields an empty card list, not an aborted run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserSession};
use crate::search::SearchActor;

use super::discovery::{self, ProbeOutcome, RawCard, REWARD_URLS};
use super::tabs;

/// Grace period after load-complete before the first discovery probe.
const INITIAL_SETTLE: Duration = Duration::from_secs(2);
/// Spacing between card clicks.
const CLICK_DELAY: Duration = Duration::from_secs(3);
/// Wait after the last click so page-side crediting can finish.
const POST_CLICK_SETTLE: Duration = Duration::from_secs(5);
/// Discovery poll interval and attempt cap for pages that render late.
const PROBE_INTERVAL: Duration = Duration::from_millis(500);
const MAX_PROBE_ATTEMPTS: u32 = 10;

/// Rewards activator
pub struct RewardsActivator {
    session: Arc<BrowserSession>,
    /// The search actor's singleton tab is never a cleanup candidate.
    search: Arc<SearchActor>,
}

impl RewardsActivator {
    pub fn new(session: Arc<BrowserSession>, search: Arc<SearchActor>) -> Self {
        Self { session, search }
    }

    /// Run the full activation pass over every rewards page.
    pub async fn activate(&self) -> Result<(), BrowserError> {
        info!("Starting rewards activation");
        for url in REWARD_URLS {
            if let Err(e) = self.process_page(url).await {
                warn!("Rewards page {} failed: {}", url, e);
            }
        }
        info!("Rewards activation finished");
        Ok(())
    }

    async fn process_page(&self, page_url: &str) -> Result<(), BrowserError> {
        info!("Processing rewards page: {}", page_url);

        let section_id = url::Url::parse(page_url)
            .map(|u| discovery::section_for_path(u.path()))
            .unwrap_or_else(|_| discovery::section_for_path(""));

        let baseline = self.session.tab_ids().await?;
        let page = self.session.open_tab(page_url, true).await?;
        let main_id = page.target_id().as_ref().to_string();

        if let Err(e) = self
            .session
            .wait_for_load(&page, self.session.load_timeout())
            .await
        {
            warn!("Load wait for {} gave up ({}), proceeding anyway", page_url, e);
        }
        tokio::time::sleep(INITIAL_SETTLE).await;

        let cards = self.discover(&page, section_id).await;
        info!("Discovered {} cards on {}", cards.len(), page_url);

        for card in &cards {
            let script = discovery::click_js(section_id, card.index);
            match self.session.evaluate(&page, &script).await {
                Ok(v) if v.as_bool() == Some(true) => {
                    debug!("Clicked card {} ({})", card.index, card.text);
                }
                Ok(_) => warn!("Card {} vanished before click", card.index),
                Err(e) => warn!("Click on card {} failed: {}", card.index, e),
            }
            tokio::time::sleep(CLICK_DELAY).await;
        }

        if !cards.is_empty() {
            tokio::time::sleep(POST_CLICK_SETTLE).await;
        }

        self.cleanup(&baseline, &main_id).await;
        Ok(())
    }

    /// Poll the page for the task section until it yields cards, triggers
    /// expansion, or the attempt cap runs out.
    async fn discover(&self, page: &chromiumoxide::Page, section_id: &str) -> Vec<RawCard> {
        let script = discovery::snapshot_js(section_id);

        for attempt in 1..=MAX_PROBE_ATTEMPTS {
            let raw = match self.session.evaluate(page, &script).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Discovery probe {} failed: {}", attempt, e);
                    tokio::time::sleep(PROBE_INTERVAL).await;
                    continue;
                }
            };

            match serde_json::from_value::<ProbeOutcome>(raw) {
                Ok(ProbeOutcome::Cards { cards }) => return discovery::filter_cards(cards),
                Ok(ProbeOutcome::Expanded) => {
                    debug!("Section '{}' was collapsed, expansion triggered", section_id);
                }
                Ok(ProbeOutcome::SectionMissing) => {
                    debug!(
                        "Section '{}' not present yet (attempt {}/{})",
                        section_id, attempt, MAX_PROBE_ATTEMPTS
                    );
                }
                Err(e) => warn!("Discovery probe returned malformed data: {}", e),
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }

        warn!("Section '{}' never appeared, giving up", section_id);
        Vec::new()
    }

    /// Close everything this page spawned. Each close is best-effort: a tab
    /// that refuses to close is logged and skipped, never fatal.
    async fn cleanup(&self, baseline: &HashSet<String>, main_id: &str) {
        let records = match self.session.tab_records().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Tab snapshot for cleanup failed: {}", e);
                return;
            }
        };

        let descendants = tabs::descendants_of(main_id, &records);
        let excluded = self.search.tab_id().await;

        for record in &records {
            if record.id == main_id || Some(&record.id) == excluded.as_ref() {
                continue;
            }
            let newly_appeared = !baseline.contains(&record.id);
            let close = descendants.contains(&record.id)
                || (newly_appeared && tabs::is_reward_host(&record.url));
            if !close {
                continue;
            }

            match self.session.close_tab_by_id(&record.id).await {
                Ok(true) => debug!("Closed spawned tab {} ({})", record.id, record.url),
                Ok(false) => {}
                Err(e) => warn!("Failed to close tab {}: {}", record.id, e),
            }
        }

        if let Err(e) = self.session.close_tab_by_id(main_id).await {
            warn!("Failed to close rewards tab {}: {}", main_id, e);
        }
    }
}
