//! Card discovery
//!
//! The injected page script only reports DOM structure: for each anchor in
//! the task section it returns the link target, visible text, size/display
//! visibility and whether the anchor wraps an image. Everything that decides
//! what is actually clickable — the image heuristic, the see-more and
//! completed-task exclusions, dedup — runs here over that data.

use serde::Deserialize;

/// Bare earn-page roots; anchors pointing at these are navigation chrome,
/// not task tiles.
const EARN_ROOTS: &[&str] = &["https://rewards.bing.com", "https://rewards.bing.com/earn"];

/// Visible-text markers of a task that has already been credited.
const COMPLETED_WORDS: &[&str] = &["completed", "done"];
const CHECK_MARKS: &[char] = &['\u{2713}', '\u{2714}'];

/// The fixed list of rewards page URLs, processed strictly in order: the
/// daily tasks dashboard, then the earn-more page.
pub const REWARD_URLS: &[&str] = &["https://rewards.bing.com/", "https://rewards.bing.com/earn"];

/// Section identifier for a rewards page path: the earn page and the daily
/// tasks dashboard use different stable container ids.
pub fn section_for_path(path: &str) -> &'static str {
    if path.contains("earn") {
        "more-activities"
    } else {
        "daily-sets"
    }
}

/// Raw anchor data reported by the page snapshot script.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    /// Position in the section's anchor enumeration; the click script
    /// re-enumerates the same way, so this addresses the element.
    pub index: usize,
    pub href: String,
    pub text: String,
    pub visible: bool,
    pub has_image: bool,
    pub see_more: bool,
}

/// One probe of the page: either the section isn't there yet, we just
/// triggered its expansion control, or we got an anchor snapshot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ProbeOutcome {
    SectionMissing,
    Expanded,
    Cards { cards: Vec<RawCard> },
}

/// Collapse whitespace and case for text comparison and dedup keys.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_earn_root(href: &str) -> bool {
    let trimmed = href.trim_end_matches('/');
    EARN_ROOTS
        .iter()
        .any(|root| trimmed.eq_ignore_ascii_case(root.trim_end_matches('/')))
}

fn is_completed(text: &str) -> bool {
    let normalized = normalize_text(text);
    normalized.contains(CHECK_MARKS)
        || normalized
            .split_whitespace()
            .any(|word| COMPLETED_WORDS.contains(&word))
}

/// Reduce a raw snapshot to the clickable task tiles: visible anchors that
/// wrap an image, minus the section's see-more link, bare earn-root links
/// and already-completed tasks, deduplicated by (link target, normalized
/// text).
pub fn filter_cards(raw: Vec<RawCard>) -> Vec<RawCard> {
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .filter(|card| {
            card.visible
                && card.has_image
                && !card.see_more
                && !is_earn_root(&card.href)
                && !is_completed(&card.text)
        })
        .filter(|card| seen.insert((card.href.clone(), normalize_text(&card.text))))
        .collect()
}

/// Shared anchor enumeration used by both the snapshot and the click script,
/// so indices stay stable between the two.
fn enumeration_js(section_id: &str) -> String {
    format!(
        r#"const section = document.getElementById("{id}");
                const anchors = section ? Array.from(section.querySelectorAll("a[href]")) : [];"#,
        id = section_id
    )
}

/// Build the snapshot script for a section.
pub fn snapshot_js(section_id: &str) -> String {
    format!(
        r#"
        (function () {{
            {enumeration}
            if (!section) return {{ status: "sectionMissing" }};

            const expand = section.querySelector("[aria-expanded='false']");
            if (expand) {{
                expand.click();
                return {{ status: "expanded" }};
            }}

            const cards = anchors.map((a, index) => {{
                const rect = a.getBoundingClientRect();
                const style = window.getComputedStyle(a);
                const text = (a.textContent || "").trim();
                return {{
                    index: index,
                    href: a.href || "",
                    text: text,
                    visible: rect.width > 0 && rect.height > 0 &&
                        style.visibility !== "hidden" && style.display !== "none",
                    hasImage: !!a.querySelector("img"),
                    seeMore: text.toLowerCase() === "see more" ||
                        a.classList.contains("see-more")
                }};
            }});
            return {{ status: "cards", cards: cards }};
        }})()
        "#,
        enumeration = enumeration_js(section_id)
    )
}

/// Build the click script for one discovered card. Scroll failures must not
/// abort the click.
pub fn click_js(section_id: &str, index: usize) -> String {
    format!(
        r#"
        (function () {{
            {enumeration}
            const el = anchors[{index}];
            if (!el) return false;
            try {{ el.scrollIntoView({{ behavior: "smooth", block: "center" }}); }} catch (e) {{}}
            el.click();
            return true;
        }})()
        "#,
        enumeration = enumeration_js(section_id),
        index = index
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(index: usize, href: &str, text: &str) -> RawCard {
        RawCard {
            index,
            href: href.to_string(),
            text: text.to_string(),
            visible: true,
            has_image: true,
            see_more: false,
        }
    }

    #[test]
    fn test_filter_keeps_plain_task_tiles() {
        let cards = vec![
            card(0, "https://rewards.bing.com/quiz/a", "Daily quiz"),
            card(1, "https://rewards.bing.com/poll/b", "This or that"),
        ];
        let out = filter_cards(cards);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_filter_drops_invisible_and_imageless() {
        let mut hidden = card(0, "https://x.example/a", "Hidden tile");
        hidden.visible = false;
        let mut text_link = card(1, "https://x.example/b", "Plain link");
        text_link.has_image = false;

        assert!(filter_cards(vec![hidden, text_link]).is_empty());
    }

    #[test]
    fn test_filter_drops_see_more_and_earn_root() {
        let mut see_more = card(0, "https://rewards.bing.com/earn/all", "See more");
        see_more.see_more = true;
        let root = card(1, "https://rewards.bing.com/earn/", "Earn");
        let bare = card(2, "https://rewards.bing.com", "Rewards");

        assert!(filter_cards(vec![see_more, root, bare]).is_empty());
    }

    #[test]
    fn test_filter_drops_completed_tasks() {
        let done = card(0, "https://x.example/a", "Daily quiz \u{2713} Completed");
        let open = card(1, "https://x.example/b", "Daily quiz");
        let out = filter_cards(vec![done, open]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].index, 1);
    }

    #[test]
    fn test_filter_dedups_by_href_and_normalized_text() {
        let first = card(0, "https://x.example/a", "Daily   Quiz");
        let dup = card(1, "https://x.example/a", "daily quiz");
        let other_href = card(2, "https://x.example/b", "daily quiz");

        let out = filter_cards(vec![first, dup, other_href]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].index, 0);
        assert_eq!(out[1].index, 2);
    }

    #[test]
    fn test_section_for_path() {
        assert_eq!(section_for_path("/earn"), "more-activities");
        assert_eq!(section_for_path("/"), "daily-sets");
        assert_eq!(section_for_path("/redeem"), "daily-sets");
    }

    #[test]
    fn test_probe_outcome_deserializes_from_page_json() {
        let missing: ProbeOutcome =
            serde_json::from_value(serde_json::json!({ "status": "sectionMissing" })).unwrap();
        assert!(matches!(missing, ProbeOutcome::SectionMissing));

        let expanded: ProbeOutcome =
            serde_json::from_value(serde_json::json!({ "status": "expanded" })).unwrap();
        assert!(matches!(expanded, ProbeOutcome::Expanded));

        let cards: ProbeOutcome = serde_json::from_value(serde_json::json!({
            "status": "cards",
            "cards": [{
                "index": 0,
                "href": "https://x.example/a",
                "text": "Daily quiz",
                "visible": true,
                "hasImage": true,
                "seeMore": false
            }]
        }))
        .unwrap();
        match cards {
            ProbeOutcome::Cards { cards } => assert_eq!(cards.len(), 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
