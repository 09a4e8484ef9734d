//! Search actor
//!
//! Reuses one background tab for every search action, recreating it when it
//! has been closed out from under us. Queries are typed character by
//! character inside the page so the engine's own suggestion machinery fires;
//! when the injected path fails for any reason, the query is submitted by
//! navigating straight to the results URL instead.

use std::sync::Arc;

use chromiumoxide::Page;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserSession};

const SEARCH_HOME: &str = "https://www.bing.com/";
const SEARCH_URL_PREFIX: &str = "https://www.bing.com/search?q=";
const INPUT_SELECTOR: &str = "#sb_form_q, input[name='q']";

/// Base per-character typing delay; the script adds 0-60ms of jitter on top.
const PER_CHAR_DELAY_MS: u32 = 80;

/// Search actor owning the singleton search tab
pub struct SearchActor {
    session: Arc<BrowserSession>,
    tab: Mutex<Option<Page>>,
}

impl SearchActor {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self {
            session,
            tab: Mutex::new(None),
        }
    }

    /// Identity of the singleton search tab, if one is currently held.
    pub async fn tab_id(&self) -> Option<String> {
        self.tab
            .lock()
            .await
            .as_ref()
            .map(|p| p.target_id().as_ref().to_string())
    }

    /// Open (or reuse) the search tab and submit one query.
    pub async fn open_and_search(&self, query: &str) -> Result<(), BrowserError> {
        debug!("Searching for: {}", query);
        let page = self.acquire_tab().await?;

        let typed = match self
            .session
            .wait_for_load(&page, self.session.load_timeout())
            .await
        {
            Ok(()) => match self.session.evaluate(&page, &typing_js(query)).await {
                Ok(result) => {
                    let ok = result.get("ok").and_then(|v| v.as_bool()) == Some(true);
                    if !ok {
                        let reason = result
                            .get("reason")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        warn!("Typed search did not run ({})", reason);
                    }
                    ok
                }
                Err(e) => {
                    warn!("Typed search injection failed: {}", e);
                    false
                }
            },
            Err(e) => {
                warn!("Search page load wait gave up: {}", e);
                false
            }
        };

        if !typed {
            let url = format!("{}{}", SEARCH_URL_PREFIX, urlencoding::encode(query));
            info!("Falling back to direct search navigation");
            self.session.navigate(&page, &url).await?;
        }

        Ok(())
    }

    /// Reuse the singleton tab if it still resolves, otherwise create a new
    /// one. Either way the tab ends up on the search home page, unfocused.
    async fn acquire_tab(&self) -> Result<Page, BrowserError> {
        let mut guard = self.tab.lock().await;

        if let Some(page) = guard.as_ref() {
            match self.session.navigate(page, SEARCH_HOME).await {
                Ok(()) => return Ok(page.clone()),
                Err(e) => {
                    info!("Search tab gone ({}), recreating", e);
                    *guard = None;
                }
            }
        }

        let page = self.session.open_tab(SEARCH_HOME, true).await?;
        *guard = Some(page.clone());
        Ok(page)
    }
}

/// Escape a query for embedding in a double-quoted JS string literal.
fn js_escape(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Build the injected typing procedure: clear the box, type character by
/// character with jittered delays firing an input event per character, then
/// synthesize Enter and submit the enclosing form as a fallback.
fn typing_js(query: &str) -> String {
    format!(
        r#"
        (async function () {{
            function sleep(ms) {{ return new Promise(r => setTimeout(r, ms)); }}
            const input = document.querySelector("{selector}");
            if (!input) return {{ ok: false, reason: "input_not_found" }};

            input.focus();
            input.value = "";
            input.dispatchEvent(new Event("input", {{ bubbles: true }}));

            const query = "{query}";
            for (const ch of query.split("")) {{
                input.value += ch;
                input.dispatchEvent(new Event("input", {{ bubbles: true }}));
                await sleep({delay} + Math.floor(Math.random() * 60));
            }}

            const opts = {{ key: "Enter", code: "Enter", keyCode: 13, which: 13, bubbles: true }};
            input.dispatchEvent(new KeyboardEvent("keydown", opts));
            input.dispatchEvent(new KeyboardEvent("keypress", opts));
            input.dispatchEvent(new KeyboardEvent("keyup", opts));

            const form = input.closest("form");
            if (form) form.submit();
            return {{ ok: true }};
        }})()
        "#,
        selector = INPUT_SELECTOR,
        query = js_escape(query),
        delay = PER_CHAR_DELAY_MS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_escape_neutralizes_quotes_and_backslashes() {
        assert_eq!(js_escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(js_escape(r"back\slash"), r"back\\slash");
        assert_eq!(js_escape("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn test_typing_script_embeds_escaped_query() {
        let script = typing_js(r#"rust "ownership" rules"#);
        assert!(script.contains(r#"const query = "rust \"ownership\" rules";"#));
        assert!(script.contains("#sb_form_q"));
        assert!(!script.contains(r#"const query = "rust "ownership""#));
    }

    #[test]
    fn test_fallback_url_encoding() {
        let url = format!("{}{}", SEARCH_URL_PREFIX, urlencoding::encode("a b&c"));
        assert_eq!(url, "https://www.bing.com/search?q=a%20b%26c");
    }
}
