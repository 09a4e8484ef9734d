//! Tab reconciliation
//!
//! After a rewards page has been processed, every tab it spawned needs to
//! go: direct and transitive opener descendants of the main tab, plus any
//! other newly appeared tab parked on a reward-related host.

use std::collections::HashSet;

use url::Url;

use crate::browser::TabRecord;

/// Hosts that reward-task clicks land on.
const REWARD_HOSTS: &[&str] = &["bing.com", "microsoft.com", "msn.com"];

/// Identities of all tabs whose opener chain leads back to `root`,
/// directly or transitively.
pub fn descendants_of(root: &str, tabs: &[TabRecord]) -> HashSet<String> {
    let mut reached: HashSet<String> = HashSet::new();
    reached.insert(root.to_string());

    // Opener edges form a forest; one pass per depth level until stable.
    loop {
        let before = reached.len();
        for tab in tabs {
            if let Some(opener) = &tab.opener {
                if reached.contains(opener) {
                    reached.insert(tab.id.clone());
                }
            }
        }
        if reached.len() == before {
            break;
        }
    }

    reached.remove(root);
    reached
}

/// Whether a URL points at a reward-related host.
pub fn is_reward_host(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    REWARD_HOSTS
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: &str, opener: Option<&str>, url: &str) -> TabRecord {
        TabRecord {
            id: id.to_string(),
            opener: opener.map(|o| o.to_string()),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_direct_descendants() {
        let tabs = vec![
            tab("main", None, "https://rewards.bing.com/"),
            tab("child", Some("main"), "https://www.bing.com/quiz"),
            tab("unrelated", None, "https://example.com/"),
        ];
        let d = descendants_of("main", &tabs);
        assert_eq!(d, HashSet::from(["child".to_string()]));
    }

    #[test]
    fn test_transitive_descendants() {
        let tabs = vec![
            tab("main", None, "https://rewards.bing.com/"),
            tab("child", Some("main"), "https://www.bing.com/quiz"),
            tab("grandchild", Some("child"), "https://www.msn.com/article"),
            tab("other", Some("unrelated"), "https://example.com/"),
        ];
        let d = descendants_of("main", &tabs);
        assert!(d.contains("child"));
        assert!(d.contains("grandchild"));
        assert!(!d.contains("other"));
        assert!(!d.contains("main"));
    }

    #[test]
    fn test_descendants_ignore_ordering() {
        // Grandchild listed before its parent still resolves.
        let tabs = vec![
            tab("grandchild", Some("child"), "https://www.bing.com/a"),
            tab("child", Some("main"), "https://www.bing.com/b"),
        ];
        let d = descendants_of("main", &tabs);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_reward_host_matching() {
        assert!(is_reward_host("https://rewards.bing.com/earn"));
        assert!(is_reward_host("https://www.bing.com/search?q=x"));
        assert!(is_reward_host("https://www.msn.com/en-us/news"));
        assert!(is_reward_host("https://account.microsoft.com/rewards"));
        assert!(!is_reward_host("https://example.com/bing.com"));
        assert!(!is_reward_host("https://notbing.com/"));
        assert!(!is_reward_host("not a url"));
    }
}
