//! Query generation
//!
//! Builds the per-run query list: custom entries from the settings record
//! mixed with synthetic phrases assembled from a fixed word bank.

mod words;

use rand::Rng;

/// Probability of picking a custom entry over a synthetic phrase when the
/// custom list is non-empty.
const CUSTOM_BIAS: f64 = 0.6;

/// Parse the free-text custom query setting: newline or comma separated.
pub fn parse_custom_queries(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Pick a random element, biased towards the front of the slice.
fn random_from<'a, R: Rng>(rng: &mut R, arr: &'a [&'a str]) -> &'a str {
    let idx = (rng.gen::<f64>() * rng.gen::<f64>() * arr.len() as f64) as usize;
    arr[idx.min(arr.len() - 1)]
}

/// Assemble one synthetic phrase from one of five templates.
fn synthetic_query<R: Rng>(rng: &mut R) -> String {
    match rng.gen_range(0..5) {
        0 => format!(
            "{} {}",
            random_from(rng, words::ADJECTIVES),
            random_from(rng, words::NOUNS)
        ),
        1 => format!(
            "{} {}",
            random_from(rng, words::VERBS),
            random_from(rng, words::NOUNS)
        ),
        2 => format!(
            "{} in {}",
            random_from(rng, words::NOUNS),
            random_from(rng, words::TOPICS)
        ),
        3 => format!(
            "how to {} {}",
            random_from(rng, words::VERBS),
            random_from(rng, words::NOUNS)
        ),
        _ => format!(
            "{} {}",
            random_from(rng, words::TOPICS),
            random_from(rng, words::ADJECTIVES)
        ),
    }
}

/// Build `count` queries mixing the custom list with synthetic phrases.
pub fn build_queries(count: usize, custom: &[String]) -> Vec<String> {
    build_queries_with(&mut rand::thread_rng(), count, custom)
}

fn build_queries_with<R: Rng>(rng: &mut R, count: usize, custom: &[String]) -> Vec<String> {
    (0..count)
        .map(|_| {
            if !custom.is_empty() && rng.gen::<f64>() < CUSTOM_BIAS {
                let idx = (rng.gen::<f64>() * rng.gen::<f64>() * custom.len() as f64) as usize;
                custom[idx.min(custom.len() - 1)].clone()
            } else {
                synthetic_query(rng)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_custom_queries_splits_on_newline_and_comma() {
        let raw = "rust async runtime\nbest hiking boots, ferris the crab\n\n ,";
        let parsed = parse_custom_queries(raw);
        assert_eq!(
            parsed,
            vec!["rust async runtime", "best hiking boots", "ferris the crab"]
        );
    }

    #[test]
    fn test_parse_custom_queries_empty_input() {
        assert!(parse_custom_queries("").is_empty());
        assert!(parse_custom_queries(" \n , \n").is_empty());
    }

    #[test]
    fn test_build_queries_count() {
        let queries = build_queries(25, &[]);
        assert_eq!(queries.len(), 25);
        assert!(queries.iter().all(|q| !q.is_empty()));
    }

    #[test]
    fn test_build_queries_mixes_custom_and_synthetic() {
        let mut rng = StdRng::seed_from_u64(7);
        let custom = vec!["pinned-custom-query".to_string()];
        let queries = build_queries_with(&mut rng, 1000, &custom);

        let custom_hits = queries.iter().filter(|q| *q == "pinned-custom-query").count();
        // With a 0.6 bias over 1000 draws, both kinds show up.
        assert!(custom_hits > 0, "expected some custom entries");
        assert!(custom_hits < 1000, "expected some synthetic entries");
    }

    #[test]
    fn test_synthetic_queries_are_multi_word() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let q = synthetic_query(&mut rng);
            assert!(q.split_whitespace().count() >= 2, "bad phrase: {}", q);
        }
    }
}
