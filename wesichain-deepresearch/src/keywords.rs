use std::collections::BTreeSet;

use crate::state::WebResearchResult;

const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "what", "when", "where", "which", "while", "about",
    "there", "their", "would", "could", "should", "into", "than", "then", "them", "been", "being",
    "does", "doing", "your", "yours", "were", "very",
];

/// Tokens of length ≥ 4, lowercased, stopword-free, deduped — spec §4.8.
/// Pure in the query list: identical input yields an identical set (spec §8).
pub fn extract_keywords(queries: &[String]) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();
    for query in queries {
        for raw in query.split(|c: char| !c.is_alphanumeric()) {
            let token = raw.to_lowercase();
            if token.chars().count() < 4 {
                continue;
            }
            if STOPWORDS.contains(&token.as_str()) {
                continue;
            }
            keywords.insert(token);
        }
    }
    keywords
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cur = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j - 1])
            };
            prev_diag = cur;
        }
    }
    row[b.len()]
}

/// Cheap O(1) length-based pre-filter before the fuzzy comparison: tokens
/// whose lengths differ by more than this can never be a near-match, so the
/// expensive Levenshtein pass never runs on them.
const LENGTH_PREFILTER_SLACK: usize = 2;

fn fuzzy_token_matches(token: &str, keyword: &str) -> bool {
    if token == keyword || token.contains(keyword) || keyword.contains(token) {
        return true;
    }
    let len_diff = token.chars().count().abs_diff(keyword.chars().count());
    if len_diff > LENGTH_PREFILTER_SLACK {
        return false;
    }
    levenshtein(token, keyword) <= 1
}

fn summary_matches_keywords(text: &str, keywords: &BTreeSet<String>) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= 4)
        .any(|token| keywords.iter().any(|k| fuzzy_token_matches(&token, k)))
}

pub struct ValidationOutcome {
    pub kept: Vec<WebResearchResult>,
    pub feedback: Option<String>,
}

/// Coarse relevance filter (spec §4.8). Falls back to retaining everything
/// when every summary fails, per the Validation fallback law of spec §8.
pub fn validate_web_results(
    queries: &[String],
    summaries: Vec<WebResearchResult>,
) -> ValidationOutcome {
    if summaries.is_empty() {
        return ValidationOutcome {
            kept: summaries,
            feedback: None,
        };
    }

    let keywords = extract_keywords(queries);
    let (matched, dropped): (Vec<_>, Vec<_>) = summaries
        .into_iter()
        .partition(|r| summary_matches_keywords(&r.text, &keywords));

    if matched.is_empty() {
        let mut all = dropped;
        all.sort_by_key(|r| r.segment_id);
        return ValidationOutcome {
            kept: all,
            feedback: Some(
                "all web research results failed keyword validation; retaining unfiltered results"
                    .to_string(),
            ),
        };
    }

    let feedback = if dropped.is_empty() {
        None
    } else {
        Some(format!(
            "{} web research result(s) dropped by keyword validation",
            dropped.len()
        ))
    };

    ValidationOutcome {
        kept: matched,
        feedback,
    }
}
