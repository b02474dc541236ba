//! Strategy 3: regex brute force over the raw document text.

use std::sync::LazyLock;

use regex::Regex;

use super::{CountField, Page};
use crate::types::ExtractionResult;

/// Key spellings per counter: camelCase first, then snake_case, then the
/// plural and capitalised forms seen in older payloads.
const COUNTER_KEYS: &[(CountField, &[&str])] = &[
    (
        CountField::Views,
        &[
            "playCount",
            "viewCount",
            "play_count",
            "view_count",
            "views",
            "PlayCount",
        ],
    ),
    (
        CountField::Likes,
        &["diggCount", "likeCount", "digg_count", "like_count", "likes"],
    ),
    (
        CountField::Comments,
        &["commentCount", "comment_count", "comments"],
    ),
    (CountField::Shares, &["shareCount", "share_count", "shares"]),
    (
        CountField::Saves,
        &[
            "collectCount",
            "saveCount",
            "collect_count",
            "save_count",
            "saves",
        ],
    ),
];

/// One compiled pattern per key. Matches `"key":123`, `key: "123"` and the
/// backslash-escaped form found inside JSON-in-JSON (`\"key\":123`).
static COUNTER_PATTERNS: LazyLock<Vec<(CountField, Vec<Regex>)>> = LazyLock::new(|| {
    COUNTER_KEYS
        .iter()
        .map(|(field, keys)| {
            let patterns = keys
                .iter()
                .filter_map(|key| {
                    Regex::new(&format!(
                        r#"(?:^|[^A-Za-z0-9_]){key}\\?["']?\s*:\s*\\?["']?(\d+)"#
                    ))
                    .ok()
                })
                .collect();
            (*field, patterns)
        })
        .collect()
});

/// For each counter, the first pattern (in key order) with a non-zero match
/// wins. Counters are independent of one another.
pub(crate) fn extract_regex_scan(page: &Page<'_>) -> ExtractionResult {
    let mut result = ExtractionResult::default();
    for (field, patterns) in COUNTER_PATTERNS.iter() {
        let found = patterns.iter().find_map(|re| {
            re.captures_iter(page.raw)
                .filter_map(|cap| cap.get(1)?.as_str().parse::<u64>().ok())
                .find(|n| *n > 0)
        });
        if let Some(n) = found {
            tracing::debug!(field = ?field, value = n, "regex scan matched counter");
            *field.slot(&mut result.counts) = n;
        }
    }
    result
}
