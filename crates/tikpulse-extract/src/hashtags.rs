//! Hashtag mining from free text.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Hashtags;

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("valid regex"));

/// Extract `#word` tokens from `text`, lower-cased and deduplicated in
/// first-seen order. Word characters are Unicode-aware, so `#café` survives
/// intact.
#[must_use]
pub fn extract_hashtags(text: &str) -> Hashtags {
    HASHTAG_RE.find_iter(text).map(|m| m.as_str()).collect()
}
