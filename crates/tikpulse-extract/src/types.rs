//! Result types produced by the extraction pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// Raw engagement counters for one video. Zero means "unknown or none".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,
}

impl Counts {
    /// `likes + comments + shares + saves`, saturating on overflow.
    #[must_use]
    pub fn total_interactions(&self) -> u64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.shares)
            .saturating_add(self.saves)
    }

    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        *self == Counts::default()
    }

    /// Copy every counter that is still zero here from `other`.
    ///
    /// Returns the names of the counters that were filled.
    pub fn fill_missing(&mut self, other: &Counts) -> Vec<&'static str> {
        let mut filled = Vec::new();
        for (name, slot, value) in [
            ("views", &mut self.views, other.views),
            ("likes", &mut self.likes, other.likes),
            ("comments", &mut self.comments, other.comments),
            ("shares", &mut self.shares, other.shares),
            ("saves", &mut self.saves, other.saves),
        ] {
            if *slot == 0 && value > 0 {
                *slot = value;
                filled.push(name);
            }
        }
        filled
    }
}

/// Ordered, case-insensitively deduplicated set of `#tag` tokens.
///
/// Every element is lower-case, starts with `#`, and contains no whitespace.
/// Tokens that cannot satisfy that shape are dropped on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Hashtags(Vec<String>);

impl Hashtags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and insert a tag. Accepts `"#Fun"`, `"fun"` or `"##fun"`.
    ///
    /// Returns `true` when the tag was new.
    pub fn insert(&mut self, raw: &str) -> bool {
        let body = raw.trim().trim_start_matches('#').to_lowercase();
        if body.is_empty() || body.chars().any(char::is_whitespace) {
            return false;
        }
        let tag = format!("#{body}");
        if self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for Hashtags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Hashtags::new();
        for raw in iter {
            tags.insert(raw.as_ref());
        }
        tags
    }
}

impl<'a> IntoIterator for &'a Hashtags {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Deserialization goes through `insert` so stored data cannot break the
// set invariants.
impl<'de> Deserialize<'de> for Hashtags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.iter().collect())
    }
}

/// Everything the cascade recovers from one video page.
///
/// Missing fields hold their zero value, never an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub description: String,
    pub hashtags: Hashtags,
    pub thumbnail: String,
    pub duration_seconds: u64,
    pub counts: Counts,
}

impl ExtractionResult {
    /// First-non-empty-wins merge: fill only the fields still empty here.
    ///
    /// Returns the names of the fields (and counters) that were filled.
    pub fn fill_missing(&mut self, other: ExtractionResult) -> Vec<&'static str> {
        let mut filled = self.counts.fill_missing(&other.counts);

        if self.description.is_empty() && !other.description.is_empty() {
            self.description = other.description;
            filled.push("description");
        }
        if self.thumbnail.is_empty() && !other.thumbnail.is_empty() {
            self.thumbnail = other.thumbnail;
            filled.push("thumbnail");
        }
        if self.duration_seconds == 0 && other.duration_seconds > 0 {
            self.duration_seconds = other.duration_seconds;
            filled.push("duration_seconds");
        }
        if self.hashtags.is_empty() && !other.hashtags.is_empty() {
            self.hashtags = other.hashtags;
            filled.push("hashtags");
        }

        filled
    }

    /// True when no numeric strategy recovered a view count.
    #[must_use]
    pub fn has_no_views(&self) -> bool {
        self.counts.views == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtags_insert_normalizes_and_dedupes() {
        let mut tags = Hashtags::new();
        assert!(tags.insert("#Fun"));
        assert!(!tags.insert("fun"));
        assert!(!tags.insert("##FUN"));
        assert!(tags.insert("new"));
        assert_eq!(tags.as_slice(), ["#fun", "#new"]);
    }

    #[test]
    fn hashtags_reject_empty_and_whitespace_tokens() {
        let mut tags = Hashtags::new();
        assert!(!tags.insert("#"));
        assert!(!tags.insert("   "));
        assert!(!tags.insert("two words"));
        assert!(tags.is_empty());
    }

    #[test]
    fn hashtags_deserialize_enforces_invariants() {
        let tags: Hashtags = serde_json::from_str(r##"["#A", "a", "b c", "#b"]"##).unwrap();
        assert_eq!(tags.as_slice(), ["#a", "#b"]);
    }

    #[test]
    fn counts_total_interactions_excludes_views() {
        let counts = Counts {
            views: 1_000,
            likes: 50,
            comments: 20,
            shares: 10,
            saves: 20,
        };
        assert_eq!(counts.total_interactions(), 100);
    }

    #[test]
    fn fill_missing_never_overwrites_populated_fields() {
        let mut acc = ExtractionResult {
            counts: Counts {
                views: 100,
                ..Counts::default()
            },
            ..ExtractionResult::default()
        };
        let later = ExtractionResult {
            description: "x".to_string(),
            counts: Counts {
                views: 999,
                likes: 7,
                ..Counts::default()
            },
            ..ExtractionResult::default()
        };

        let filled = acc.fill_missing(later);

        assert_eq!(acc.counts.views, 100);
        assert_eq!(acc.counts.likes, 7);
        assert_eq!(acc.description, "x");
        assert_eq!(filled, vec!["likes", "description"]);
    }

    #[test]
    fn extraction_result_serializes_every_field() {
        let json = serde_json::to_value(ExtractionResult::default()).unwrap();
        for key in ["description", "hashtags", "thumbnail", "duration_seconds", "counts"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["counts"]["saves"], 0);
    }
}
