//! Strategy 5: social-preview metadata backfill. Runs on every page.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::Page;
use crate::count::parse_count;
use crate::hashtags::extract_hashtags;
use crate::types::ExtractionResult;

static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").expect("valid selector"));

const DESCRIPTION_KEYS: &[&str] = &["og:description", "description", "twitter:description"];
const THUMBNAIL_KEYS: &[&str] = &["og:image", "og:image:secure_url", "twitter:image"];
const DURATION_KEYS: &[&str] = &["video:duration", "og:video:duration"];

/// Content of the first non-empty `<meta>` whose `property` or `name`
/// matches one of `keys`, tried in key order.
fn meta_content(doc: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        doc.select(&META).find_map(|el| {
            let attrs = el.value();
            let name = attrs.attr("property").or_else(|| attrs.attr("name"))?;
            if !name.eq_ignore_ascii_case(key) {
                return None;
            }
            let content = attrs.attr("content")?.trim();
            (!content.is_empty()).then(|| content.to_string())
        })
    })
}

/// Fill description, thumbnail, duration and hashtags if still empty.
/// Hashtags are mined from the final description.
pub(crate) fn backfill_metadata(page: &Page<'_>, acc: &mut ExtractionResult) -> Vec<&'static str> {
    let mut filled = Vec::new();

    if acc.description.is_empty() {
        if let Some(description) = meta_content(&page.doc, DESCRIPTION_KEYS) {
            acc.description = description;
            filled.push("description");
        }
    }
    if acc.thumbnail.is_empty() {
        if let Some(thumbnail) = meta_content(&page.doc, THUMBNAIL_KEYS) {
            acc.thumbnail = thumbnail;
            filled.push("thumbnail");
        }
    }
    if acc.duration_seconds == 0 {
        let duration = meta_content(&page.doc, DURATION_KEYS).map_or(0, |s| parse_count(&s));
        if duration > 0 {
            acc.duration_seconds = duration;
            filled.push("duration_seconds");
        }
    }
    if acc.hashtags.is_empty() {
        acc.hashtags = extract_hashtags(&acc.description);
        if !acc.hashtags.is_empty() {
            filled.push("hashtags");
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD: &str = r#"
        <html><head>
          <meta name="description" content="plain description">
          <meta property="og:description" content="Sunset vibes #Travel #sunset">
          <meta property="og:image" content="https://cdn.example/og.jpg">
          <meta property="video:duration" content="27">
        </head></html>"#;

    #[test]
    fn backfills_empty_fields_in_priority_order() {
        let page = Page::new(HEAD);
        let mut acc = ExtractionResult::default();
        let filled = backfill_metadata(&page, &mut acc);

        assert_eq!(acc.description, "Sunset vibes #Travel #sunset");
        assert_eq!(acc.thumbnail, "https://cdn.example/og.jpg");
        assert_eq!(acc.duration_seconds, 27);
        assert_eq!(acc.hashtags.as_slice(), ["#travel", "#sunset"]);
        assert_eq!(
            filled,
            vec!["description", "thumbnail", "duration_seconds", "hashtags"]
        );
    }

    #[test]
    fn never_overwrites_populated_fields() {
        let page = Page::new(HEAD);
        let mut acc = ExtractionResult {
            description: "from state #kept".to_string(),
            thumbnail: "https://cdn.example/state.jpg".to_string(),
            ..ExtractionResult::default()
        };
        backfill_metadata(&page, &mut acc);

        assert_eq!(acc.description, "from state #kept");
        assert_eq!(acc.thumbnail, "https://cdn.example/state.jpg");
        assert_eq!(acc.hashtags.as_slice(), ["#kept"]);
    }

    #[test]
    fn twitter_tags_are_a_last_resort() {
        let page = Page::new(
            r#"<meta name="twitter:description" content="tw"><meta name="twitter:image" content="https://cdn.example/tw.jpg">"#,
        );
        let mut acc = ExtractionResult::default();
        backfill_metadata(&page, &mut acc);
        assert_eq!(acc.description, "tw");
        assert_eq!(acc.thumbnail, "https://cdn.example/tw.jpg");
    }
}
