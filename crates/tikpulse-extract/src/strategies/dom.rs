//! Strategy 4: automation-attribute DOM selectors.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::{CountField, Page};
use crate::count::parse_count;
use crate::types::ExtractionResult;

const COUNTER_SELECTORS: &[(CountField, &[&str])] = &[
    (
        CountField::Views,
        &[
            r#"[data-e2e="video-views"]"#,
            r#"[data-e2e="play-count"]"#,
            r#"[data-e2e="view-count"]"#,
            ".video-count",
            ".play-count",
        ],
    ),
    (
        CountField::Likes,
        &[r#"[data-e2e="like-count"]"#, r#"[data-e2e="browse-like-count"]"#],
    ),
    (
        CountField::Comments,
        &[r#"[data-e2e="comment-count"]"#, r#"[data-e2e="browse-comment-count"]"#],
    ),
    (CountField::Shares, &[r#"[data-e2e="share-count"]"#]),
    (
        CountField::Saves,
        &[r#"[data-e2e="favorite-count"]"#, r#"[data-e2e="undefined-count"]"#],
    ),
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"[data-e2e="browse-video-desc"]"#,
    r#"[data-e2e="video-desc"]"#,
];

fn compile(sources: &[&str]) -> Vec<Selector> {
    sources.iter().filter_map(|s| Selector::parse(s).ok()).collect()
}

static COUNTERS: LazyLock<Vec<(CountField, Vec<Selector>)>> = LazyLock::new(|| {
    COUNTER_SELECTORS
        .iter()
        .map(|(field, sources)| (*field, compile(sources)))
        .collect()
});

static DESCRIPTION: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(DESCRIPTION_SELECTORS));

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub(crate) fn extract_dom_selectors(page: &Page<'_>) -> ExtractionResult {
    let mut result = ExtractionResult::default();

    for (field, selectors) in COUNTERS.iter() {
        let value = selectors
            .iter()
            .flat_map(|sel| page.doc.select(sel))
            .map(|el| parse_count(&element_text(el)))
            .find(|n| *n > 0);
        if let Some(n) = value {
            *field.slot(&mut result.counts) = n;
        }
    }

    result.description = DESCRIPTION
        .iter()
        .flat_map(|sel| page.doc.select(sel))
        .map(element_text)
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_counters_from_automation_attributes() {
        let html = r#"
            <div>
              <strong data-e2e="like-count">12.3K</strong>
              <strong data-e2e="comment-count">1,234</strong>
              <strong data-e2e="share-count">87</strong>
              <strong data-e2e="undefined-count">4,5M</strong>
              <strong data-e2e="video-views">2.1M</strong>
            </div>"#;
        let result = extract_dom_selectors(&Page::new(html));
        assert_eq!(result.counts.views, 2_100_000);
        assert_eq!(result.counts.likes, 12_300);
        assert_eq!(result.counts.comments, 1_234);
        assert_eq!(result.counts.shares, 87);
        assert_eq!(result.counts.saves, 4_500_000);
    }

    #[test]
    fn class_fallback_for_views() {
        let html = r#"<span class="video-count">950</span>"#;
        assert_eq!(extract_dom_selectors(&Page::new(html)).counts.views, 950);
    }

    #[test]
    fn empty_or_zero_elements_are_skipped() {
        let html = r#"
            <strong data-e2e="like-count"></strong>
            <strong data-e2e="browse-like-count">40</strong>"#;
        assert_eq!(extract_dom_selectors(&Page::new(html)).counts.likes, 40);
    }

    #[test]
    fn reads_description_text() {
        let html = r#"<h1 data-e2e="browse-video-desc"><span>Hello </span><a>#world</a></h1>"#;
        assert_eq!(
            extract_dom_selectors(&Page::new(html)).description,
            "Hello #world"
        );
    }
}
