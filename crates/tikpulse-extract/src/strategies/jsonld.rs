//! Strategy 2: schema.org JSON-LD extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{CountField, Page};
use crate::count::{float_to_count, parse_count_value};
use crate::types::ExtractionResult;

static LD_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?$").expect("valid regex")
});

/// Interaction-type substrings, checked in order.
const INTERACTION_TYPES: &[(&str, CountField)] = &[
    ("Watch", CountField::Views),
    ("Like", CountField::Likes),
    ("Comment", CountField::Comments),
    ("Share", CountField::Shares),
];

pub(crate) fn extract_linked_data(page: &Page<'_>) -> ExtractionResult {
    let mut nodes = Vec::new();
    for cap in LD_SCRIPT_RE.captures_iter(page.raw) {
        let Some(text) = cap.get(1) else {
            continue;
        };
        match serde_json::from_str::<Value>(text.as_str().trim()) {
            Ok(value) => collect_nodes(value, &mut nodes),
            Err(e) => tracing::debug!(error = %e, "skipping malformed JSON-LD block"),
        }
    }

    // Prefer the VideoObject; otherwise the first node carrying statistics.
    let node = nodes
        .iter()
        .find(|n| has_type(n, "VideoObject"))
        .or_else(|| nodes.iter().find(|n| n.get("interactionStatistic").is_some()));
    let Some(node) = node else {
        return ExtractionResult::default();
    };

    node_to_result(node)
}

/// Accept a top-level object, an array, or `@graph` containers.
fn collect_nodes(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_nodes(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                collect_nodes(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

/// `@type` may be a plain string or an array of strings.
fn has_type(node: &Value, wanted: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(wanted),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case(wanted)),
        _ => false,
    }
}

fn node_to_result(node: &Value) -> ExtractionResult {
    let mut result = ExtractionResult::default();

    let stats: Vec<&Value> = match node.get("interactionStatistic") {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(single @ Value::Object(_)) => vec![single],
        _ => Vec::new(),
    };
    for stat in stats {
        let Some(kind) = interaction_type(stat) else {
            continue;
        };
        let Some((_, field)) = INTERACTION_TYPES.iter().find(|(needle, _)| kind.contains(needle))
        else {
            continue;
        };
        let slot = field.slot(&mut result.counts);
        if *slot == 0 {
            *slot = stat.get("userInteractionCount").map_or(0, parse_count_value);
        }
    }
    if result.counts.comments == 0 {
        result.counts.comments = node.get("commentCount").map_or(0, parse_count_value);
    }

    result.description = ["description", "caption"]
        .iter()
        .filter_map(|k| node.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string();
    result.thumbnail = ["thumbnailUrl", "thumbnail"]
        .iter()
        .find_map(|k| node.get(*k).and_then(url_of))
        .unwrap_or_default();
    result.duration_seconds = node
        .get("duration")
        .and_then(Value::as_str)
        .map_or(0, parse_iso_duration);

    result
}

/// `interactionType` is either a URL/string or a `{ "@type": ... }` object.
fn interaction_type(stat: &Value) -> Option<&str> {
    match stat.get("interactionType")? {
        Value::String(s) => Some(s.as_str()),
        obj @ Value::Object(_) => obj.get("@type").and_then(Value::as_str),
        _ => None,
    }
}

/// Thumbnails appear as a string, a list of strings, or an `ImageObject`.
fn url_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(url_of),
        Value::Object(_) => value
            .get("url")
            .or_else(|| value.get("contentUrl"))
            .and_then(url_of),
        _ => None,
    }
}

/// Convert an ISO-8601 duration (`PT31S`, `PT1M5S`, `PT1H`) to whole
/// seconds. Anything else is 0.
fn parse_iso_duration(raw: &str) -> u64 {
    let Some(caps) = ISO_DURATION_RE.captures(raw.trim()) else {
        return 0;
    };
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    let seconds = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map_or(0, float_to_count);
    part(1)
        .saturating_mul(3600)
        .saturating_add(part(2).saturating_mul(60))
        .saturating_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ld_page(json: &str) -> String {
        format!(r#"<html><script type="application/ld+json">{json}</script></html>"#)
    }

    #[test]
    fn reads_video_object_statistics() {
        let html = ld_page(
            r#"{
                "@context": "https://schema.org",
                "@type": "VideoObject",
                "description": "Quick pasta",
                "thumbnailUrl": ["https://cdn.example/t.jpg"],
                "duration": "PT45S",
                "commentCount": "33",
                "interactionStatistic": [
                    {"@type": "InteractionCounter", "interactionType": {"@type": "https://schema.org/WatchAction"}, "userInteractionCount": 5000},
                    {"@type": "InteractionCounter", "interactionType": "https://schema.org/LikeAction", "userInteractionCount": "250"}
                ]
            }"#,
        );
        let result = extract_linked_data(&Page::new(&html));
        assert_eq!(result.counts.views, 5000);
        assert_eq!(result.counts.likes, 250);
        assert_eq!(result.counts.comments, 33);
        assert_eq!(result.description, "Quick pasta");
        assert_eq!(result.thumbnail, "https://cdn.example/t.jpg");
        assert_eq!(result.duration_seconds, 45);
    }

    #[test]
    fn single_interaction_statistic_object_is_accepted() {
        let html = ld_page(
            r#"{"@type": ["VideoObject"], "caption": "c", "thumbnail": {"url": "https://cdn.example/x.jpg"},
                "interactionStatistic": {"interactionType": "WatchAction", "userInteractionCount": 9}}"#,
        );
        let result = extract_linked_data(&Page::new(&html));
        assert_eq!(result.counts.views, 9);
        assert_eq!(result.description, "c");
        assert_eq!(result.thumbnail, "https://cdn.example/x.jpg");
    }

    #[test]
    fn video_object_inside_graph_is_preferred() {
        let html = ld_page(
            r#"{"@graph": [
                {"@type": "BreadcrumbList"},
                {"@type": "VideoObject", "description": "in graph"}
            ]}"#,
        );
        let result = extract_linked_data(&Page::new(&html));
        assert_eq!(result.description, "in graph");
    }

    #[test]
    fn malformed_block_contributes_nothing() {
        let html = ld_page(r#"{"@type": "VideoObject", "description": "#);
        assert_eq!(extract_linked_data(&Page::new(&html)), ExtractionResult::default());
    }

    #[test]
    fn iso_durations() {
        assert_eq!(parse_iso_duration("PT31S"), 31);
        assert_eq!(parse_iso_duration("PT1M5S"), 65);
        assert_eq!(parse_iso_duration("pt1h"), 3600);
        assert_eq!(parse_iso_duration("PT12.6S"), 13);
        assert_eq!(parse_iso_duration("31"), 0);
        assert_eq!(parse_iso_duration(""), 0);
    }
}
