//! Strategy 1: embedded page-state walk.

use serde_json::Value;

use super::{CountField, Page};
use crate::count::parse_count_value;
use crate::state::{locate_embedded_state, STATE_CONTAINER_IDS};
use crate::types::{Counts, ExtractionResult, Hashtags};

/// Legacy maps of `id -> item` (or lists of items).
const ITEM_COLLECTIONS: &[&str] = &["ItemModule", "ItemList"];

/// Item location in the rehydration layout.
const REHYDRATION_ITEM_POINTER: &str =
    "/__DEFAULT_SCOPE__/webapp.video-detail/itemInfo/itemStruct";

/// Statistics containers, in the order they have been renamed.
const STATS_CONTAINERS: &[&str] = &["stats", "statsV2", "statistics"];

/// Known key spellings per counter, preferred first.
const COUNTER_ALIASES: &[(CountField, &[&str])] = &[
    (CountField::Views, &["playCount", "viewCount", "play_count"]),
    (CountField::Likes, &["diggCount", "likeCount", "digg_count"]),
    (CountField::Comments, &["commentCount", "comment_count"]),
    (CountField::Shares, &["shareCount", "share_count"]),
    (CountField::Saves, &["collectCount", "saveCount", "collect_count"]),
];

const ITEM_MARKERS: &[&str] = &["stats", "statsV2", "statistics", "desc", "video"];

pub(crate) fn extract_structured_state(page: &Page<'_>) -> ExtractionResult {
    let Some(state) = locate_embedded_state(page.raw, STATE_CONTAINER_IDS) else {
        tracing::debug!("no embedded state container");
        return ExtractionResult::default();
    };
    let Some(item) = find_item(&state) else {
        tracing::debug!("embedded state has no video item");
        return ExtractionResult::default();
    };

    let video = item.get("video");
    let duration_seconds = video
        .and_then(|v| v.get("duration"))
        .or_else(|| item.get("music").and_then(|m| m.get("duration")))
        .map_or(0, parse_count_value);
    let thumbnail = video
        .and_then(|v| {
            ["cover", "dynamicCover", "originCover"]
                .iter()
                .find_map(|key| non_empty_str(v.get(*key)))
        })
        .unwrap_or_default();

    ExtractionResult {
        description: item_description(item),
        hashtags: item_hashtags(item),
        thumbnail,
        duration_seconds,
        counts: item_counts(item),
    }
}

/// First record that looks like a video item, in document order.
fn find_item(state: &Value) -> Option<&Value> {
    for key in ITEM_COLLECTIONS {
        let found = match state.get(*key) {
            Some(Value::Object(map)) => map.values().find(|v| looks_like_item(v)),
            Some(Value::Array(list)) => list.iter().find(|v| looks_like_item(v)),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    state
        .pointer(REHYDRATION_ITEM_POINTER)
        .filter(|v| looks_like_item(v))
}

fn looks_like_item(value: &Value) -> bool {
    value.is_object() && ITEM_MARKERS.iter().any(|k| value.get(*k).is_some())
}

/// Read every counter from the stats containers; per counter, the first
/// container and alias with a non-zero value wins.
pub(crate) fn item_counts(item: &Value) -> Counts {
    let mut counts = Counts::default();
    for (field, aliases) in COUNTER_ALIASES {
        let value = STATS_CONTAINERS
            .iter()
            .filter_map(|c| item.get(*c))
            .flat_map(|stats| aliases.iter().filter_map(move |a| stats.get(*a)))
            .map(parse_count_value)
            .find(|n| *n > 0)
            .unwrap_or(0);
        *field.slot(&mut counts) = value;
    }
    counts
}

pub(crate) fn item_description(item: &Value) -> String {
    ["desc", "description", "text"]
        .iter()
        .find_map(|key| non_empty_str(item.get(*key)))
        .unwrap_or_default()
}

/// Hashtags carried as structured entities: `textExtra[].hashtagName`, then
/// `challenges[].title`.
pub(crate) fn item_hashtags(item: &Value) -> Hashtags {
    let from = |list: &str, field: &str| -> Hashtags {
        item.get(list)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get(field).and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    };
    let tags = from("textExtra", "hashtagName");
    if tags.is_empty() {
        from("challenges", "title")
    } else {
        tags
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_with_state(id: &str, state: &Value) -> String {
        format!(r#"<html><head><script id="{id}" type="application/json">{state}</script></head></html>"#)
    }

    #[test]
    fn reads_legacy_item_module() {
        let state = json!({
            "ItemModule": {
                "7300000000000000001": {
                    "desc": "Morning run #Fitness",
                    "video": {"duration": 31, "cover": "https://cdn.example/cover.jpg"},
                    "stats": {"playCount": 1000, "diggCount": 50, "commentCount": 20, "shareCount": 10, "collectCount": 20},
                    "textExtra": [{"hashtagName": "Fitness"}, {"hashtagName": "run"}]
                }
            }
        });
        let html = page_with_state("SIGI_STATE", &state);
        let result = extract_structured_state(&Page::new(&html));

        assert_eq!(result.counts.views, 1000);
        assert_eq!(result.counts.saves, 20);
        assert_eq!(result.description, "Morning run #Fitness");
        assert_eq!(result.thumbnail, "https://cdn.example/cover.jpg");
        assert_eq!(result.duration_seconds, 31);
        assert_eq!(result.hashtags.as_slice(), ["#fitness", "#run"]);
    }

    #[test]
    fn reads_rehydration_item_struct_with_string_stats_v2() {
        let state = json!({
            "__DEFAULT_SCOPE__": {
                "webapp.video-detail": {
                    "itemInfo": {
                        "itemStruct": {
                            "desc": "recette",
                            "video": {"duration": 12, "originCover": "https://cdn.example/o.jpg"},
                            "statsV2": {"playCount": "45000", "diggCount": "1200"},
                            "challenges": [{"title": "Cuisine"}]
                        }
                    }
                }
            }
        });
        let html = page_with_state("__UNIVERSAL_DATA_FOR_REHYDRATION__", &state);
        let result = extract_structured_state(&Page::new(&html));

        assert_eq!(result.counts.views, 45_000);
        assert_eq!(result.counts.likes, 1_200);
        assert_eq!(result.thumbnail, "https://cdn.example/o.jpg");
        assert_eq!(result.hashtags.as_slice(), ["#cuisine"]);
    }

    #[test]
    fn later_stats_container_fills_counters_missing_from_earlier_one() {
        let item = json!({
            "stats": {"playCount": 0, "diggCount": 7},
            "statsV2": {"playCount": "900", "diggCount": "8"},
            "statistics": {"shareCount": 3}
        });
        let counts = item_counts(&item);
        assert_eq!(counts.views, 900);
        assert_eq!(counts.likes, 7);
        assert_eq!(counts.shares, 3);
    }

    #[test]
    fn item_list_of_id_lists_is_not_an_item() {
        let state = json!({"ItemList": {"user-post": {"list": ["1"]}}});
        assert!(find_item(&state).is_none());
    }

    #[test]
    fn item_list_array_yields_first_item() {
        let state = json!({"ItemList": [{"id": "x"}, {"desc": "real", "stats": {"playCount": 5}}]});
        assert_eq!(find_item(&state).and_then(|i| i.get("desc")), Some(&json!("real")));
    }

    #[test]
    fn duration_falls_back_to_music() {
        let state = json!({"ItemModule": {"1": {"video": {}, "music": {"duration": 60}}}});
        let html = page_with_state("SIGI_STATE", &state);
        assert_eq!(extract_structured_state(&Page::new(&html)).duration_seconds, 60);
    }

    #[test]
    fn missing_state_yields_default() {
        let result = extract_structured_state(&Page::new("<html></html>"));
        assert_eq!(result, ExtractionResult::default());
    }
}
