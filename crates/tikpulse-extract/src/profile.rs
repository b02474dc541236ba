//! Account (profile page) parsing and derived account metrics.

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::count::{parse_count, parse_count_value};
use crate::rates::{percent_of, round2};
use crate::state::{locate_embedded_state, STATE_CONTAINER_IDS};
use crate::strategies::{item_counts, item_description, item_hashtags};
use crate::types::{Counts, Hashtags};

const USER_INFO_POINTER: &str = "/__DEFAULT_SCOPE__/webapp.user-detail/userInfo";

/// Default number of most recent videos used for account metrics.
pub const DEFAULT_SAMPLE_SIZE: usize = 20;

const TOP_HASHTAG_LIMIT: usize = 10;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUser {
    pub unique_id: String,
    pub nickname: String,
    pub bio: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub follower_count: u64,
    pub following_count: u64,
    pub like_count: u64,
    pub video_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub description: String,
    pub counts: Counts,
    /// Unix seconds, when the page exposes it.
    pub create_time: Option<i64>,
    pub hashtags: Hashtags,
}

/// Everything recovered from one profile page. Missing data is zero/empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub user: ProfileUser,
    pub stats: ProfileStats,
    pub videos: Vec<VideoSummary>,
}

impl ProfileSnapshot {
    /// True when the page yielded neither an identity, stats nor videos.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.unique_id.is_empty()
            && self.stats == ProfileStats::default()
            && self.videos.is_empty()
    }

    /// Bio, captions and hashtags joined, for niche inference.
    #[must_use]
    pub fn niche_text(&self) -> String {
        let mut text = self.user.bio.clone();
        for video in &self.videos {
            text.push(' ');
            text.push_str(&video.description);
            for tag in &video.hashtags {
                text.push(' ');
                text.push_str(tag);
            }
        }
        text
    }
}

/// Parse a profile page.
///
/// Embedded state is read first (legacy `UserModule`/`ItemModule`, then the
/// rehydration `webapp.user-detail` scope); DOM automation attributes fill
/// whatever is still empty. Never fails.
#[must_use]
pub fn parse_profile(html: &str) -> ProfileSnapshot {
    let mut snapshot = locate_embedded_state(html, STATE_CONTAINER_IDS)
        .map(|state| snapshot_from_state(&state))
        .unwrap_or_default();

    backfill_from_dom(&Html::parse_document(html), &mut snapshot);

    if snapshot.stats.video_count == 0 {
        snapshot.stats.video_count = u64::try_from(snapshot.videos.len()).unwrap_or(u64::MAX);
    }
    tracing::debug!(
        unique_id = %snapshot.user.unique_id,
        followers = snapshot.stats.follower_count,
        videos = snapshot.videos.len(),
        "parsed profile"
    );
    snapshot
}

fn snapshot_from_state(state: &Value) -> ProfileSnapshot {
    let mut snapshot = ProfileSnapshot::default();

    if let Some(module) = state.get("UserModule") {
        let users = module.get("users").and_then(Value::as_object);
        if let Some((key, user)) = users.and_then(|u| u.iter().next()) {
            snapshot.user = user_from(user, key);
            let stats = module.get("stats").and_then(Value::as_object);
            let user_stats = stats.and_then(|s| s.get(key).or_else(|| s.values().next()));
            if let Some(user_stats) = user_stats {
                snapshot.stats = stats_from(&[user_stats]);
            }
        }
    } else if let Some(info) = state.pointer(USER_INFO_POINTER) {
        if let Some(user) = info.get("user") {
            snapshot.user = user_from(user, "");
        }
        let containers: Vec<&Value> = ["stats", "statsV2"]
            .iter()
            .filter_map(|k| info.get(*k))
            .collect();
        snapshot.stats = stats_from(&containers);
    }

    if let Some(items) = state.get("ItemModule").and_then(Value::as_object) {
        snapshot.videos = items
            .iter()
            .filter(|(_, item)| item.is_object())
            .map(|(key, item)| video_from(item, key))
            .collect();
    }

    snapshot
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn user_from(user: &Value, fallback_id: &str) -> ProfileUser {
    let unique_id = str_field(user, "uniqueId");
    ProfileUser {
        unique_id: if unique_id.is_empty() {
            fallback_id.to_string()
        } else {
            unique_id
        },
        nickname: str_field(user, "nickname"),
        bio: str_field(user, "signature"),
    }
}

/// First non-zero value across containers for each alias list.
fn stats_from(containers: &[&Value]) -> ProfileStats {
    let read = |aliases: &[&str]| -> u64 {
        containers
            .iter()
            .flat_map(|c| aliases.iter().filter_map(move |a| c.get(*a)))
            .map(parse_count_value)
            .find(|n| *n > 0)
            .unwrap_or(0)
    };
    ProfileStats {
        follower_count: read(&["followerCount"]),
        following_count: read(&["followingCount"]),
        like_count: read(&["heart", "heartCount", "diggCount"]),
        video_count: read(&["videoCount"]),
    }
}

fn video_from(item: &Value, key: &str) -> VideoSummary {
    let id = str_field(item, "id");
    let create_time = item.get("createTime").and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
    });
    VideoSummary {
        id: if id.is_empty() { key.to_string() } else { id },
        description: item_description(item),
        counts: item_counts(item),
        create_time,
        hashtags: item_hashtags(item),
    }
}

static DOM_FOLLOWERS: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-e2e="followers-count"]"#));
static DOM_FOLLOWING: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-e2e="following-count"]"#));
static DOM_LIKES: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-e2e="likes-count"]"#));
static DOM_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-e2e="user-title"]"#));
static DOM_SUBTITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-e2e="user-subtitle"]"#));
static DOM_BIO: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-e2e="user-bio"]"#));

fn selector(source: &str) -> Selector {
    Selector::parse(source).expect("valid selector")
}

fn first_text(doc: &Html, sel: &Selector) -> String {
    doc.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn backfill_from_dom(doc: &Html, snapshot: &mut ProfileSnapshot) {
    let stats = &mut snapshot.stats;
    for (slot, sel) in [
        (&mut stats.follower_count, &*DOM_FOLLOWERS),
        (&mut stats.following_count, &*DOM_FOLLOWING),
        (&mut stats.like_count, &*DOM_LIKES),
    ] {
        if *slot == 0 {
            *slot = parse_count(&first_text(doc, sel));
        }
    }

    let user = &mut snapshot.user;
    for (slot, sel) in [
        (&mut user.unique_id, &*DOM_TITLE),
        (&mut user.nickname, &*DOM_SUBTITLE),
        (&mut user.bio, &*DOM_BIO),
    ] {
        if slot.is_empty() {
            *slot = first_text(doc, sel);
        }
    }
    if let Some(stripped) = user.unique_id.strip_prefix('@') {
        user.unique_id = stripped.to_string();
    }
}

/// Aggregates over the most recent videos of an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMetrics {
    pub sample_count: usize,
    pub avg_views: f64,
    /// Total interactions over total views across the sample, in percent.
    pub avg_engagement_rate: f64,
    /// `None` when fewer than two sampled videos carry a timestamp.
    pub posts_per_week: Option<f64>,
    pub unique_hashtags_count: usize,
    /// Most frequent hashtags in the sample, ties in first-seen order.
    pub top_hashtags: Vec<String>,
    /// `None` when the account follows nobody.
    pub follower_to_following_ratio: Option<f64>,
}

/// Derive [`AccountMetrics`] from the `sample_size` most recent videos.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn derive_account_metrics(snapshot: &ProfileSnapshot, sample_size: usize) -> AccountMetrics {
    let mut sample: Vec<&VideoSummary> = snapshot.videos.iter().collect();
    sample.sort_by_key(|v| std::cmp::Reverse(v.create_time.unwrap_or(0)));
    sample.truncate(sample_size);

    let total_views: u64 = sample.iter().map(|v| v.counts.views).fold(0, u64::saturating_add);
    let total_interactions: u64 = sample
        .iter()
        .map(|v| v.counts.total_interactions())
        .fold(0, u64::saturating_add);

    let avg_views = if sample.is_empty() {
        0.0
    } else {
        round2(total_views as f64 / sample.len() as f64)
    };

    let times: Vec<i64> = sample.iter().filter_map(|v| v.create_time).collect();
    let posts_per_week = match (times.iter().min(), times.iter().max()) {
        (Some(min), Some(max)) if times.len() >= 2 => {
            let days = (max.saturating_sub(*min) as f64 / SECONDS_PER_DAY).max(1.0);
            Some(round2(sample.len() as f64 / days * 7.0))
        }
        _ => None,
    };

    let mut first_seen: Vec<&str> = Vec::new();
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for tag in sample.iter().flat_map(|v| v.hashtags.iter()) {
        let count = frequency.entry(tag.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(tag.as_str());
        }
        *count += 1;
    }
    let mut ranked = first_seen.clone();
    // Stable sort keeps first-seen order among equal counts.
    ranked.sort_by_key(|tag| std::cmp::Reverse(frequency[tag]));
    let top_hashtags = ranked
        .into_iter()
        .take(TOP_HASHTAG_LIMIT)
        .map(str::to_string)
        .collect();

    let follower_to_following_ratio = (snapshot.stats.following_count > 0).then(|| {
        round2(snapshot.stats.follower_count as f64 / snapshot.stats.following_count as f64)
    });

    AccountMetrics {
        sample_count: sample.len(),
        avg_views,
        avg_engagement_rate: percent_of(total_interactions, total_views),
        posts_per_week,
        unique_hashtags_count: first_seen.len(),
        top_hashtags,
        follower_to_following_ratio,
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
