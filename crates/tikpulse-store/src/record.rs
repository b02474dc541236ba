//! Persisted analysis records and derived aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tikpulse_extract::{Counts, Niche, PerformanceLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Video,
    Account,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetrics {
    pub engagement_rate: f64,
    pub performance_level: PerformanceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts_per_week: Option<f64>,
}

/// One saved analysis. For accounts, `stats.views` holds the sampled
/// average and `url` the profile page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub kind: AnalysisKind,
    pub url: String,
    pub username: String,
    pub niche: Niche,
    pub stats: Counts,
    pub metrics: RecordMetrics,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Storage key: `analysis:{username}:{timestamp_ms}`.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "analysis:{}:{}",
            self.username,
            self.timestamp.timestamp_millis()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagCount {
    pub tag: String,
    pub count: usize,
}

/// Patterns computed from the recent analyses of one niche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NichePatterns {
    pub niche: Niche,
    pub sample_size: usize,
    pub avg_engagement: f64,
    pub top_hashtags: Vec<HashtagCount>,
    pub viral_threshold: f64,
    pub viral_count: usize,
    pub poor_count: usize,
    /// Hashtags carried by at least half of the viral analyses.
    pub common_viral_hashtags: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub username: String,
    pub engagement: f64,
    pub views: u64,
    pub hashtags: Vec<String>,
}

/// Curated guidance for a niche, independent of stored data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NichePlaybook {
    pub viral_triggers: &'static [&'static str],
    pub optimal_duration_secs: (u32, u32),
    pub best_posting_times: &'static [&'static str],
    pub reference_creators: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NicheInsights {
    pub niche: Niche,
    pub playbook: Option<NichePlaybook>,
    pub recent_trends: Option<NichePatterns>,
    pub stats: std::collections::BTreeMap<String, String>,
    pub top_performers: Vec<TopPerformer>,
    pub recommendations: Vec<Recommendation>,
}

/// Totals over a list of analyses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    pub count: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub avg_engagement: f64,
}

impl AggregateStats {
    #[must_use]
    pub fn from_records(records: &[AnalysisRecord]) -> Self {
        let mut agg = Self::default();
        let mut engagement_sum = 0.0;
        for record in records {
            agg.count += 1;
            agg.total_views = agg.total_views.saturating_add(record.stats.views);
            agg.total_likes = agg.total_likes.saturating_add(record.stats.likes);
            agg.total_comments = agg.total_comments.saturating_add(record.stats.comments);
            engagement_sum += record.metrics.engagement_rate;
        }
        if agg.count > 0 {
            #[allow(clippy::cast_precision_loss)]
            let n = agg.count as f64;
            agg.avg_engagement = tikpulse_extract::round2(engagement_sum / n);
        }
        agg
    }
}
