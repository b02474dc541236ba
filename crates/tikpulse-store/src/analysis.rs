//! Analysis persistence: records, indexes, counters and niche patterns.
//!
//! Keyspace:
//! - `analysis:{username}:{timestamp_ms}` the record itself
//! - `niche:{slug}` / `user:{username}` sets of record keys
//! - `stats:global` / `stats:niche:{slug}` counter hashes
//! - `patterns:{slug}` last computed [`NichePatterns`]

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tikpulse_core::AppConfig;
use tikpulse_extract::{round2, Niche};

use crate::error::StoreError;
use crate::kv::KvStore;
use crate::playbook::playbook_for;
use crate::record::{
    AggregateStats, AnalysisRecord, HashtagCount, NicheInsights, NichePatterns, Priority,
    Recommendation, TopPerformer,
};

/// Patterns are only computed once a niche has this many analyses.
pub const PATTERN_MIN_ANALYSES: usize = 10;
const PATTERN_SAMPLE: usize = 50;
const VIRAL_ENGAGEMENT: f64 = 8.0;
const POOR_ENGAGEMENT: f64 = 1.0;
const TOP_HASHTAGS: usize = 10;
const INSIGHT_SAMPLE: usize = 20;
const TOP_PERFORMERS: usize = 5;
const LOW_NICHE_ENGAGEMENT: f64 = 3.0;

const GLOBAL_STATS_KEY: &str = "stats:global";

fn niche_index(niche: Niche) -> String {
    format!("niche:{}", niche.slug())
}

fn user_index(username: &str) -> String {
    format!("user:{username}")
}

fn niche_stats_key(niche: Niche) -> String {
    format!("stats:niche:{}", niche.slug())
}

fn patterns_key(niche: Niche) -> String {
    format!("patterns:{}", niche.slug())
}

/// Trailing millisecond timestamp of a record key; 0 when absent.
fn key_timestamp(key: &str) -> i64 {
    key.rsplit(':')
        .next()
        .and_then(|ts| ts.parse().ok())
        .unwrap_or(0)
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug)]
pub struct AnalysisStore {
    kv: KvStore,
}

impl AnalysisStore {
    #[must_use]
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if a REST backend client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        Ok(Self::new(KvStore::from_backend(&config.store_backend)?))
    }

    #[must_use]
    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    /// Persist `record`, index it, bump counters and refresh niche patterns.
    ///
    /// Counter and pattern failures are logged and do not fail the save.
    ///
    /// # Errors
    ///
    /// Fails only when the record or its indexes cannot be written.
    pub async fn save_video_analysis(&self, record: &AnalysisRecord) -> Result<String, StoreError> {
        let key = record.key();
        self.kv.set(&key, serde_json::to_value(record)?).await?;
        self.kv.sadd(&niche_index(record.niche), &key).await?;
        self.kv.sadd(&user_index(&record.username), &key).await?;

        if let Err(e) = self.update_counters(record).await {
            tracing::warn!(error = %e, key = %key, "failed to update analysis counters");
        }

        match self.detect_patterns(record.niche).await {
            Ok(Some(patterns)) => {
                let stored = match serde_json::to_value(&patterns) {
                    Ok(value) => self.kv.set(&patterns_key(record.niche), value).await,
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = stored {
                    tracing::warn!(error = %e, niche = %record.niche, "failed to store niche patterns");
                } else {
                    tracing::debug!(
                        niche = %record.niche,
                        sample_size = patterns.sample_size,
                        avg_engagement = patterns.avg_engagement,
                        "niche patterns refreshed"
                    );
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, niche = %record.niche, "pattern detection failed"),
        }

        tracing::info!(key = %key, backend = self.kv.backend_name(), "analysis saved");
        Ok(key)
    }

    async fn update_counters(&self, record: &AnalysisRecord) -> Result<(), StoreError> {
        self.kv.hincrby(GLOBAL_STATS_KEY, "total_analyses", 1).await?;
        self.kv
            .hincrby(GLOBAL_STATS_KEY, "total_views", saturating_i64(record.stats.views))
            .await?;
        self.kv
            .hincrby(GLOBAL_STATS_KEY, "total_likes", saturating_i64(record.stats.likes))
            .await?;

        let stats_key = niche_stats_key(record.niche);
        let count = self.kv.hincrby(&stats_key, "count", 1).await?.max(1);
        let current_avg = self
            .kv
            .hgetall(&stats_key)
            .await?
            .get("avg_engagement")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        let next_avg = (current_avg * (n - 1.0) + record.metrics.engagement_rate) / n;
        self.kv
            .hset(&stats_key, "avg_engagement", &round2(next_avg).to_string())
            .await
    }

    /// Most recent analyses of `niche`, newest first.
    ///
    /// # Errors
    ///
    /// Backend failures. Records that no longer decode are skipped.
    pub async fn get_analyses_by_niche(
        &self,
        niche: Niche,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        self.records_in(&niche_index(niche), limit).await
    }

    /// Most recent analyses of `username`, newest first.
    ///
    /// # Errors
    ///
    /// Backend failures. Records that no longer decode are skipped.
    pub async fn get_analyses_by_user(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        self.records_in(&user_index(username), limit).await
    }

    async fn records_in(
        &self,
        index_key: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        let mut keys = self.kv.smembers(index_key).await?;
        keys.sort_by(|a, b| {
            Reverse(key_timestamp(a))
                .cmp(&Reverse(key_timestamp(b)))
                .then_with(|| a.cmp(b))
        });
        keys.truncate(limit);

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(value) = self.kv.get(&key).await? else {
                continue;
            };
            match serde_json::from_value::<AnalysisRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => tracing::debug!(key = %key, error = %e, "skipping undecodable analysis"),
            }
        }
        Ok(records)
    }

    /// Recompute patterns for `niche` from its recent analyses.
    ///
    /// # Errors
    ///
    /// Backend failures while reading analyses.
    pub async fn detect_patterns(&self, niche: Niche) -> Result<Option<NichePatterns>, StoreError> {
        let analyses = self.get_analyses_by_niche(niche, PATTERN_SAMPLE).await?;
        Ok(compute_patterns(niche, &analyses, Utc::now()))
    }

    /// Playbook, stored patterns, counters, top performers and
    /// recommendations for `niche`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn niche_insights(&self, niche: Niche) -> Result<NicheInsights, StoreError> {
        let recent_trends = match self.kv.get(&patterns_key(niche)).await? {
            Some(value) => serde_json::from_value::<NichePatterns>(value).ok(),
            None => None,
        };
        let stats = self.kv.hgetall(&niche_stats_key(niche)).await?;

        let mut recent = self.get_analyses_by_niche(niche, INSIGHT_SAMPLE).await?;
        recent.sort_by(|a, b| {
            b.metrics
                .engagement_rate
                .total_cmp(&a.metrics.engagement_rate)
        });
        let top_performers = recent
            .into_iter()
            .take(TOP_PERFORMERS)
            .map(|r| TopPerformer {
                username: r.username,
                engagement: r.metrics.engagement_rate,
                views: r.stats.views,
                hashtags: r.hashtags,
            })
            .collect();

        let recommendations = recent_trends
            .as_ref()
            .map(recommendations_for)
            .unwrap_or_default();

        Ok(NicheInsights {
            niche,
            playbook: playbook_for(niche),
            recent_trends,
            stats,
            top_performers,
            recommendations,
        })
    }

    /// Totals over the `limit` most recent analyses of `niche`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn aggregate(&self, niche: Niche, limit: usize) -> Result<AggregateStats, StoreError> {
        let records = self.get_analyses_by_niche(niche, limit).await?;
        Ok(AggregateStats::from_records(&records))
    }

    /// Insights for one niche, or for every niche keyed by slug.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn export(
        &self,
        niche: Option<Niche>,
    ) -> Result<BTreeMap<String, NicheInsights>, StoreError> {
        let niches: Vec<Niche> = niche.map_or_else(|| Niche::ALL.to_vec(), |n| vec![n]);
        let mut out = BTreeMap::new();
        for n in niches {
            out.insert(n.slug().to_string(), self.niche_insights(n).await?);
        }
        Ok(out)
    }

    /// Counters in `stats:global`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn global_stats(&self) -> Result<BTreeMap<String, String>, StoreError> {
        self.kv.hgetall(GLOBAL_STATS_KEY).await
    }
}

/// Pure pattern computation over `analyses` (newest first).
///
/// `None` below [`PATTERN_MIN_ANALYSES`].
#[must_use]
pub fn compute_patterns(
    niche: Niche,
    analyses: &[AnalysisRecord],
    now: DateTime<Utc>,
) -> Option<NichePatterns> {
    if analyses.len() < PATTERN_MIN_ANALYSES {
        return None;
    }

    let total_engagement: f64 = analyses.iter().map(|a| a.metrics.engagement_rate).sum();
    #[allow(clippy::cast_precision_loss)]
    let avg_engagement = total_engagement / analyses.len() as f64;

    let viral: Vec<&AnalysisRecord> = analyses
        .iter()
        .filter(|a| a.metrics.engagement_rate > VIRAL_ENGAGEMENT)
        .collect();
    let poor_count = analyses
        .iter()
        .filter(|a| a.metrics.engagement_rate < POOR_ENGAGEMENT)
        .count();

    let mut top_hashtags = count_hashtags(analyses.iter());
    top_hashtags.truncate(TOP_HASHTAGS);

    let common_viral_hashtags = count_hashtags(viral.iter().copied())
        .into_iter()
        // count >= half of the viral analyses
        .filter(|h| h.count * 2 >= viral.len())
        .map(|h| h.tag)
        .collect();

    Some(NichePatterns {
        niche,
        sample_size: analyses.len(),
        avg_engagement: round2(avg_engagement),
        top_hashtags,
        viral_threshold: round2(avg_engagement * 2.0),
        viral_count: viral.len(),
        poor_count,
        common_viral_hashtags,
        computed_at: now,
    })
}

/// Hashtag frequencies, most frequent first; ties keep first-seen order.
fn count_hashtags<'a>(records: impl Iterator<Item = &'a AnalysisRecord>) -> Vec<HashtagCount> {
    let mut counts: Vec<HashtagCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        for tag in &record.hashtags {
            match index.get(tag) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(tag.clone(), counts.len());
                    counts.push(HashtagCount {
                        tag: tag.clone(),
                        count: 1,
                    });
                }
            }
        }
    }
    counts.sort_by_key(|h| Reverse(h.count));
    counts
}

/// Recommendations derived from computed niche patterns.
#[must_use]
pub fn recommendations_for(patterns: &NichePatterns) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if patterns.avg_engagement < LOW_NICHE_ENGAGEMENT {
        out.push(Recommendation {
            priority: Priority::High,
            kind: "engagement".to_string(),
            message: format!(
                "L'engagement moyen dans cette niche est de {:.1}%. Visez au moins {:.1}% pour surperformer.",
                patterns.avg_engagement,
                patterns.avg_engagement * 1.5
            ),
        });
    }
    if !patterns.top_hashtags.is_empty() {
        let tags: Vec<&str> = patterns
            .top_hashtags
            .iter()
            .take(5)
            .map(|h| h.tag.as_str())
            .collect();
        out.push(Recommendation {
            priority: Priority::Medium,
            kind: "hashtags".to_string(),
            message: format!(
                "Utilisez ces hashtags populaires dans votre niche : {}",
                tags.join(", ")
            ),
        });
    }
    if !patterns.common_viral_hashtags.is_empty() {
        out.push(Recommendation {
            priority: Priority::High,
            kind: "viral".to_string(),
            message: format!(
                "Hashtags présents dans la majorité des vidéos virales : {}",
                patterns.common_viral_hashtags.join(", ")
            ),
        });
    }
    out
}

#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;
