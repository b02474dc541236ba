use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tikpulse_advice::{heuristic_account_advice, AccountContext, AccountSignals};
use tikpulse_core::Tier;
use tikpulse_extract::{
    benchmark_for, derive_account_metrics, infer_niche_or_default, parse_profile, AccountMetrics,
    Counts, Niche, NicheBenchmark, PerformanceLevel, PerformanceThresholds, ProfileSnapshot,
    ProfileStats, ProfileUser, VideoSummary, DEFAULT_SAMPLE_SIZE,
};
use tikpulse_fetch::{profile_url, validate_username, FetchMethod, FetchMode};
use tikpulse_store::{AnalysisKind, AnalysisRecord, RecordMetrics};

use super::{map_fetch_error, ok, AdviceSection, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

const RECENT_VIDEOS_IN_RESPONSE: usize = 6;

#[derive(Debug, Deserialize)]
pub(super) struct AccountRequest {
    pub input: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AccountAnalysis {
    pub username: String,
    pub profile_url: String,
    pub tier: Tier,
    pub fetch_method: FetchMethod,
    pub user: ProfileUser,
    pub stats: ProfileStats,
    pub metrics: AccountMetrics,
    pub performance_level: PerformanceLevel,
    pub niche: Niche,
    pub niche_label: &'static str,
    pub benchmark: NicheBenchmark,
    pub recent_videos: Vec<VideoSummary>,
    pub advice: AdviceSection,
    pub cached: bool,
}

fn cache_key(tier: Tier, username: &str) -> String {
    format!("account:{tier}:{}", username.to_ascii_lowercase())
}

pub(super) async fn analyze_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AccountRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let input = body.input.unwrap_or_default();
    let username = validate_username(&input)
        .map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.to_string()))?;
    let tier = Tier::from_lenient(body.tier.as_deref());

    let key = cache_key(tier, &username);
    if let Some(mut hit) = state.cache.get(&key) {
        tracing::debug!(username = %username, "account analysis served from cache");
        hit["cached"] = Value::Bool(true);
        return Ok(ok(req_id.0, hit));
    }

    let url = profile_url(&state.config.profile_base_url, &username);
    let mode = if tier.is_pro() {
        FetchMode::DirectThenProxy
    } else if state.config.use_proxy {
        FetchMode::Proxy
    } else {
        FetchMode::Direct
    };
    let page = state
        .fetcher
        .fetch(&url, mode)
        .await
        .map_err(|e| map_fetch_error(req_id.0.clone(), &e))?;

    let snapshot = parse_profile(&page.html);
    if snapshot.is_empty() {
        tracing::warn!(username = %username, "profile page yielded no data");
        return Err(ApiError::new(
            req_id.0,
            "extraction_failed",
            "could not read profile data; the account may be private or the site layout changed",
        ));
    }

    let metrics = derive_account_metrics(&snapshot, DEFAULT_SAMPLE_SIZE);
    let niche = infer_niche_or_default(&snapshot.niche_text());
    let performance = PerformanceThresholds::default().classify(metrics.avg_engagement_rate);
    let display_name = if snapshot.user.unique_id.is_empty() {
        username.clone()
    } else {
        snapshot.user.unique_id.clone()
    };

    let advice = account_advice(&state, tier, &username, &snapshot, &metrics, niche).await;

    if tier.is_pro() {
        let record = account_record(&url, &display_name, &snapshot, &metrics, niche, performance);
        if let Err(e) = state.store.save_video_analysis(&record).await {
            tracing::error!(username = %display_name, error = %e, "failed to persist account analysis");
        }
    }

    let analysis = AccountAnalysis {
        username: display_name,
        profile_url: url,
        tier,
        fetch_method: page.method,
        recent_videos: snapshot
            .videos
            .iter()
            .take(RECENT_VIDEOS_IN_RESPONSE)
            .cloned()
            .collect(),
        user: snapshot.user,
        stats: snapshot.stats,
        metrics,
        performance_level: performance,
        niche,
        niche_label: niche.label(),
        benchmark: benchmark_for(niche),
        advice,
        cached: false,
    };

    let value = serde_json::to_value(&analysis).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize account analysis");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to build response")
    })?;
    state.cache.set(&key, value.clone());

    Ok(ok(req_id.0, value))
}

fn account_record(
    url: &str,
    username: &str,
    snapshot: &ProfileSnapshot,
    metrics: &AccountMetrics,
    niche: Niche,
    performance: PerformanceLevel,
) -> AnalysisRecord {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let avg_views = metrics.avg_views.max(0.0).round() as u64;
    AnalysisRecord {
        kind: AnalysisKind::Account,
        url: url.to_string(),
        username: username.to_string(),
        niche,
        stats: Counts {
            views: avg_views,
            ..Counts::default()
        },
        metrics: RecordMetrics {
            engagement_rate: metrics.avg_engagement_rate,
            performance_level: performance,
            followers: Some(snapshot.stats.follower_count),
            posts_per_week: metrics.posts_per_week,
        },
        description: snapshot.user.bio.clone(),
        hashtags: metrics.top_hashtags.clone(),
        timestamp: chrono::Utc::now(),
    }
}

async fn account_advice(
    state: &AppState,
    tier: Tier,
    username: &str,
    snapshot: &ProfileSnapshot,
    metrics: &AccountMetrics,
    niche: Niche,
) -> AdviceSection {
    if let (true, Some(generator)) = (tier.is_pro(), state.advice.as_ref()) {
        let ctx = AccountContext {
            username,
            snapshot,
            metrics,
            niche,
        };
        match generator.account_advice(&ctx).await {
            Ok(report) => return AdviceSection::llm(report),
            Err(e) => tracing::warn!(error = %e, "LLM account advice failed; using heuristics"),
        }
    }
    AdviceSection::heuristic(heuristic_account_advice(&AccountSignals {
        follower_to_following_ratio: metrics.follower_to_following_ratio,
        avg_engagement_rate: metrics.avg_engagement_rate,
        posts_per_week: metrics.posts_per_week,
        unique_hashtags_count: metrics.unique_hashtags_count,
        niche,
    }))
}
