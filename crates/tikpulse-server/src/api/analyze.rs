use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tikpulse_advice::{heuristic_video_advice, VideoContext};
use tikpulse_core::Tier;
use tikpulse_extract::{
    benchmark_for, derive_rates, extract_with_trace, infer_niche_or_default, Counts,
    ExtractionResult, Hashtags, Niche, NicheBenchmark, PerformanceLevel, RateSet, Strategy,
};
use tikpulse_fetch::{username_from_video_url, validate_page_url, FetchMethod, FetchMode};
use tikpulse_store::{AnalysisKind, AnalysisRecord, RecordMetrics};

use super::{map_fetch_error, ok, AdviceSection, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    pub url: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct VideoAnalysis {
    pub url: String,
    pub username: String,
    pub tier: Tier,
    pub fetch_method: FetchMethod,
    pub description: String,
    pub hashtags: Hashtags,
    pub thumbnail: String,
    pub duration_seconds: u64,
    pub stats: Counts,
    pub rates: RateSet,
    pub performance_level: PerformanceLevel,
    pub niche: Niche,
    pub niche_label: &'static str,
    pub benchmark: NicheBenchmark,
    pub strategies: Vec<Strategy>,
    pub advice: AdviceSection,
    pub cached: bool,
}

/// Merge a proxy-rendered extraction into the direct one.
///
/// Text fields keep the direct value and take the proxy's only when empty.
/// Counters start from whichever result saw more views (direct on a tie);
/// any counter that source left at zero is filled from the other one.
pub(super) fn merge_proxy_result(
    mut direct: ExtractionResult,
    proxy: ExtractionResult,
) -> ExtractionResult {
    let direct_counts = direct.counts;
    let proxy_counts = proxy.counts;
    direct.fill_missing(proxy);
    if proxy_counts.views > direct_counts.views {
        let mut counts = proxy_counts;
        counts.fill_missing(&direct_counts);
        direct.counts = counts;
    }
    direct
}

fn cache_key(tier: Tier, url: &str) -> String {
    format!("video:{tier}:{url}")
}

pub(super) async fn analyze_video(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let Some(raw_url) = body.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        return Err(ApiError::new(req_id.0, "bad_request", "url is required"));
    };
    let url = validate_page_url(raw_url)
        .map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.to_string()))?
        .to_string();
    let tier = Tier::from_lenient(body.tier.as_deref());

    let key = cache_key(tier, &url);
    if let Some(mut hit) = state.cache.get(&key) {
        tracing::debug!(url = %url, "analysis served from cache");
        hit["cached"] = Value::Bool(true);
        return Ok(ok(req_id.0, hit));
    }

    let mode = if state.config.use_proxy {
        FetchMode::Proxy
    } else {
        FetchMode::Direct
    };
    let page = state
        .fetcher
        .fetch(&url, mode)
        .await
        .map_err(|e| map_fetch_error(req_id.0.clone(), &e))?;
    let (mut result, trace) = extract_with_trace(&page.html);
    let mut fetch_method = page.method;

    let missing_text = result.description.is_empty() || result.thumbnail.is_empty();
    if tier.is_pro() && missing_text && page.method == FetchMethod::Direct && state.fetcher.has_proxy()
    {
        match state.fetcher.fetch_via_proxy(&url, true).await {
            Ok(html) => {
                let (proxy_result, _) = extract_with_trace(&html);
                result = merge_proxy_result(result, proxy_result);
                fetch_method = FetchMethod::Proxy;
            }
            Err(e) => tracing::warn!(url = %url, error = %e, "proxy re-fetch failed; keeping direct result"),
        }
    }

    if result.has_no_views() {
        tracing::warn!(url = %url, strategies = ?trace.contributors(), "no view count recovered");
        return Err(ApiError::new(
            req_id.0,
            "extraction_failed",
            "could not read video statistics; the video may be private or the site layout changed",
        ));
    }

    let username = username_from_video_url(&url);
    let rates = derive_rates(&result.counts, result.duration_seconds);
    let niche_text = format!("{} {}", result.description, result.hashtags.as_slice().join(" "));
    let niche = infer_niche_or_default(&niche_text);
    let performance = rates.performance_level();

    let advice = video_advice(&state, tier, &username, &result, &rates, niche, performance).await;

    if tier.is_pro() {
        let record = AnalysisRecord {
            kind: AnalysisKind::Video,
            url: url.clone(),
            username: username.clone(),
            niche,
            stats: result.counts,
            metrics: RecordMetrics {
                engagement_rate: rates.engagement_rate,
                performance_level: performance,
                followers: None,
                posts_per_week: None,
            },
            description: result.description.clone(),
            hashtags: result.hashtags.as_slice().to_vec(),
            timestamp: chrono::Utc::now(),
        };
        if let Err(e) = state.store.save_video_analysis(&record).await {
            tracing::error!(url = %url, error = %e, "failed to persist analysis");
        }
    }

    let analysis = VideoAnalysis {
        url,
        username,
        tier,
        fetch_method,
        description: result.description,
        hashtags: result.hashtags,
        thumbnail: result.thumbnail,
        duration_seconds: result.duration_seconds,
        stats: result.counts,
        rates,
        performance_level: performance,
        niche,
        niche_label: niche.label(),
        benchmark: benchmark_for(niche),
        strategies: trace.contributors(),
        advice,
        cached: false,
    };

    let value = serde_json::to_value(&analysis).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize analysis");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to build response")
    })?;
    state.cache.set(&key, value.clone());

    Ok(ok(req_id.0, value))
}

async fn video_advice(
    state: &AppState,
    tier: Tier,
    username: &str,
    result: &ExtractionResult,
    rates: &RateSet,
    niche: Niche,
    performance: PerformanceLevel,
) -> AdviceSection {
    if let (true, Some(generator)) = (tier.is_pro(), state.advice.as_ref()) {
        let ctx = VideoContext {
            username,
            result,
            rates,
            niche,
            performance,
        };
        match generator.video_advice(&ctx).await {
            Ok(report) => return AdviceSection::llm(report),
            Err(e) => tracing::warn!(error = %e, "LLM advice failed; using heuristics"),
        }
    }
    AdviceSection::heuristic(heuristic_video_advice(result, rates, niche))
}
