use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tikpulse_extract::Niche;
use tikpulse_store::{AggregateStats, AnalysisRecord, NicheInsights};

use super::{map_store_error, ok, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub(super) struct PatternsQuery {
    pub action: Option<String>,
    pub niche: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub(super) enum PatternsData {
    Insights {
        niche: Niche,
        insights: NicheInsights,
    },
    Recent {
        niche: Niche,
        analyses: Vec<AnalysisRecord>,
        stats: AggregateStats,
    },
    Export {
        exported_at: DateTime<Utc>,
        global: BTreeMap<String, String>,
        niches: BTreeMap<String, NicheInsights>,
    },
}

pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT)
}

fn parse_niche(req_id: &str, raw: Option<&str>) -> Result<Option<Niche>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Niche::parse(s).map(Some).ok_or_else(|| {
            ApiError::new(req_id, "bad_request", format!("unknown niche \"{s}\""))
        }),
    }
}

fn require_niche(req_id: &str, raw: Option<&str>) -> Result<Niche, ApiError> {
    parse_niche(req_id, raw)?
        .ok_or_else(|| ApiError::new(req_id, "bad_request", "niche is required"))
}

pub(super) async fn get_patterns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<PatternsQuery>,
) -> Result<Json<ApiResponse<PatternsData>>, ApiError> {
    let action = params.action.as_deref().unwrap_or("insights");
    let data = match action {
        "insights" => {
            let niche = require_niche(&req_id.0, params.niche.as_deref())?;
            let insights = state
                .store
                .niche_insights(niche)
                .await
                .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
            PatternsData::Insights { niche, insights }
        }
        "recent" => {
            let niche = require_niche(&req_id.0, params.niche.as_deref())?;
            let analyses = state
                .store
                .get_analyses_by_niche(niche, normalize_limit(params.limit))
                .await
                .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
            let stats = AggregateStats::from_records(&analyses);
            PatternsData::Recent {
                niche,
                analyses,
                stats,
            }
        }
        "export" => {
            let niche = parse_niche(&req_id.0, params.niche.as_deref())?;
            let niches = state
                .store
                .export(niche)
                .await
                .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
            let global = state
                .store
                .global_stats()
                .await
                .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
            PatternsData::Export {
                exported_at: Utc::now(),
                global,
                niches,
            }
        }
        other => {
            return Err(ApiError::new(
                req_id.0,
                "bad_request",
                format!("unknown action \"{other}\"; expected insights, recent or export"),
            ))
        }
    };

    Ok(ok(req_id.0, data))
}
