//! JSON views of the aggregates and of the parser

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::{load_snapshot, settings};
use crate::parser::{get_info, CareerPath};
use crate::vocab::Stage;
use crate::{submissions, ApiError, ApiResult, AppState};

/// One directed transition with its count
#[derive(Debug, Serialize)]
pub struct EdgeCount {
    pub from: Stage,
    pub to: Stage,
    pub count: f64,
}

/// Response of `GET /api/stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Submissions counted in the aggregates
    pub submissions: u64,
    /// Well-formed lines in the raw submissions log
    pub logged_entries: usize,
    pub edges: Vec<EdgeCount>,
    pub stage_years: BTreeMap<Stage, f64>,
    pub stage_visits: BTreeMap<Stage, f64>,
    pub stage_timed_visits: BTreeMap<Stage, f64>,
    pub last_stage: BTreeMap<Stage, f64>,
    /// Keyed by bucket lower bound in years
    pub career_length: BTreeMap<u32, f64>,
    pub bucket_width_years: u32,
    pub last_cleared_at: Option<DateTime<Utc>>,
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let snapshot = load_snapshot(&state.db).await?;
    let last_cleared_at = settings::get_last_cleared_at(&state.db).await?;
    let logged_entries = submissions::read_entries(&state.config.submissions_log)
        .await?
        .len();

    let edges = snapshot
        .edges
        .iter()
        .map(|(&(from, to), &count)| EdgeCount { from, to, count })
        .collect();

    Ok(Json(StatsResponse {
        submissions: snapshot.submissions,
        logged_entries,
        edges,
        stage_years: snapshot.stage_years,
        stage_visits: snapshot.stage_visits,
        stage_timed_visits: snapshot.stage_timed_visits,
        last_stage: snapshot.last_stage,
        career_length: snapshot.career_length,
        bucket_width_years: state.config.bucket_width_years,
        last_cleared_at,
    }))
}

/// Body of `POST /api/parse`
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub data: String,
}

/// Response of `POST /api/parse`
#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub steps: CareerPath,
    pub transitions: Vec<(Stage, Stage)>,
    pub last_stage: Option<Stage>,
    pub total_years: Option<f64>,
}

/// POST /api/parse
///
/// Parses a record without logging or storing it.
pub async fn parse_preview(Json(request): Json<ParseRequest>) -> ApiResult<Json<ParseResponse>> {
    if request.data.trim().is_empty() {
        return Err(ApiError::BadRequest("data must not be empty".to_string()));
    }

    let path = get_info(&request.data);
    Ok(Json(ParseResponse {
        transitions: path.transitions().collect(),
        last_stage: path.last_stage(),
        total_years: path.total_years(),
        steps: path,
    }))
}
