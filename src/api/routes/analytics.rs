use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate;
use crate::ingest::DateRange;
use crate::models::{MapSummary, MatchRecord, WinRatePoint};

#[derive(Debug, Default, Deserialize)]
pub struct TeamParams {
    pub from: Option<String>,
    pub to: Option<String>,

    /// Perspective team; defaults to the tracked team
    pub team: Option<String>,
}

async fn load_matches(state: &AppState, params: &TeamParams) -> Result<Vec<MatchRecord>, ApiError> {
    let range = DateRange::parse(params.from.as_deref(), params.to.as_deref())?;
    let dataset = state.loader.load(&range).await?;
    Ok(dataset.matches_for(params.team.as_deref()))
}

pub async fn maps(
    State(state): State<AppState>,
    Query(params): Query<TeamParams>,
) -> Result<Json<MapSummary>, ApiError> {
    let matches = load_matches(&state, &params).await?;
    Ok(Json(calculate::summarize_maps(&matches)?))
}

pub async fn win_rate(
    State(state): State<AppState>,
    Query(params): Query<TeamParams>,
) -> Result<Json<Vec<WinRatePoint>>, ApiError> {
    let matches = load_matches(&state, &params).await?;
    Ok(Json(calculate::win_rate_series(&matches)?))
}
