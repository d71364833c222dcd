use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{self, StatsError};
use crate::ingest::{DateRange, Dataset};
use crate::models::{
    AgentKillsRow, KdReport, PlayerGeneralStats, PlayerId, PlayerMatchRecord, RankReport,
    ShootingBreakdown,
};

#[derive(Debug, Default, Deserialize)]
pub struct PlayerParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub player: Option<String>,
    pub team: Option<String>,
}

impl PlayerParams {
    fn range(&self) -> Result<DateRange, ApiError> {
        Ok(DateRange::parse(self.from.as_deref(), self.to.as_deref())?)
    }

    fn select(&self, dataset: &Dataset) -> Result<Vec<PlayerMatchRecord>, ApiError> {
        let records = dataset.players_where(self.player.as_deref(), self.team.as_deref());
        if records.is_empty() {
            let what = match (&self.player, &self.team) {
                (Some(player), _) => format!("No matches for player: {}", player),
                (None, Some(team)) => format!("No player matches for team: {}", team),
                (None, None) => "No player matches in range".to_string(),
            };
            return Err(StatsError::EmptyInput(what).into());
        }
        debug!("Selected {} player rows", records.len());
        Ok(records)
    }
}

async fn load_records(state: &AppState, params: &PlayerParams) -> Result<(Dataset, Vec<PlayerMatchRecord>), ApiError> {
    let dataset = state.loader.load(&params.range()?).await?;
    let records = params.select(&dataset)?;
    Ok((dataset, records))
}

pub async fn general(
    State(state): State<AppState>,
    Query(params): Query<PlayerParams>,
) -> Result<Json<Vec<PlayerGeneralStats>>, ApiError> {
    let (_, records) = load_records(&state, &params).await?;
    Ok(Json(calculate::general_stats(&records)?))
}

pub async fn kd(
    State(state): State<AppState>,
    Query(params): Query<PlayerParams>,
) -> Result<Json<KdReport>, ApiError> {
    let (_, records) = load_records(&state, &params).await?;
    Ok(Json(calculate::weighted_kd(&records)?))
}

pub async fn ranks(
    State(state): State<AppState>,
    Query(params): Query<PlayerParams>,
) -> Result<Json<RankReport>, ApiError> {
    let (dataset, records) = load_records(&state, &params).await?;

    // Ranks compare against every player in range; filters only pick rows.
    let metric = calculate::mean_kd(&dataset.players)?;
    let mut report = calculate::compute_ranks(&metric, &dataset.player_teams())?;
    let selected: HashSet<PlayerId> = records.into_iter().map(|r| r.player).collect();
    report.retain_players(&selected);
    Ok(Json(report))
}

pub async fn kills_by_agent(
    State(state): State<AppState>,
    Query(params): Query<PlayerParams>,
) -> Result<Json<Vec<AgentKillsRow>>, ApiError> {
    let (_, records) = load_records(&state, &params).await?;
    Ok(Json(calculate::kills_by_agent(&records)?))
}

pub async fn shooting(
    State(state): State<AppState>,
    Query(params): Query<PlayerParams>,
) -> Result<Json<Vec<ShootingBreakdown>>, ApiError> {
    let (_, records) = load_records(&state, &params).await?;
    Ok(Json(calculate::shooting_breakdown(&records)?))
}
