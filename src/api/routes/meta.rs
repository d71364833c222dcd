use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::{ApiError, RangeParams};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct PlayedRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_matches: u32,
    pub total_player_rows: u32,
    pub unique_players: u32,
    pub roster_entries: u32,
    pub dropped_rows: u32,
    pub tracked_team: Option<String>,
    pub date_range: Option<PlayedRange>,
}

pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let dataset = state.loader.load(&params.range()?).await?;

    let unique_players: HashSet<_> = dataset.players.iter().map(|p| &p.player).collect();
    let first = dataset.matches.iter().map(|m| m.date).min();
    let last = dataset.matches.iter().map(|m| m.date).max();
    let date_range = match (first, last) {
        (Some(from), Some(to)) => Some(PlayedRange {
            from: from.date_naive().to_string(),
            to: to.date_naive().to_string(),
        }),
        _ => None,
    };

    Ok(Json(SummaryResponse {
        total_matches: dataset.matches.len() as u32,
        total_player_rows: dataset.players.len() as u32,
        unique_players: unique_players.len() as u32,
        roster_entries: dataset.roster.entries().len() as u32,
        dropped_rows: dataset.dropped_rows as u32,
        tracked_team: state.loader.settings().tracked_team.clone(),
        date_range,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{get_json, setup_test_state};
    use crate::api::build_router;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_summary() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_matches"], 4);
        assert_eq!(json["unique_players"], 2);
        assert_eq!(json["roster_entries"], 2);
        assert_eq!(json["tracked_team"], "Alpha");
        assert_eq!(json["date_range"]["from"], "2024-03-04");
        assert_eq!(json["date_range"]["to"], "2024-03-14");
    }

    #[tokio::test]
    async fn test_summary_with_range() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/summary?from=2024-03-01&to=2024-03-07").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_matches"], 2);
        assert_eq!(json["total_player_rows"], 3);
    }

    #[tokio::test]
    async fn test_summary_bad_date() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/summary?from=last-week").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
