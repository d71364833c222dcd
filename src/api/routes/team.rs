use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, RangeParams};
use crate::calculate;
use crate::ingest::DateRange;
use crate::models::TeamOverview;

#[derive(Debug, Serialize)]
pub struct TeamsResponse {
    pub teams: Vec<String>,
    pub tracked_team: Option<String>,
}

pub async fn teams(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<TeamsResponse>, ApiError> {
    let dataset = state.loader.load(&params.range()?).await?;
    Ok(Json(TeamsResponse {
        teams: calculate::team_labels(&dataset.matches),
        tracked_team: state.loader.settings().tracked_team.clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct OverviewParams {
    pub team: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<OverviewParams>,
) -> Result<Json<TeamOverview>, ApiError> {
    let tracked = state.loader.settings().tracked_team.as_deref();
    let team = params
        .team
        .as_deref()
        .or(tracked)
        .ok_or_else(|| ApiError::BadRequest("Missing 'team' parameter".to_string()))?;

    let range = DateRange::parse(params.from.as_deref(), params.to.as_deref())?;
    let dataset = state.loader.load(&range).await?;
    Ok(Json(calculate::team_overview(&dataset.matches, team, tracked)?))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{get_json, setup_test_state};
    use crate::api::build_router;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_teams() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/teams").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["teams"], serde_json::json!(["Alpha", "Bravo", "Charlie"]));
        assert_eq!(json["tracked_team"], "Alpha");
    }

    #[tokio::test]
    async fn test_overview_tracked_team() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/teams/overview?team=Alpha").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["matches"], 4);
        assert_eq!(json["wins"], 2);
        assert_eq!(json["win_fraction"], 0.5);
        assert_eq!(json["pistol_win_rate"], 0.5);

        let weekly = json["weekly"].as_array().unwrap();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0]["week"], "2024-03-04");
        assert_eq!(weekly[1]["week"], "2024-03-11");
        assert_eq!(weekly[1]["matches"], 2);
    }

    #[tokio::test]
    async fn test_overview_other_team_has_no_pistol_rate() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/teams/overview?team=Charlie").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["matches"], 1);
        assert_eq!(json["win_fraction"], 1.0);
        assert!(json["pistol_win_rate"].is_null());
    }

    #[tokio::test]
    async fn test_overview_defaults_to_tracked_team() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, json) = get_json(app, "/api/teams/overview").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["team"], "Alpha");
    }

    #[tokio::test]
    async fn test_overview_unknown_team() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()));

        let (status, _) = get_json(app, "/api/teams/overview?team=Nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
