pub mod analytics;
pub mod meta;
pub mod players;
pub mod team;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::state::AppState;
    use crate::config::AppConfig;
    use crate::storage::LocalSource;

    const MATCHES: &str = "\
match_id,date,map,red_team,blue_team,winner,rounds,game_length,pistol_wins
m1,2024-03-04 19:00:00,Ascent,Alpha,Bravo,Alpha,24,40.5,2
m2,2024-03-06 19:00:00,Ascent,Alpha,Bravo,Alpha,20,35.0,1
m3,2024-03-12 19:00:00,Bind,Alpha,Charlie,Charlie,22,38.0,0
m4,2024-03-14 19:00:00,Bind,Bravo,Alpha,Bravo,26,44.0,1
";

    const PLAYERS: &str = "\
riot_id,match_id,agent,kills,deaths,assists,headshots,bodyshots,legshots,acs,clutch_wins,clutch_attempts
ace#1,m1,Jett,20,10,3,10,30,0,250.0,1,2
ace#1,m2,Jett,15,15,4,5,15,0,210.0,0,1
ace#1,m3,Omen,12,12,6,4,16,0,190.0,,
bolt#2,m1,Sova,10,10,8,2,16,2,180.0,0,0
bolt#2,m3,Sova,9,0,5,3,10,1,200.0,1,1
bolt#2,m4,Sova,14,14,7,4,14,2,205.0,0,0
old#9,m4,Sage,1,20,0,0,5,0,60.0,0,0
";

    const ROSTER: &str = "\
name,tag,team
ace,1,Alpha
bolt,2,Alpha
";

    pub fn write_sheets(dir: &Path) {
        std::fs::write(dir.join("matches.csv"), MATCHES).unwrap();
        std::fs::write(dir.join("players.csv"), PLAYERS).unwrap();
        std::fs::write(dir.join("roster.csv"), ROSTER).unwrap();
    }

    pub fn setup_test_state(dir: &Path) -> AppState {
        write_sheets(dir);
        let mut config = AppConfig::default();
        config.source.data_dir = dir.to_path_buf();
        config.stats.tracked_team = Some("Alpha".to_string());
        config.stats.retired_players = vec!["old#9".to_string()];
        let source = LocalSource::from_config(&config.source);
        AppState::new(config, Arc::new(source))
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}
