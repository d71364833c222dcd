use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_stats::api::state::AppState;
use match_stats::calculate;
use match_stats::config::AppConfig;
use match_stats::ingest::DateRange;
use match_stats::models::PlayerId;

#[derive(Parser)]
#[command(name = "match-stats")]
#[command(about = "Team match statistics: win rates, weighted K/D, ranks and map performance")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (defaults to the config file's)
        #[arg(long)]
        host: Option<String>,

        /// Port number (defaults to the config file's)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print a report as JSON
    Report {
        #[arg(value_enum)]
        kind: ReportKind,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Restrict to one team
        #[arg(long)]
        team: Option<String>,

        /// Restrict to one player (Riot ID)
        #[arg(long)]
        player: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportKind {
    Players,
    Kd,
    Ranks,
    KillsByAgent,
    Shooting,
    Maps,
    WinRate,
    Teams,
    Team,
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
    } else {
        tracing::warn!("No config at {}, using defaults", path.display());
        Ok(AppConfig::default())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_report(
    state: &AppState,
    kind: ReportKind,
    range: DateRange,
    team: Option<&str>,
    player: Option<&str>,
) -> Result<()> {
    let dataset = state.loader.load(&range).await?;
    let tracked = state.config.stats.tracked_team.as_deref();
    tracing::info!(
        "Loaded {} matches and {} player rows",
        dataset.matches.len(),
        dataset.players.len()
    );

    match kind {
        ReportKind::Players => {
            print_json(&calculate::general_stats(&dataset.players_where(player, team))?)
        }
        ReportKind::Kd => print_json(&calculate::weighted_kd(&dataset.players_where(player, team))?),
        ReportKind::Ranks => {
            let metric = calculate::mean_kd(&dataset.players)?;
            let mut report = calculate::compute_ranks(&metric, &dataset.player_teams())?;
            let selected: HashSet<PlayerId> = dataset
                .players_where(player, team)
                .into_iter()
                .map(|r| r.player)
                .collect();
            report.retain_players(&selected);
            print_json(&report)
        }
        ReportKind::KillsByAgent => {
            print_json(&calculate::kills_by_agent(&dataset.players_where(player, team))?)
        }
        ReportKind::Shooting => {
            print_json(&calculate::shooting_breakdown(&dataset.players_where(player, team))?)
        }
        ReportKind::Maps => print_json(&calculate::summarize_maps(&dataset.matches_for(team))?),
        ReportKind::WinRate => {
            print_json(&calculate::win_rate_series(&dataset.matches_for(team))?)
        }
        ReportKind::Teams => print_json(&calculate::team_labels(&dataset.matches)),
        ReportKind::Team => {
            let team = team
                .or(tracked)
                .context("--team is required when no tracked_team is configured")?;
            print_json(&calculate::team_overview(&dataset.matches, team, tracked)?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting match-stats v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(Path::new(&cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.source.data_dir = PathBuf::from(dir);
    }

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState::from_config(config)?;
            let app = match_stats::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}/api/health", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Report {
            kind,
            from,
            to,
            team,
            player,
        } => {
            let range = DateRange::parse(from.as_deref(), to.as_deref())?;
            let state = AppState::from_config(config)?;
            run_report(&state, kind, range, team.as_deref(), player.as_deref()).await?;
        }
    }

    Ok(())
}
