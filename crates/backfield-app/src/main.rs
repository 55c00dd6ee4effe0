// Backfield entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; stdout carries the report)
// 2. Load config
// 3. Open the player store and build the Sleeper client
// 4. Run the requested subcommand and print its report

use std::sync::Arc;

use anyhow::Context;
use backfield_app::report;
use backfield_app::service::LeagueAnalyst;
use backfield_core::config::{self, Config};
use backfield_core::db::PlayerStore;
use backfield_core::players::PlayerDirectory;
use backfield_core::sleeper::types::TrendKind;
use backfield_core::sleeper::HttpSleeperClient;
use backfield_football::IdentityCache;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "backfield")]
#[command(about = "Retrospective fantasy-football reports for Sleeper leagues")]
#[command(version)]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct LeagueArgs {
    /// Sleeper username
    #[arg(short, long)]
    user: String,

    /// League name as shown in Sleeper
    #[arg(short, long)]
    league: String,

    /// Seasons to report: 2023, 2021-2023 or 2021,2023 (default: all)
    #[arg(short, long)]
    years: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Seasons this league has been played under
    History(LeagueArgs),

    /// Your matchup in a given week
    Matchup {
        #[command(flatten)]
        league: LeagueArgs,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=18))]
        week: u32,
    },

    /// Bench points you left unused in a given week
    Lineup {
        #[command(flatten)]
        league: LeagueArgs,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=18))]
        week: u32,
    },

    /// Championship bracket
    Bracket(LeagueArgs),

    /// Your record against another manager
    H2h {
        #[command(flatten)]
        league: LeagueArgs,
        /// Opponent's Sleeper username
        #[arg(short, long)]
        opponent: String,
    },

    /// Final or current standings
    Standings(LeagueArgs),

    /// Scoring, waiver and playoff settings
    Settings(LeagueArgs),

    /// Most added (or dropped) players across Sleeper
    Trending {
        /// Show drops instead of adds
        #[arg(long)]
        drop: bool,
        /// Number of players
        #[arg(long)]
        limit: Option<u32>,
        /// Lookback window in hours
        #[arg(long)]
        hours: Option<u32>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing
    init_tracing()?;
    info!("backfield starting up");

    // 2. Load config
    let base_dir = std::env::current_dir().context("failed to read working directory")?;
    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: api={}, sport={}",
        config.sleeper.api_base_url, config.sleeper.sport
    );

    // 3. Player store and client
    let players = PlayerDirectory::new(open_player_store(&config), config.players.max_age_hours);
    let api = Arc::new(
        HttpSleeperClient::from_config(&config.sleeper).context("failed to build Sleeper client")?,
    );
    let analyst = LeagueAnalyst::new(api, Arc::new(IdentityCache::new()), players);

    // 4. Run
    let output = run(&analyst, &config, cli.command, cli.json).await?;
    print!("{output}");

    info!("backfield finished");
    Ok(())
}

async fn run(
    analyst: &LeagueAnalyst,
    config: &Config,
    command: Command,
    json: bool,
) -> anyhow::Result<String> {
    let output = match command {
        Command::History(a) => {
            let history = analyst.history(&a.user, &a.league).await?;
            render(json, &history, report::history)?
        }
        Command::Matchup { league: a, week } => {
            let result = analyst
                .matchups(&a.user, &a.league, a.years.as_deref(), week)
                .await?;
            render(json, &result, report::matchups)?
        }
        Command::Lineup { league: a, week } => {
            let result = analyst
                .lineup_review(&a.user, &a.league, a.years.as_deref(), week)
                .await?;
            render(json, &result, report::lineups)?
        }
        Command::Bracket(a) => {
            let result = analyst
                .playoff_brackets(&a.user, &a.league, a.years.as_deref())
                .await?;
            render(json, &result, report::brackets)?
        }
        Command::H2h { league: a, opponent } => {
            let result = analyst
                .head_to_head(&a.user, &opponent, &a.league, a.years.as_deref())
                .await?;
            render(json, &result, report::head_to_head)?
        }
        Command::Standings(a) => {
            let result = analyst
                .standings(&a.user, &a.league, a.years.as_deref())
                .await?;
            render(json, &result, report::standings)?
        }
        Command::Settings(a) => {
            let result = analyst
                .settings(&a.user, &a.league, a.years.as_deref())
                .await?;
            render(json, &result, report::settings)?
        }
        Command::Trending { drop, limit, hours } => {
            let kind = if drop { TrendKind::Drop } else { TrendKind::Add };
            let entries = analyst
                .trending(
                    kind,
                    hours.unwrap_or(config.trending.lookback_hours),
                    limit.unwrap_or(config.trending.limit),
                )
                .await?;
            render(json, entries.as_slice(), report::trending)?
        }
    };
    Ok(output)
}

fn render<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> anyhow::Result<String> {
    if json {
        let mut out = serde_json::to_string_pretty(value).context("failed to serialize report")?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(text(value))
    }
}

/// The on-disk player store, or none (memory only) if it cannot be opened.
fn open_player_store(config: &Config) -> Option<PlayerStore> {
    let path = config.players.resolved_cache_path();
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("cannot create {}: {e}; player directory will not be cached", parent.display());
            return None;
        }
    }
    match PlayerStore::open(&path.to_string_lossy()) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("player directory will not be cached: {e:#}");
            None
        }
    }
}

/// Initialize tracing to log to a file (stdout is reserved for reports).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("backfield.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("backfield=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
