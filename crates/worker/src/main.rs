//! Pipeline worker entry point.
//!
//! Commands:
//!   produce-next-game [--date YYYY-MM-DD] [--force]
//!   backfill-loop-media [--limit N]
//!   backfill-curation [--limit N]
//!
//! Without `--date`, produce-next-game targets the day after the
//! latest scheduled challenge (or today when the schedule is empty).

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use guessityet_db::repositories::DailyGameRepo;
use guessityet_pipeline::store::FsMediaStore;
use guessityet_pipeline::{Orchestrator, PipelineConfig};
use guessityet_providers::{IgdbProvider, MetadataProvider, RawgProvider, VisionScorer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "guessityet_worker=debug,guessityet_pipeline=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_usage();
        return Err("missing command".into());
    };

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set")?;
    let pool = guessityet_db::create_pool(&database_url).await?;
    guessityet_db::run_migrations(&pool).await?;

    let provider = build_provider()?;
    let config = PipelineConfig::from_env();
    let store = Arc::new(FsMediaStore::new(config.media_root.clone()));
    let vision = VisionScorer::from_env();
    if vision.is_none() {
        tracing::info!("No OPENAI_API_KEY; curation runs on visual heuristics only");
    }

    let orchestrator = Orchestrator::new(pool.clone(), provider, store, vision, config);

    match command {
        "produce-next-game" => {
            let date = match flag_value(&args, "--date") {
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| format!("bad --date {raw}: {e}"))?,
                None => next_open_date(&pool).await?,
            };
            let force = has_flag(&args, "--force");
            let outcome = orchestrator.produce_game_for_date(date, force).await?;
            tracing::info!("{outcome}");
        }
        "backfill-loop-media" => {
            let limit = parse_limit(&args)?;
            let outcome = orchestrator.backfill_loop_media(limit).await?;
            tracing::info!("{outcome}");
        }
        "backfill-curation" => {
            let limit = parse_limit(&args)?;
            let outcome = orchestrator.backfill_curation(limit).await?;
            tracing::info!("{outcome}");
        }
        other => {
            print_usage();
            return Err(format!("unknown command: {other}").into());
        }
    }

    Ok(())
}

/// IGDB when its credentials are present, otherwise RAWG.
fn build_provider() -> Result<Arc<dyn MetadataProvider>, Box<dyn std::error::Error>> {
    if let Some(igdb) = IgdbProvider::from_env() {
        tracing::info!("Using IGDB catalog");
        return Ok(Arc::new(igdb));
    }
    if let Some(rawg) = RawgProvider::from_env() {
        tracing::info!("Using RAWG catalog");
        return Ok(Arc::new(rawg));
    }
    Err("set IGDB_CLIENT_ID/IGDB_CLIENT_SECRET or RAWG_API_KEY".into())
}

/// Day after the latest scheduled challenge, or today for an empty
/// schedule.
async fn next_open_date(pool: &guessityet_db::DbPool) -> Result<NaiveDate, sqlx::Error> {
    let today = Utc::now().date_naive();
    Ok(match DailyGameRepo::latest_date(pool).await? {
        Some(latest) => (latest + chrono::Duration::days(1)).max(today),
        None => today,
    })
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let position = args.iter().position(|a| a == flag)?;
    args.get(position + 1).map(String::as_str)
}

fn parse_limit(args: &[String]) -> Result<i64, Box<dyn std::error::Error>> {
    match flag_value(args, "--limit") {
        Some(raw) => Ok(raw.parse().map_err(|e| format!("bad --limit {raw}: {e}"))?),
        None => Ok(20),
    }
}

fn print_usage() {
    eprintln!(
        "Usage:\n  \
         guessityet-worker produce-next-game [--date YYYY-MM-DD] [--force]\n  \
         guessityet-worker backfill-loop-media [--limit N]\n  \
         guessityet-worker backfill-curation [--limit N]"
    );
}
