use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fishlink::{
    config::{self, FishlinkConfig},
    db::{connection, schema_manager},
    matching::{self, ListingSort},
    models::RequestFilter,
    repo::{FishlinkRepo, SqliteRepo},
    status::RequestStatus,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "FishLink CLI")]
struct Cli {
    /// TOML config file (defaults to $FISHLINK_CONFIG, then built-in defaults).
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Id,
    Distance,
}

impl From<SortArg> for ListingSort {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Id => ListingSort::Id,
            SortArg::Distance => ListingSort::Distance,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Check the store and bring it up to date.
    Init,
    /// Listings with distance and fee estimate.
    Listings {
        #[arg(long, value_enum, default_value = "id")]
        sort: SortArg,
    },
    /// Requests, most recently updated first.
    Requests {
        #[arg(long)]
        status: Option<RequestStatus>,
        #[arg(long)]
        farm: Option<i32>,
    },
    /// Move a request to its next status.
    Advance {
        #[arg(long)]
        request: i32,
        #[arg(long)]
        to: RequestStatus,
    },
    /// Average review stars for a farm.
    Rating {
        #[arg(long)]
        farm: i32,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<FishlinkConfig> {
    let mut cfg = match path {
        Some(path) => config::load_config_path(&path)?,
        None => FishlinkConfig::from_env()?,
    };
    if let Ok(db_path) = config::get_env_var(config::DB_PATH_ENV_VAR) {
        cfg.database_path = PathBuf::from(db_path);
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fishlink=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config)?;
    let tz = cfg.display_tz()?;

    // 1) Schema check runs once per process, before any repository call
    let outcome = schema_manager::ensure_latest_schema(&cfg.database_path)
        .with_context(|| format!("preparing store {}", cfg.database_path.display()))?;

    // 2) Open the store with PRAGMAs applied
    let mut conn = connection::connect_sqlite(&cfg.database_path)?;
    let repo = SqliteRepo::new();

    match cli.cmd {
        Cmd::Init => println!("{outcome}"),
        Cmd::Listings { sort } => {
            for view in matching::listings_view(&repo, &mut conn, sort.into())? {
                let fee = view
                    .estimated_fee
                    .map_or_else(|| "-".to_string(), |fee| format!("{fee:.2}"));
                println!(
                    "#{} {} | {} | {:.1} kg @ {:.2}/kg | {} | fee {}",
                    view.listing.id,
                    view.listing.fish_name.as_deref().unwrap_or("(unnamed)"),
                    view.farm.name,
                    view.listing.quantity_kg,
                    view.listing.price_per_kg,
                    view.proximity,
                    fee,
                );
            }
        }
        Cmd::Requests { status, farm } => {
            let filter = RequestFilter {
                restaurant_id: None,
                farm_id: farm,
                status,
            };
            for view in matching::request_views(&repo, &mut conn, &filter, tz)? {
                let next = view
                    .next_status
                    .map_or_else(|| "-".to_string(), |s| s.to_string());
                println!(
                    "#{} {} | {} | {:.1} kg | {} | {} | updated {} | next {}",
                    view.request.id,
                    view.request.status,
                    view.farm.name,
                    view.request.quantity_kg,
                    view.request.time_slot,
                    view.proximity,
                    view.updated_local,
                    next,
                );
            }
        }
        Cmd::Advance { request, to } => {
            let updated = repo.update_request_status(&mut conn, request, to)?;
            println!(
                "request {} is now {} (updated {})",
                updated.id,
                updated.status,
                fishlink::tz::to_local_display(&updated.updated_at, tz)
            );
        }
        Cmd::Rating { farm } => match repo.avg_rating_for_farm(&mut conn, farm)? {
            Some(avg) => println!("farm {farm}: {avg:.2} stars"),
            None => println!("farm {farm}: no reviews"),
        },
    }

    Ok(())
}
