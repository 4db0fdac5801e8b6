use clap::Parser;
use std::{process, sync::Arc};
use strum::IntoEnumIterator;
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use true_rating_processor::{
    aggregation::{LeaderCategory, SnapshotService},
    args::Args,
    model::config::EngineConfig,
    scouting::ScoutingRepository,
    stats::{HttpStatsFeed, StatsRepository},
    store::{FileStore, KeyValueStore}
};

const LEADERS_SHOWN: usize = 5;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    if let Err(e) = run(args).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default()
    };

    let feed = Arc::new(HttpStatsFeed::new(&args.feed_root)?);
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::in_dir(&args.cache_dir));
    let repository = Arc::new(StatsRepository::new(feed, store.clone()));
    let scouting = Arc::new(ScoutingRepository::new(store));

    let year = args.year.unwrap_or_else(|| repository.current_year());
    let service = SnapshotService::new(repository, scouting, args.scouting_source.clone(), Arc::new(config))?;

    if !args.teams.is_empty() {
        let snapshot = service.get_snapshot_for_teams(year, &args.teams).await?;
        for team_id in &args.teams {
            for projection in snapshot.team(*team_id) {
                info!(
                    "{} {} ({}): TR {:.1}, TFR {:.1}",
                    team_id,
                    projection.name,
                    projection.player_type,
                    projection.true_rating.rating,
                    projection.true_future_rating.rating
                );
            }
        }
        info!("Finished with {} player computations", service.computations());
        return Ok(());
    }

    let snapshot = service.get_snapshot(year).await?;
    info!("Rated {} players for {}", snapshot.len(), year);

    for ranking in service.power_rankings(year).await? {
        info!(
            "Power #{} {} ({:.2}): rotation {:.2}, bullpen {:.2}, lineup {:.2}",
            ranking.rank, ranking.abbr, ranking.score, ranking.rotation, ranking.bullpen, ranking.lineup
        );
    }

    for ranking in service.farm_rankings(year).await? {
        let top = ranking.prospects.first().map(|p| p.name.as_str()).unwrap_or("-");
        info!(
            "Farm #{} {} ({:.1}), top prospect {}",
            ranking.rank, ranking.abbr, ranking.score, top
        );
    }

    for category in LeaderCategory::iter() {
        info!("{} leaders", category);
        for entry in service.league_leaders(year, category, LEADERS_SHOWN).await? {
            info!("  {}", entry.line());
        }
    }

    info!("Finished with {} player computations", service.computations());

    Ok(())
}
