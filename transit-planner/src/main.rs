use std::error::Error;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use transit_planner::cache::{CacheConfig, CachedFeedSource};
use transit_planner::config::{LiveFeedSetting, ServerConfig};
use transit_planner::network::{Network, NetworkHandle};
use transit_planner::planner::SearchConfig;
use transit_planner::realtime::{
    FeedClientConfig, GtfsRealtimeClient, OverlayConfig, RealtimeOverlay, StaticFeedSource,
};
use transit_planner::web::{AppState, LiveFeed, create_router};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn live_feed(setting: &LiveFeedSetting) -> Result<Option<LiveFeed>, Box<dyn Error>> {
    Ok(match setting {
        LiveFeedSetting::Disabled => None,
        LiveFeedSetting::Api { api_key } => {
            let client = GtfsRealtimeClient::new(FeedClientConfig::new(api_key))?;
            Some(LiveFeed::Api(CachedFeedSource::new(
                client,
                &CacheConfig::default(),
            )))
        }
        LiveFeedSetting::Recorded { dir } => {
            Some(LiveFeed::Recorded(StaticFeedSource::from_dir(dir)?))
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = ServerConfig::from_env()?;

    info!(dir = %config.gtfs_dir.display(), "loading timetable");
    let gtfs_dir = config.gtfs_dir.clone();
    let network = tokio::task::spawn_blocking(move || Network::load(gtfs_dir)).await??;
    let stats = network.graph().stats();
    info!(
        stops = stats.stop_count,
        connections = stats.connection_count,
        walk_transfers = stats.walk_transfer_count,
        "network ready"
    );

    let realtime = live_feed(&config.live_feed)?
        .map(|feed| RealtimeOverlay::new(feed, OverlayConfig::default()));
    if realtime.is_none() {
        warn!("no live feed configured; realtime requests will return scheduled itineraries");
    }

    let feed_dir = match &config.live_feed {
        LiveFeedSetting::Recorded { dir } => Some(dir.as_path()),
        _ => None,
    };
    let state = AppState::new(
        NetworkHandle::new(network),
        SearchConfig::default(),
        realtime,
        config.default_partition.as_str(),
    )
    .with_data_dirs(&config.gtfs_dir, feed_dir);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "transit planner listening");
    info!("  GET  /health            - Health check");
    info!("  GET  /api/stops/search  - Search stops by name");
    info!("  GET  /network/stats     - Network statistics");
    info!("  POST /journey/plan      - Plan a journey");
    info!("  POST /admin/reload      - Reload timetable and live feeds");

    axum::serve(listener, app).await?;
    Ok(())
}
