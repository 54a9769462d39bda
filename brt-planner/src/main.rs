use std::error::Error;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use brt_planner::cache::{CacheConfig, CachedDirections};
use brt_planner::directions::{
    AnyDirections, DEFAULT_QUOTA_PER_MINUTE, DirectionsConfig, GuardedDirections, HttpDirections,
    RequestBudget, StaticDirections,
};
use brt_planner::network::NetworkStore;
use brt_planner::planner::PlannerConfig;
use brt_planner::web::{AppState, create_router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Dataset loaded when `NETWORK_DATA` is not set.
const DEFAULT_NETWORK_DATA: &str = "data/network.json";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Read an environment variable, falling back to `default` when unset or
/// unparseable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(name, value = %raw, "Ignoring unparseable environment variable");
            default
        }),
        Err(_) => default,
    }
}

fn directions_from_env() -> Result<AnyDirections, Box<dyn Error>> {
    let Ok(base_url) = std::env::var("DIRECTIONS_BASE_URL") else {
        warn!("DIRECTIONS_BASE_URL not set, using offline distance estimates");
        return Ok(AnyDirections::Offline(StaticDirections::new()));
    };

    let mut config = DirectionsConfig::new(base_url);
    match std::env::var("DIRECTIONS_API_KEY") {
        Ok(key) => config = config.with_api_key(key),
        Err(_) => warn!("DIRECTIONS_API_KEY not set, sending unauthenticated requests"),
    }
    Ok(AnyDirections::Http(HttpDirections::new(config)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load the network (fail fast if unavailable)
    let data_path = env_or("NETWORK_DATA", DEFAULT_NETWORK_DATA.to_string());
    let network = NetworkStore::open(&data_path)?;

    // Provider stack: cache -> budget guard -> provider
    let quota = env_or("DIRECTIONS_QUOTA_PER_MINUTE", DEFAULT_QUOTA_PER_MINUTE);
    let budget = Arc::new(RequestBudget::per_minute(quota));
    let provider = directions_from_env()?;
    info!(provider = provider.name(), quota, "Directions provider ready");
    let guarded = GuardedDirections::new(provider, budget);
    let directions = CachedDirections::new(guarded, &CacheConfig::default());

    // Spawn background task to reload the network periodically
    let reload_secs: u64 = env_or("NETWORK_RELOAD_SECS", 0);
    if reload_secs > 0 {
        let store = network.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(reload_secs));
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                match store.reload().await {
                    Ok(count) => info!(stops = count, "Reloaded transit network"),
                    Err(e) => warn!(error = %e, "Network reload failed, keeping previous network"),
                }
            }
        });
    }

    let state = AppState::new(network, directions, PlannerConfig::default());
    let app = create_router(state);

    let addr: SocketAddr = env_or("BIND_ADDR", DEFAULT_BIND_ADDR.to_string()).parse()?;
    info!(%addr, "BRT journey planner listening");
    info!("  GET  /health              - Health check");
    info!("  GET  /api/stops/search    - Search stops by name");
    info!("  GET  /api/routes          - List routes");
    info!("  GET  /api/budget          - Provider budget status");
    info!("  POST /api/network/reload  - Reload the network dataset");
    info!("  POST /journey/plan        - Plan a journey");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
