use dotenv::dotenv;
use redis::Client;
use restaurant_api::api::{self, AppState};
use restaurant_api::config::{Config, StoreKind};
use restaurant_api::error::{AppError, AppResult};
use restaurant_api::placement::PlacementRules;
use restaurant_api::store::Store;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Main entry point for the restaurant API service.
///
/// This function:
/// 1. Loads environment variables from .env file
/// 2. Builds the store and the API router from the configuration
/// 3. Starts the HTTP server
#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize the logging subscriber
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .pretty()
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "restaurant API service stopped");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    info!("Starting restaurant API service");
    let config = Config::from_env()?;

    let store = match config.store {
        StoreKind::Redis => Store::redis(Client::open(config.redis_url.as_str())?),
        StoreKind::Memory => {
            warn!("using the in-memory store, data is lost on shutdown");
            Store::memory()
        }
    };
    let placement = PlacementRules::new(config.timezone);
    info!(timezone = %placement.timezone(), "placement rules use reference time zone");

    let app = api::create_router(AppState::with_system_clock(store, placement));

    let addr = config.addr()?;
    info!("Server listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| AppError::Server(err.to_string()))?;
    Ok(())
}
