//! Harvest Rescue Engine - Backend Server
//!
//! Grades harvested lots into quality tiers, prices each tier, lists
//! perishable surplus on a rescue radar and consolidates industrial-grade
//! pickups into milk-run routes.

use axum::{routing::get, Router};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared::{CropCatalog, SeededRandomSplit};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;

pub use config::Config;
use external::AiGradingClient;
use services::{log_rescue_events, AssayService, LogisticsService, RescueService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub assays: AssayService,
    pub rescue: Arc<RescueService>,
    pub logistics: Arc<LogisticsService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hre_server=debug,tower_http=debug".into());
    let json_logs = std::env::var("HRE_LOG_FORMAT").map_or(false, |f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Starting Harvest Rescue Engine");
    tracing::info!("Environment: {}", config.environment);

    let catalog = match &config.catalog.path {
        Some(path) => {
            tracing::info!("Loading crop catalog from {}", path);
            CropCatalog::from_json(&std::fs::read_to_string(path)?)?
        }
        None => CropCatalog::builtin()?,
    };
    tracing::info!("Crop catalog ready with {} crops", catalog.len());
    let catalog = Arc::new(catalog);
    let params = Arc::new(config.engine.clone());

    let seed = config.classifier.seed.unwrap_or_else(clock_seed);
    tracing::info!(seed, "Tier classifier seeded");
    let strategy = Arc::new(SeededRandomSplit::new(seed, params.classifier.clone()));

    let grading = AiGradingClient::from_config(&config.grading)?;
    if grading.is_some() {
        tracing::info!(required = config.grading.required, "Remote grading enabled");
    }
    let assays = AssayService::new(Arc::clone(&catalog), strategy, Arc::clone(&params))
        .with_grading(grading, config.grading.required);

    let rescue = Arc::new(
        RescueService::new(params.rescue.clone())
            .with_retention(chrono::Duration::hours(config.radar.retention_hours)),
    );
    tokio::spawn(log_rescue_events(rescue.subscribe()));
    Arc::clone(&rescue)
        .spawn_prune_job(Duration::from_secs(config.radar.sweep_interval_secs));

    let logistics = Arc::new(LogisticsService::new(
        catalog,
        params,
        config.milk_run.factories.clone(),
        config.milk_run.truck_capacity_kg,
    ));
    Arc::clone(&logistics)
        .spawn_cycle_job(Duration::from_secs(config.milk_run.cycle_interval_secs));

    // Create application state
    let state = AppState {
        config: Arc::new(config.clone()),
        assays,
        rescue,
        logistics,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Harvest Rescue Engine API v1.0"
}
