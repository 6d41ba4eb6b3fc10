//! Libris Server - library lending engine
//!
//! REST API server for borrowing, returning and renewing book copies.

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libris_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Libris Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config);

    // The engine refuses to lend without a policy row
    let policy = services.policy.ensure_policy(&config.policy).await?;
    tracing::info!(
        max_borrow_limit = policy.max_borrow_limit,
        max_renewal_limit = policy.max_renewal_limit,
        expiry_date_days = policy.expiry_date_days,
        "Lending policy loaded"
    );

    if config.reminders.enabled {
        services.reminders.clone().spawn();
        tracing::info!(
            interval_minutes = config.reminders.interval_minutes,
            "Due-date reminders enabled"
        );
    }

    let addr = SocketAddr::new(config.server.host.parse::<IpAddr>()?, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Lending
        .route("/book/borrow", post(api::loans::borrow_books))
        .route("/book/return", post(api::loans::return_books))
        .route("/book/renew", post(api::loans::renew_books))
        .route("/book/dashboard", get(api::dashboard::get_dashboard))
        .route("/members/:id/loans", get(api::loans::get_member_loans))
        // Inventory
        .route("/book/stock", post(api::inventory::add_stock))
        .route("/book/:book_code", delete(api::inventory::delete_book))
        .route("/book/:book_code/stock", delete(api::inventory::remove_stock))
        .route("/book/:book_code/copies", get(api::inventory::list_copies))
        // Policy
        .route("/policy", get(api::policy::get_policy).put(api::policy::update_policy))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
