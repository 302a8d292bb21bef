//! Communal Library Server - REST backend for accounts, catalog and loans

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comlib_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{tokens::TokenService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("comlib_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Communal Library Server v{}", env!("CARGO_PKG_VERSION"));

    // Token key pairs are read once here; a missing key file aborts the boot
    let token_service = TokenService::from_config(&config.auth).expect("Failed to load token keys");

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.loans.clone(),
        config.email.clone(),
        token_service,
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Rate limiting keys on the peer address, so serve with connect info
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Rate limit layer keyed by peer address. The governor configuration must
/// outlive the router, hence the leak.
macro_rules! rate_limit {
    ($per_ms:expr, $burst:expr) => {
        GovernorLayer {
            config: Box::leak(Box::new(
                GovernorConfigBuilder::default()
                    .per_millisecond($per_ms)
                    .burst_size($burst)
                    .finish()
                    .expect("Invalid rate limit configuration"),
            )),
        }
    };
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Users
    let users = Router::new()
        .route("/users/register", post(api::users::register))
        .route("/users/login", post(api::users::login))
        .route("/users/logout", post(api::users::logout))
        .route("/users/me", get(api::users::me))
        .route("/users/me", put(api::users::update_me))
        .route("/users/me", delete(api::users::delete_me))
        .route("/users/:id/refresh", post(api::users::refresh))
        .layer(rate_limit!(300, 20));

    // Books (catalog)
    let books = Router::new()
        .route("/books", get(api::books::list_available_books))
        .route("/books/all", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/:id", put(api::books::update_book))
        .route("/books/:id", delete(api::books::delete_book))
        .layer(rate_limit!(300, 20));

    // Loans
    let loans = Router::new()
        .route("/loans", post(api::loans::borrow_book))
        .route("/loans/:book_id/return", put(api::loans::return_book))
        .route("/loans/me", get(api::loans::my_loans))
        .route("/loans/users/:id", get(api::loans::user_loans))
        .layer(rate_limit!(300, 20));

    let api_routes = Router::new()
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        .merge(users)
        .merge(books)
        .merge(loans)
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .merge(api_routes)
        .merge(openapi)
        .layer(rate_limit!(600, 100))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
