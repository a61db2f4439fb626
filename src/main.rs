//! Library Loan Server
//!
//! HTTP backend for the library: catalog, accounts, and the borrow/return
//! workflow.

use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use library_server::config::{Config, StorageBackend};
use library_server::db;
use library_server::middleware::{self, RateLimiter, SecurityHeaders};
use library_server::routes::build_router;
use library_server::state::AppState;
use library_server::store::{LibraryStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    tracing::info!(
        environment = config.environment.as_str(),
        "Starting library server"
    );
    if config.environment.is_production() && config.uses_default_jwt_secret() {
        tracing::warn!("JWT_SECRET is not set; tokens are signed with the development secret");
    }

    let store = open_store(&config).await?;
    let app_state = AppState::new(store, &config);

    // Idle buckets are swept every minute
    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    rate_limiter.spawn_cleanup(Duration::from_secs(60), Duration::from_secs(300));

    let app = build_router(
        app_state,
        SecurityHeaders::for_production(config.environment.is_production()),
    )
    .layer(
        ServiceBuilder::new()
            .layer(configure_cors(&config))
            .layer(axum::middleware::from_fn(move |req, next| {
                let limiter = rate_limiter.clone();
                middleware::rate_limit_layer(limiter)(req, next)
            })),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Human-readable logs in development, JSON in production
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.environment.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn LibraryStore>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(config).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins = config.cors_allowed_origins.as_deref().unwrap_or_default();

    if allowed_origins.is_empty() {
        if config.environment.is_production() {
            tracing::warn!("CORS_ALLOWED_ORIGINS not set in production, cross-origin requests are refused");
            return CorsLayer::new();
        }
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
