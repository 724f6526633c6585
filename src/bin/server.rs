//! roastcheck server
//!
//! Serves the group and member API over a SQLite store.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ROASTCHECK_DATABASE_URL`: SQLite URL or file path (required)
//! - `ROASTCHECK_AUTH_TOKEN`: token for remote backends
//! - `ROASTCHECK_PORT`: Port to listen on (default: 8080)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `GET|POST|PUT /groups`, `DELETE /groups?id=N`
//! - `POST|PUT /members`, `DELETE /members?id=N`

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roastcheck::config::ServerConfig;
use roastcheck::db::Store;
use roastcheck::server::{router, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roastcheck_server=info,roastcheck=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if config.is_remote() {
        tracing::error!(
            "Remote database backends are not supported by this build: {}",
            config.database_url
        );
        std::process::exit(1);
    }

    // The pool itself is opened on the first request
    let store = match Store::new(&config.database_url) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Invalid database URL: {}", e);
            std::process::exit(1);
        }
    };

    let app = router(AppState::new(store));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
