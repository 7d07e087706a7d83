//! RoiScope development frame relay
//!
//! Serves the frame channel protocol with synthetic camera frames so the
//! region editor can be exercised without the detection backend.
//!
//! ## Protocol
//!
//! `/ws/channel`, client to server:
//! ```json
//! { "action": "subscribe", "channel_id": 1 }
//! ```
//! server to client:
//! ```json
//! { "type": "subscription_confirmed", "channel_id": 1, "timestamp": "2024-01-01 12:00:00" }
//! { "type": "frame", "channel_id": 1, "image_base64": "<jpeg>", "timestamp": "2024-01-01 12:00:00" }
//! ```
//!
//! `/ws/alert` answers every client message with `alert_subscription_confirmed`
//! and forwards `alert` messages.

mod config;
mod relay;
mod source;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::relay::RelayState;

fn app(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws/channel", get(ws::channel_handler))
        .route("/ws/alert", get(ws::alert_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roiscope_server=info,tower_http=info".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let state = Arc::new(RelayState::new());
    tokio::spawn(source::run(Arc::clone(&state), config.clone()));

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind, e);
            std::process::exit(1);
        }
    };
    info!("RoiScope relay listening on {}", config.bind);
    info!("Frame endpoint: ws://{}/ws/channel", config.bind);

    if let Err(e) = axum::serve(listener, app(state)).await {
        error!("Server error: {}", e);
    }
}

/// Index page
async fn index() -> &'static str {
    "RoiScope Relay - frames at /ws/channel, alerts at /ws/alert"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}
