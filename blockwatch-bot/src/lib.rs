pub mod config;
pub mod discord;
mod error;
pub mod ping;
mod routes;
pub mod validation;

use axum::{Router, http::StatusCode, routing::get};
use blockwatch_core::Engine;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub engine: Arc<Engine>,
}

/// Rate limit configuration for the status endpoints
#[derive(Clone, Copy)]
pub struct RateLimitConfig {
    pub per_sec: u64,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_sec: 10,
            burst: 20,
        }
    }
}

/// Read-only HTTP view of the engine
pub fn create_app(
    engine: Arc<Engine>,
    request_timeout: Duration,
    rate_limit: RateLimitConfig,
) -> Router {
    let state = Arc::new(AppState { engine });

    // Zero would make the builder refuse the config
    let governor = GovernorConfigBuilder::default()
        .per_second(rate_limit.per_sec.max(1))
        .burst_size(rate_limit.burst.max(1))
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("rate limit values are non-zero");

    let server_routes = Router::new()
        .route("/servers", get(routes::servers))
        .route("/servers/{server}", get(routes::server))
        .layer(GovernorLayer::new(governor));

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(server_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
