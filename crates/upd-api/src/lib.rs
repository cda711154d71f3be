//! # upd-api — HTTP Surface of the Update Server
//!
//! Binds the `upd-core` pipeline to Axum and serves installer artifacts to
//! auto-update clients.
//!
//! ## API Surface
//!
//! | Route                    | Module               | Response |
//! |--------------------------|----------------------|----------|
//! | `/updates/latest`        | [`routes::updates`]  | JSON manifest |
//! | `/updates/latest.yml`    | [`routes::updates`]  | `latest.yml` text |
//! | `/updates/:file_name`    | [`routes::updates`]  | installer bytes |
//! | `/health`                | [`routes::health`]   | liveness JSON |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CorsLayer (preflight) → cors_headers → Handler
//! ```

pub mod bootstrap;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::updates::router())
        .merge(routes::health::router())
        .layer(from_fn(middleware::cors::cors_headers))
        .layer(middleware::cors::layer())
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}
