//! HTML Render Server
//!
//! Accepts base64 encoded HTML over `POST /`, renders it to PDF, JPEG or PNG
//! with wkhtmltopdf / wkhtmltoimage and returns the result, or PUTs it to a
//! caller-supplied URL.
//!
//! # Modules
//!
//! - `render`: request types, argument building, scratch input, renderer process
//! - `delivery`: direct and upload responses
//! - `routes`: the HTTP endpoint

pub mod access_log;
pub mod config;
pub mod delivery;
pub mod error;
pub mod render;
pub mod routes;
pub mod state;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Build the application router.
pub fn app(config: Config) -> Router {
    Router::new()
        .merge(routes::render::router())
        .fallback(routes::not_found)
        .layer(middleware::from_fn(access_log::access_log))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(config))
}
