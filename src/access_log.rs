//! Access logging
//!
//! Handlers tag their responses with an [`Outcome`]; the middleware emits
//! exactly one line per request from it.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};

/// Short outcome tag, e.g. `"405 not allowed"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome(pub &'static str);

pub async fn access_log(request: Request, next: Next) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let outcome = response
        .extensions()
        .get::<Outcome>()
        .map(|o| o.0)
        .unwrap_or("-");

    tracing::info!(
        target: "access",
        client_ip = %client_ip,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        outcome,
        "{} {} {} {}",
        client_ip,
        method,
        path,
        outcome
    );

    response
}
