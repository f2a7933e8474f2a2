//! HTML Render Server
//!
//! HTTP front-end for wkhtmltopdf / wkhtmltoimage.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use html_render_server::{app, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "html_render_server=debug,access=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Starting HTML Render Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("PDF renderer: {}", config.renderer.pdf_program.display());
    tracing::info!("Image renderer: {}", config.renderer.image_program.display());
    match config.limits.proc_timeout {
        Some(limit) => tracing::info!("Renderer timeout: {:?}", limit),
        None => tracing::warn!("Renderer timeout disabled"),
    }
    match config.upload.timeout {
        Some(limit) => tracing::info!("Upload timeout: {:?}", limit),
        None => tracing::warn!("Upload timeout disabled"),
    }
    if config.upload.skip_tls_verify {
        tracing::warn!("TLS certificate verification disabled for uploads");
    }
    if config.renderer.allow_unlisted_options {
        tracing::warn!("Renderer options outside the allow-list will be passed through");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Http server listening on {}", addr);

    axum::serve(
        listener,
        app(config).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
