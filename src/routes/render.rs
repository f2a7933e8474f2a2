//! Render endpoint
//!
//! `POST /` with a JSON [`DocumentRequest`]; responds with the rendered
//! artifact or relays the upload target's reply.

use axum::{
    body::Body,
    extract::State,
    response::Response,
    routing::post,
    Router,
};

use crate::delivery;
use crate::error::{AppError, Result};
use crate::render::{self, DocumentRequest};
use crate::state::AppState;

/// Create the render router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(render_document).fallback(method_not_allowed))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn render_document(State(state): State<AppState>, body: Body) -> Result<Response> {
    let config = state.config();

    let limit = config.limits.max_body_size;
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| AppError::BodyTooLarge(limit))?;
    let request: DocumentRequest = serde_json::from_slice(&bytes)?;

    tracing::debug!("Contents size: {}", request.contents.len());
    if request.contents.is_empty() {
        return Err(AppError::EmptyContents);
    }

    let job = render::prepare(&request, &config.renderer)?;
    let upload_target = request
        .upload_target()
        .map(delivery::check_upload_url)
        .transpose()?;
    let format = request.output;

    let output = render::render(
        &job,
        request.contents,
        &config.renderer,
        config.limits.proc_timeout,
    )
    .await?;

    match upload_target {
        Some(url) => delivery::upload(&url, output, &config.upload).await,
        None => delivery::direct(format, output),
    }
}
