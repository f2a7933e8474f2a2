//! HTML rendering pipeline
//!
//! Decode the request payload to a scratch file, build the renderer command
//! line, run the renderer and hand back its output.

pub mod args;
pub mod input;
pub mod invoker;
pub mod types;

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::config::RendererConfig;

pub use args::OptionError;
pub use invoker::RenderJob;
pub use types::{DocumentRequest, OutputFormat};

/// Failures while producing the rendered artifact (server errors)
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to decode contents: {0}")]
    Decode(#[source] std::io::Error),

    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer exited with {0}")]
    Failed(ExitStatus),

    #[error("renderer killed after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Build the renderer invocation for a request.
pub fn prepare(request: &DocumentRequest, config: &RendererConfig) -> Result<RenderJob, OptionError> {
    let program = if request.output.is_image() {
        config.image_program.clone()
    } else {
        config.pdf_program.clone()
    };
    let args = args::build_args(request, config.allow_unlisted_options)?;
    Ok(RenderJob { program, args })
}

/// Decode `contents`, run `job` on it and return the artifact.
///
/// The scratch file lives exactly as long as this call.
pub async fn render(
    job: &RenderJob,
    contents: String,
    config: &RendererConfig,
    limit: Option<Duration>,
) -> Result<Vec<u8>, RenderError> {
    let scratch_dir = config.scratch_dir.clone();
    let input = tokio::task::spawn_blocking(move || input::write_input(&scratch_dir, &contents))
        .await?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => RenderError::Decode(e),
            _ => RenderError::Io(e),
        })?;

    let output = job.run(&input, limit).await;

    if let Err(e) = input.close() {
        tracing::warn!("Failed to remove scratch input: {}", e);
    }

    output
}
