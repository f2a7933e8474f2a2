//! Route modules for the render server

pub mod render;

use crate::error::AppError;

/// Any path other than `/`
pub async fn not_found() -> AppError {
    AppError::NotFound
}
