//! Response delivery
//!
//! Rendered bytes either go straight back to the caller or are PUT to a
//! caller-supplied URL, in which case the upstream reply is relayed.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures::TryStreamExt;

use crate::access_log::Outcome;
use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use crate::render::OutputFormat;

/// Direct mode: 200 with the artifact as body.
pub fn direct(format: OutputFormat, output: Vec<u8>) -> Result<Response> {
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .body(Body::from(output))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    response.extensions_mut().insert(Outcome("200 OK"));
    Ok(response)
}

/// Accept only absolute http(s) URLs as upload targets.
pub fn check_upload_url(url: &str) -> Result<String> {
    let parsed =
        reqwest::Url::parse(url).map_err(|e| AppError::InvalidUploadUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(url.to_string()),
        scheme => Err(AppError::InvalidUploadUrl(format!(
            "unsupported scheme {}",
            scheme
        ))),
    }
}

/// Upload mode: PUT the artifact and relay the upstream status and body.
pub async fn upload(url: &str, output: Vec<u8>, config: &UploadConfig) -> Result<Response> {
    tracing::info!("PUT {}", url);

    // Uploads go direct; proxy environment variables are not honoured.
    let mut builder = reqwest::Client::builder()
        .no_proxy()
        .danger_accept_invalid_certs(config.skip_tls_verify);
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder
        .build()
        .map_err(AppError::Upload)?;

    let upstream = client
        .put(url)
        .body(output)
        .send()
        .await
        .map_err(AppError::Upload)?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::debug!("Upload target answered {}", status);

    let target = url.to_string();
    let stream = upstream.bytes_stream().inspect_err(move |e| {
        tracing::error!("Relaying upload response from {} failed: {}", target, e);
    });

    let mut response = Response::builder()
        .status(status)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    response.extensions_mut().insert(Outcome("200 OK"));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_sets_content_type() {
        let response = direct(OutputFormat::Png, b"\x89PNG".to_vec()).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.extensions().get::<Outcome>(), Some(&Outcome("200 OK")));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_unreachable_upload_target() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = UploadConfig {
            skip_tls_verify: false,
            timeout: None,
        };
        let url = format!("http://{}/out.pdf", addr);
        let err = upload(&url, b"%PDF".to_vec(), &config).await.unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }

    #[test]
    fn test_check_upload_url() {
        assert!(check_upload_url("https://bucket.example/out.pdf").is_ok());
        assert!(check_upload_url("http://127.0.0.1:9000/out.pdf").is_ok());
        assert!(matches!(
            check_upload_url("not a url"),
            Err(AppError::InvalidUploadUrl(_))
        ));
        assert!(matches!(
            check_upload_url("file:///etc/passwd"),
            Err(AppError::InvalidUploadUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_upload_url() {
        let config = UploadConfig {
            skip_tls_verify: true,
            timeout: None,
        };
        let err = upload("not a url", Vec::new(), &config).await.unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }
}
