//! Configuration management for the render server
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file by `main`). Malformed values fall back to their defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub renderer: RendererConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum accepted request body, in bytes
    pub max_body_size: usize,
    /// Wall-clock limit for one renderer run; `None` lets it run to completion
    pub proc_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub pdf_program: PathBuf,
    pub image_program: PathBuf,
    pub scratch_dir: PathBuf,
    /// Pass options missing from the allow-list straight through
    pub allow_unlisted_options: bool,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub skip_tls_verify: bool,
    /// Deadline for the whole PUT, relay included; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

pub const DEFAULT_MAX_BODY_SIZE: usize = 2_000_000;
pub const DEFAULT_PROC_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PDF_RENDERER: &str = "/bin/wkhtmltopdf";
pub const DEFAULT_IMAGE_RENDERER: &str = "/bin/wkhtmltoimage";

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 80,
            },
            limits: LimitsConfig {
                max_body_size: DEFAULT_MAX_BODY_SIZE,
                proc_timeout: Some(Duration::from_secs(DEFAULT_PROC_TIMEOUT_SECS)),
            },
            renderer: RendererConfig {
                pdf_program: PathBuf::from(DEFAULT_PDF_RENDERER),
                image_program: PathBuf::from(DEFAULT_IMAGE_RENDERER),
                scratch_dir: env::temp_dir(),
                allow_unlisted_options: false,
            },
            upload: UploadConfig {
                skip_tls_verify: false,
                timeout: Some(Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS)),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let proc_timeout = env_timeout("APP_PROC_TIMEOUT", defaults.limits.proc_timeout);
        let upload_timeout = env_timeout("APP_UPLOAD_TIMEOUT", defaults.upload.timeout);

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_parsed("SERVER_PORT").unwrap_or(defaults.server.port),
            },
            limits: LimitsConfig {
                max_body_size: env_parsed("APP_MAX_BODY_SIZE")
                    .unwrap_or(defaults.limits.max_body_size),
                proc_timeout,
            },
            renderer: RendererConfig {
                pdf_program: env::var_os("APP_PDF_RENDERER")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.renderer.pdf_program),
                image_program: env::var_os("APP_IMAGE_RENDERER")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.renderer.image_program),
                scratch_dir: env::var_os("APP_SCRATCH_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.renderer.scratch_dir),
                allow_unlisted_options: env_bool("APP_ALLOW_UNLISTED_OPTIONS")
                    .unwrap_or(defaults.renderer.allow_unlisted_options),
            },
            upload: UploadConfig {
                skip_tls_verify: env_bool("SSL_SKIP_VERIFY")
                    .unwrap_or(defaults.upload.skip_tls_verify),
                timeout: upload_timeout,
            },
        }
    }
}

/// Read and parse a variable, warning (and yielding `None`) when it is malformed.
fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring malformed {}={:?}, using default", name, raw);
            None
        }
    }
}

/// Seconds from the environment; `0` disables the limit.
fn env_timeout(name: &str, default: Option<Duration>) -> Option<Duration> {
    match env_parsed::<u64>(name) {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => default,
    }
}

fn env_bool(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        tracing::warn!("Ignoring malformed {}={:?}, using default", name, raw);
    }
    parsed
}

/// Accepts the same spellings as Go's `strconv.ParseBool`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 80);
        assert_eq!(config.limits.max_body_size, 2_000_000);
        assert_eq!(config.limits.proc_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.renderer.pdf_program, PathBuf::from("/bin/wkhtmltopdf"));
        assert_eq!(config.renderer.image_program, PathBuf::from("/bin/wkhtmltoimage"));
        assert!(!config.upload.skip_tls_verify);
        assert_eq!(config.upload.timeout, Some(Duration::from_secs(60)));
        assert!(!config.renderer.allow_unlisted_options);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
    }
}
