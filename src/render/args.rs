//! Renderer argument construction
//!
//! Turns the request's `Options` and `Cookies` into the command-line vector
//! handed to wkhtmltopdf / wkhtmltoimage. Options are checked against
//! [`SUPPORTED_OPTIONS`] before anything is emitted.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use super::types::{DocumentRequest, OutputFormat};

/// Option validation failures (client errors)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unsupported option: {0}")]
    Unsupported(String),

    #[error("option {name} does not apply to {format} output")]
    WrongRenderer { name: String, format: &'static str },

    #[error("option {name} expects {expected}")]
    InvalidValue { name: String, expected: &'static str },
}

/// Value accepted by a renderer option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `true` emits `--name`, `false` emits nothing
    Flag,
    Text,
    Integer,
    Number,
}

impl ValueKind {
    fn expected(self) -> &'static str {
        match self {
            ValueKind::Flag => "true or false",
            ValueKind::Text => "a string or number",
            ValueKind::Integer => "an integer",
            ValueKind::Number => "a number",
        }
    }
}

/// Which renderer understands an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applies {
    Both,
    Pdf,
    Image,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: ValueKind,
    pub applies: Applies,
}

const fn spec(name: &'static str, kind: ValueKind, applies: Applies) -> OptionSpec {
    OptionSpec { name, kind, applies }
}

use Applies::{Both, Image, Pdf};
use ValueKind::{Flag, Integer, Number, Text};

/// Single-valued wkhtmltopdf 0.12 options that are safe to expose.
///
/// Options that read local files or take two values are not listed.
/// `--format` always comes from `Output`.
pub const SUPPORTED_OPTIONS: &[OptionSpec] = &[
    // shared page options
    spec("quiet", Flag, Both),
    spec("background", Flag, Both),
    spec("no-background", Flag, Both),
    spec("images", Flag, Both),
    spec("no-images", Flag, Both),
    spec("enable-javascript", Flag, Both),
    spec("disable-javascript", Flag, Both),
    spec("no-stop-slow-scripts", Flag, Both),
    spec("stop-slow-scripts", Flag, Both),
    spec("disable-local-file-access", Flag, Both),
    spec("javascript-delay", Integer, Both),
    spec("minimum-font-size", Integer, Both),
    spec("encoding", Text, Both),
    spec("load-error-handling", Text, Both),
    spec("load-media-error-handling", Text, Both),
    spec("window-status", Text, Both),
    spec("zoom", Number, Both),
    // document renderer
    spec("collate", Flag, Pdf),
    spec("no-collate", Flag, Pdf),
    spec("copies", Integer, Pdf),
    spec("dpi", Integer, Pdf),
    spec("grayscale", Flag, Pdf),
    spec("lowquality", Flag, Pdf),
    spec("image-dpi", Integer, Pdf),
    spec("image-quality", Integer, Pdf),
    spec("margin-bottom", Text, Pdf),
    spec("margin-left", Text, Pdf),
    spec("margin-right", Text, Pdf),
    spec("margin-top", Text, Pdf),
    spec("orientation", Text, Pdf),
    spec("page-size", Text, Pdf),
    spec("page-height", Text, Pdf),
    spec("page-width", Text, Pdf),
    spec("title", Text, Pdf),
    spec("no-pdf-compression", Flag, Pdf),
    spec("outline", Flag, Pdf),
    spec("no-outline", Flag, Pdf),
    spec("outline-depth", Integer, Pdf),
    spec("print-media-type", Flag, Pdf),
    spec("no-print-media-type", Flag, Pdf),
    spec("disable-smart-shrinking", Flag, Pdf),
    spec("enable-smart-shrinking", Flag, Pdf),
    spec("viewport-size", Text, Pdf),
    spec("page-offset", Integer, Pdf),
    spec("header-left", Text, Pdf),
    spec("header-center", Text, Pdf),
    spec("header-right", Text, Pdf),
    spec("header-font-name", Text, Pdf),
    spec("header-font-size", Integer, Pdf),
    spec("header-spacing", Number, Pdf),
    spec("header-line", Flag, Pdf),
    spec("no-header-line", Flag, Pdf),
    spec("footer-left", Text, Pdf),
    spec("footer-center", Text, Pdf),
    spec("footer-right", Text, Pdf),
    spec("footer-font-name", Text, Pdf),
    spec("footer-font-size", Integer, Pdf),
    spec("footer-spacing", Number, Pdf),
    spec("footer-line", Flag, Pdf),
    spec("no-footer-line", Flag, Pdf),
    // image renderer
    spec("width", Integer, Image),
    spec("height", Integer, Image),
    spec("quality", Integer, Image),
    spec("crop-h", Integer, Image),
    spec("crop-w", Integer, Image),
    spec("crop-x", Integer, Image),
    spec("crop-y", Integer, Image),
    spec("transparent", Flag, Image),
    spec("disable-smart-width", Flag, Image),
    spec("enable-smart-width", Flag, Image),
];

pub fn lookup(name: &str) -> Option<&'static OptionSpec> {
    SUPPORTED_OPTIONS.iter().find(|spec| spec.name == name)
}

/// Full argument list for a request, minus the input path and the trailing `-`.
///
/// Order: options, cookies, then the format's base flags.
pub fn build_args(
    request: &DocumentRequest,
    allow_unlisted: bool,
) -> Result<Vec<String>, OptionError> {
    let mut args = option_args(&request.options, request.output, allow_unlisted)?;
    args.extend(cookie_args(&request.cookies));
    args.extend(request.output.base_args().iter().map(|s| s.to_string()));
    Ok(args)
}

pub fn option_args(
    options: &BTreeMap<String, Value>,
    format: OutputFormat,
    allow_unlisted: bool,
) -> Result<Vec<String>, OptionError> {
    let mut args = Vec::new();

    for (name, value) in options {
        match lookup(name) {
            Some(spec) => {
                check_renderer(spec, format)?;
                check_kind(name, spec.kind, value)?;
            }
            None if allow_unlisted => {
                tracing::warn!("Passing unlisted renderer option through: --{}", name);
            }
            None => return Err(OptionError::Unsupported(name.clone())),
        }

        match value {
            Value::Bool(true) => args.push(format!("--{}", name)),
            Value::Bool(false) | Value::Null => {}
            Value::String(s) => args.extend([format!("--{}", name), s.clone()]),
            Value::Number(n) => args.extend([format!("--{}", name), format_number(n)]),
            Value::Array(_) | Value::Object(_) => {
                return Err(OptionError::InvalidValue {
                    name: name.clone(),
                    expected: "a scalar value",
                })
            }
        }
    }

    Ok(args)
}

/// Integral values print without a fractional part (`10.0` → `10`).
fn format_number(n: &serde_json::Number) -> String {
    match integral(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

/// Whole numbers that fit an `i64` exactly, whether written `10` or `10.0`
fn integral(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        return None;
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64)
}

/// `--cookie <name> <percent-encoded value>` for every cookie.
pub fn cookie_args(cookies: &BTreeMap<String, String>) -> Vec<String> {
    cookies
        .iter()
        .flat_map(|(name, value)| {
            [
                "--cookie".to_string(),
                name.clone(),
                urlencoding::encode(value).into_owned(),
            ]
        })
        .collect()
}

fn check_renderer(spec: &OptionSpec, format: OutputFormat) -> Result<(), OptionError> {
    let ok = match spec.applies {
        Both => true,
        Pdf => !format.is_image(),
        Image => format.is_image(),
    };
    if ok {
        Ok(())
    } else {
        Err(OptionError::WrongRenderer {
            name: spec.name.to_string(),
            format: match format {
                OutputFormat::Pdf => "pdf",
                OutputFormat::Jpg => "jpg",
                OutputFormat::Png => "png",
            },
        })
    }
}

fn check_kind(name: &str, kind: ValueKind, value: &Value) -> Result<(), OptionError> {
    let ok = match (kind, value) {
        // false and null emit nothing whatever the kind
        (_, Value::Bool(false)) | (_, Value::Null) => true,
        (Flag, Value::Bool(true)) => true,
        (Flag, _) => false,
        (_, Value::Bool(true)) => false,
        (Text, Value::String(_)) | (Text, Value::Number(_)) => true,
        (Integer, Value::Number(n)) => n.is_u64() || integral(n).is_some(),
        (Integer, Value::String(s)) => s.trim().parse::<i64>().is_ok(),
        (Number, Value::Number(_)) => true,
        (Number, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(OptionError::InvalidValue {
            name: name.to_string(),
            expected: kind.expected(),
        })
    }
}
