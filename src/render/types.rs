//! Request types for the render endpoint

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Incoming render request.
///
/// Field names follow the public JSON contract (`Contents`, `Output`,
/// `upload_url`, `Options`, `Cookies`); lowercase spellings are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentRequest {
    /// Base64 encoded HTML
    #[serde(rename = "Contents", alias = "contents", default)]
    pub contents: String,

    #[serde(
        rename = "Output",
        alias = "output",
        default,
        deserialize_with = "lenient_output"
    )]
    pub output: OutputFormat,

    /// When present, the rendered bytes are PUT here instead of returned
    #[serde(rename = "upload_url", default)]
    pub upload_url: Option<String>,

    /// Renderer options, `--<key> [value]`
    #[serde(rename = "Options", alias = "options", default)]
    pub options: BTreeMap<String, serde_json::Value>,

    #[serde(rename = "Cookies", alias = "cookies", default)]
    pub cookies: BTreeMap<String, String>,
}

impl DocumentRequest {
    /// Upload target, treating an empty string like an absent one.
    pub fn upload_target(&self) -> Option<&str> {
        self.upload_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Rendered artifact format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Jpg,
    Png,
}

impl OutputFormat {
    /// Anything other than `jpg` or `png` renders a PDF.
    pub fn from_name(name: &str) -> Self {
        match name {
            "jpg" => OutputFormat::Jpg,
            "png" => OutputFormat::Png,
            _ => OutputFormat::Pdf,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Whether this format is produced by the image renderer
    pub fn is_image(self) -> bool {
        matches!(self, OutputFormat::Jpg | OutputFormat::Png)
    }

    /// Flags the selected renderer needs ahead of the input file.
    pub fn base_args(self) -> &'static [&'static str] {
        match self {
            OutputFormat::Pdf => &[],
            OutputFormat::Jpg => &["--format", "jpg", "-q"],
            OutputFormat::Png => &["--format", "png", "-q"],
        }
    }
}

fn lenient_output<'de, D>(deserializer: D) -> Result<OutputFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.as_deref().map(OutputFormat::from_name).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_request() {
        let request: DocumentRequest = serde_json::from_str(
            r#"{
                "Contents": "PGgxPmhpPC9oMT4=",
                "Output": "png",
                "upload_url": "https://bucket.example/out.png",
                "Options": {"quiet": true, "width": 800},
                "Cookies": {"session": "abc"}
            }"#,
        )
        .unwrap();

        assert_eq!(request.contents, "PGgxPmhpPC9oMT4=");
        assert_eq!(request.output, OutputFormat::Png);
        assert_eq!(request.upload_target(), Some("https://bucket.example/out.png"));
        assert_eq!(request.options.len(), 2);
        assert_eq!(request.cookies.get("session").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let request: DocumentRequest = serde_json::from_str("{}").unwrap();
        assert!(request.contents.is_empty());
        assert_eq!(request.output, OutputFormat::Pdf);
        assert_eq!(request.upload_target(), None);
        assert!(request.options.is_empty());
        assert!(request.cookies.is_empty());
    }

    #[test]
    fn test_unknown_or_null_output_is_pdf() {
        let request: DocumentRequest =
            serde_json::from_str(r#"{"Contents": "eA==", "Output": "gif"}"#).unwrap();
        assert_eq!(request.output, OutputFormat::Pdf);

        let request: DocumentRequest =
            serde_json::from_str(r#"{"Contents": "eA==", "Output": null}"#).unwrap();
        assert_eq!(request.output, OutputFormat::Pdf);
    }

    #[test]
    fn test_lowercase_aliases() {
        let request: DocumentRequest =
            serde_json::from_str(r#"{"contents": "eA==", "output": "jpg"}"#).unwrap();
        assert_eq!(request.contents, "eA==");
        assert_eq!(request.output, OutputFormat::Jpg);
    }

    #[test]
    fn test_empty_upload_url_means_direct() {
        let request: DocumentRequest =
            serde_json::from_str(r#"{"Contents": "eA==", "upload_url": ""}"#).unwrap();
        assert_eq!(request.upload_target(), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(OutputFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(OutputFormat::Jpg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
        assert_eq!(OutputFormat::Jpg.base_args(), &["--format", "jpg", "-q"]);
        assert!(OutputFormat::Pdf.base_args().is_empty());
    }
}
