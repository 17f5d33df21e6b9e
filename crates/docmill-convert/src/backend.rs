//! HTTP conversion backend.
//!
//! Talks to the converter sidecar's `POST /convert` endpoint: document
//! bytes go out as a multipart upload, markdown comes back as JSON.

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, warn};

use docmill_core::{defaults, ConvertBackend, ConvertRequest, Error, Result};

/// Converter sidecar client.
pub struct HttpConvertBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ConvertResponse {
    markdown: String,
}

#[derive(Deserialize)]
struct ConvertErrorResponse {
    error: String,
}

impl HttpConvertBackend {
    /// Create a backend against an explicit base URL.
    ///
    /// The client timeout is wider than the pipeline's processing budget
    /// so the pipeline's own deadline fires first and controls the
    /// user-facing outcome.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                defaults::CONVERTER_REQUEST_TIMEOUT_SECS,
            ))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a backend from the `CONVERTER_URL` environment variable.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("CONVERTER_URL")
            .unwrap_or_else(|_| defaults::CONVERTER_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the converter's health endpoint.
    pub async fn check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Conversion(format!(
                "converter health check returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ConvertBackend for HttpConvertBackend {
    async fn convert(&self, req: ConvertRequest) -> Result<String> {
        let url = format!("{}/convert", self.base_url);
        debug!(
            filename = %req.filename,
            size = req.data.len(),
            ocr = req.options.ocr_enabled,
            table_structure = req.options.table_structure,
            "dispatching conversion request"
        );

        let part = multipart::Part::bytes(req.data).file_name(req.filename.clone());
        let form = multipart::Form::new()
            .part("file", part)
            .text("ocr_enabled", req.options.ocr_enabled.to_string())
            .text("table_structure", req.options.table_structure.to_string());

        let resp = self.client.post(&url).multipart(form).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // Prefer the converter's own error field when it sends one
            let detail = serde_json::from_str::<ConvertErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!(filename = %req.filename, %status, %detail, "converter returned an error");
            return Err(Error::Conversion(format!(
                "converter returned {status}: {detail}"
            )));
        }

        let parsed: ConvertResponse = resp
            .json()
            .await
            .map_err(|e| Error::Conversion(format!("malformed converter response: {e}")))?;

        Ok(parsed.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let backend = HttpConvertBackend::new("http://converter:5001/").unwrap();
        assert_eq!(backend.base_url(), "http://converter:5001");
    }

    #[test]
    fn test_error_response_parsing() {
        let body = r#"{"error": "unsupported page structure"}"#;
        let parsed: ConvertErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error, "unsupported page structure");
    }
}
