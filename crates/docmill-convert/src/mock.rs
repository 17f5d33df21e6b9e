//! Mock conversion backend for tests and offline development.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use docmill_core::{ConvertBackend, ConvertOptions, ConvertRequest, Error, Result};

/// Record of a single conversion call.
#[derive(Debug, Clone)]
pub struct ConvertCall {
    pub filename: String,
    pub size: usize,
    pub options: ConvertOptions,
}

/// Deterministic in-process converter.
///
/// Returns a canned markdown body, optionally after a configured delay,
/// or fails every call with a configured message. Every call is recorded
/// for assertion.
pub struct MockConvertBackend {
    response: String,
    latency: Option<Duration>,
    fail_with: Mutex<Option<String>>,
    calls: Mutex<Vec<ConvertCall>>,
    call_count: AtomicUsize,
}

impl Default for MockConvertBackend {
    fn default() -> Self {
        Self::new("# Converted Document\n\nMock conversion output.\n")
    }
}

impl MockConvertBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            latency: None,
            fail_with: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Sleep for `latency` before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every subsequent call with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail_with.lock().unwrap() = Some(message.into());
    }

    /// Clear a previously configured failure.
    pub fn succeed(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ConvertCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConvertBackend for MockConvertBackend {
    async fn convert(&self, req: ConvertRequest) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(ConvertCall {
            filename: req.filename.clone(),
            size: req.data.len(),
            options: req.options,
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(Error::Conversion(message));
        }

        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ConvertRequest {
        ConvertRequest {
            filename: "report.pdf".to_string(),
            data: b"%PDF-1.7".to_vec(),
            options: ConvertOptions {
                ocr_enabled: false,
                table_structure: true,
            },
        }
    }

    #[tokio::test]
    async fn test_mock_returns_canned_response() {
        let mock = MockConvertBackend::new("# Title\n");
        let md = mock.convert(request()).await.unwrap();
        assert_eq!(md, "# Title\n");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_records_call_metadata() {
        let mock = MockConvertBackend::default();
        mock.convert(request()).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filename, "report.pdf");
        assert_eq!(calls[0].size, 8);
        assert!(calls[0].options.table_structure);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mock = MockConvertBackend::default();
        mock.fail_with("document is password-protected");

        let err = mock.convert(request()).await.unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
        assert!(err.to_string().contains("password-protected"));

        mock.succeed();
        assert!(mock.convert(request()).await.is_ok());
    }
}
