//! HTTP implementation of the backend exchanges.

use crate::audio::Clip;
use crate::backend::{
    AltsResponse, DraftRequest, DraftsResponse, LineRequest, LyricsBackend, UploadResponse,
};
use crate::defaults;
use crate::error::{HumlyricError, Result};
use crate::transcript::Transcript;
use async_trait::async_trait;
use std::time::Duration;

/// Backend client over HTTP.
///
/// One exchange, one request; no retries. Every failure mode of an exchange
/// (transport, non-success status, schema mismatch) maps to that exchange's
/// error class.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(
            base_url,
            Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("HTTP client builder failed, using default client: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LyricsBackend for HttpBackend {
    async fn upload(&self, clip: &Clip) -> Result<Transcript> {
        let failed = |message: String| HumlyricError::TranscriptionFailed { message };

        let part = reqwest::multipart::Part::bytes(clip.bytes.clone())
            .file_name(format!(
                "{}.{}",
                defaults::UPLOAD_BASENAME,
                clip.format.extension()
            ))
            .mime_str(clip.format.mime())
            .map_err(|e| failed(format!("invalid clip content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part(defaults::UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.url("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| failed(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(failed(format!(
                "backend returned status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed upload response: {}", e)))?;

        Transcript::from_parts(body.duration_sec, body.notes, body.keywords)
    }

    async fn generate_drafts(&self, request: &DraftRequest) -> Result<Vec<String>> {
        let failed = |message: String| HumlyricError::GenerationFailed { message };

        let response = self
            .client
            .post(self.url("lyrics"))
            .json(request)
            .send()
            .await
            .map_err(|e| failed(format!("generation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(failed(format!(
                "backend returned status {}",
                response.status()
            )));
        }

        let body: DraftsResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed drafts response: {}", e)))?;

        // The contract promises one-or-more drafts.
        if body.drafts.is_empty() {
            return Err(failed("empty draft batch".to_string()));
        }

        Ok(body.drafts)
    }

    async fn regenerate_line(&self, request: &LineRequest) -> Result<Vec<String>> {
        let failed = |message: String| HumlyricError::RegenerationFailed { message };

        let response = self
            .client
            .post(self.url("regenerate_line"))
            .json(request)
            .send()
            .await
            .map_err(|e| failed(format!("regeneration request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(failed(format!(
                "backend returned status {}",
                response.status()
            )));
        }

        let body: AltsResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed alternatives response: {}", e)))?;

        // An empty list of alternatives is legal.
        Ok(body.alts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let backend = HttpBackend::new("http://127.0.0.1:8000");
        assert_eq!(backend.url("upload"), "http://127.0.0.1:8000/upload");

        let backend = HttpBackend::new("http://127.0.0.1:8000/");
        assert_eq!(backend.url("lyrics"), "http://127.0.0.1:8000/lyrics");
    }
}
