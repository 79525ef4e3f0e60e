//! Backend seam: the three HTTP exchanges behind one trait.
//!
//! The backend is an external collaborator; the core depends only on the
//! upload, draft-generation and line-regeneration exchanges. The trait lets
//! the session controller run against a mock in tests, the same way the
//! capture layer swaps the real microphone for a fake.

pub mod http;

use crate::audio::Clip;
use crate::error::{HumlyricError, Result};
use crate::transcript::{Note, Transcript};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub use http::HttpBackend;

/// Request body for a full draft batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftRequest {
    pub notes: Vec<Note>,
    pub keywords: Vec<String>,
    pub genre: String,
    pub pinned: Vec<String>,
}

/// Request body for single-line regeneration. Carries line text only; the
/// backend knows nothing about draft indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRequest {
    pub line: String,
    pub genre: String,
    pub pinned: Vec<String>,
}

/// Wire body of a successful upload.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub duration_sec: f64,
    pub notes: Vec<Note>,
    pub keywords: Vec<String>,
}

/// Wire body of a successful draft generation.
#[derive(Debug, Deserialize)]
pub(crate) struct DraftsResponse {
    pub drafts: Vec<String>,
}

/// Wire body of a successful line regeneration.
#[derive(Debug, Deserialize)]
pub(crate) struct AltsResponse {
    pub alts: Vec<String>,
}

/// The three backend exchanges. Implementations must be side-effect-free per
/// request: a superseded response is simply discarded, never cancelled.
#[async_trait]
pub trait LyricsBackend: Send + Sync {
    /// Upload a clip as the sole attachment of a single submission.
    ///
    /// # Errors
    /// `TranscriptionFailed` on any transport failure, non-success status or
    /// malformed body. Never retries.
    async fn upload(&self, clip: &Clip) -> Result<Transcript>;

    /// Request a batch of one-or-more full drafts.
    ///
    /// # Errors
    /// `GenerationFailed` on transport/status/schema failure, including an
    /// empty batch.
    async fn generate_drafts(&self, request: &DraftRequest) -> Result<Vec<String>>;

    /// Request alternative phrasings for one line. The result may be empty.
    ///
    /// # Errors
    /// `RegenerationFailed` on transport/status/schema failure.
    async fn regenerate_line(&self, request: &LineRequest) -> Result<Vec<String>>;
}

/// Mock backend for testing.
///
/// Returns fixed responses and records the last request of each kind so
/// tests can assert on the echoed pins and genre.
pub struct MockBackend {
    transcript: Option<Transcript>,
    drafts: Vec<String>,
    alts: Vec<String>,
    fail_upload: Option<String>,
    fail_generate: Option<String>,
    fail_generate_after: Option<(u64, String)>,
    fail_regenerate: Option<String>,
    generate_calls: Mutex<u64>,
    last_clip: Mutex<Option<Clip>>,
    last_draft_request: Mutex<Option<DraftRequest>>,
    last_line_request: Mutex<Option<LineRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            transcript: None,
            drafts: vec!["la la la".to_string()],
            alts: Vec::new(),
            fail_upload: None,
            fail_generate: None,
            fail_generate_after: None,
            fail_regenerate: None,
            generate_calls: Mutex::new(0),
            last_clip: Mutex::new(None),
            last_draft_request: Mutex::new(None),
            last_line_request: Mutex::new(None),
        }
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn with_drafts(mut self, drafts: Vec<String>) -> Self {
        self.drafts = drafts;
        self
    }

    pub fn with_alts(mut self, alts: Vec<String>) -> Self {
        self.alts = alts;
        self
    }

    pub fn with_upload_failure(mut self, message: &str) -> Self {
        self.fail_upload = Some(message.to_string());
        self
    }

    pub fn with_generate_failure(mut self, message: &str) -> Self {
        self.fail_generate = Some(message.to_string());
        self
    }

    /// Let the first `successes` generation calls succeed, then fail.
    pub fn with_generate_failure_after(mut self, successes: u64, message: &str) -> Self {
        self.fail_generate_after = Some((successes, message.to_string()));
        self
    }

    pub fn with_regenerate_failure(mut self, message: &str) -> Self {
        self.fail_regenerate = Some(message.to_string());
        self
    }

    pub fn last_clip(&self) -> Option<Clip> {
        self.last_clip.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_draft_request(&self) -> Option<DraftRequest> {
        self.last_draft_request.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_line_request(&self) -> Option<LineRequest> {
        self.last_line_request.lock().ok().and_then(|g| g.clone())
    }

    fn default_transcript() -> Transcript {
        Transcript {
            duration_sec: 1.0,
            notes: vec![Note {
                midi: 60,
                name: "C4".to_string(),
                start: 0.0,
                dur: 1.0,
            }],
            keywords: vec!["hum".to_string()],
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LyricsBackend for MockBackend {
    async fn upload(&self, clip: &Clip) -> Result<Transcript> {
        if let Ok(mut guard) = self.last_clip.lock() {
            *guard = Some(clip.clone());
        }
        if let Some(message) = &self.fail_upload {
            return Err(HumlyricError::TranscriptionFailed {
                message: message.clone(),
            });
        }
        Ok(self
            .transcript
            .clone()
            .unwrap_or_else(Self::default_transcript))
    }

    async fn generate_drafts(&self, request: &DraftRequest) -> Result<Vec<String>> {
        if let Ok(mut guard) = self.last_draft_request.lock() {
            *guard = Some(request.clone());
        }
        let call = match self.generate_calls.lock() {
            Ok(mut count) => {
                *count += 1;
                *count
            }
            Err(_) => 0,
        };
        if let Some(message) = &self.fail_generate {
            return Err(HumlyricError::GenerationFailed {
                message: message.clone(),
            });
        }
        if let Some((successes, message)) = &self.fail_generate_after
            && call > *successes
        {
            return Err(HumlyricError::GenerationFailed {
                message: message.clone(),
            });
        }
        Ok(self.drafts.clone())
    }

    async fn regenerate_line(&self, request: &LineRequest) -> Result<Vec<String>> {
        if let Ok(mut guard) = self.last_line_request.lock() {
            *guard = Some(request.clone());
        }
        if let Some(message) = &self.fail_regenerate {
            return Err(HumlyricError::RegenerationFailed {
                message: message.clone(),
            });
        }
        Ok(self.alts.clone())
    }
}
