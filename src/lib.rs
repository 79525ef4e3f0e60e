//! humlyric - hum-to-lyrics session core
//!
//! Record a hummed melody, upload it for transcription into notes and seed
//! keywords, generate candidate lyric drafts constrained by a genre and a
//! set of pinned words, and regenerate individual lines of a chosen draft.
//! The crate is the client-side orchestration core: a single-writer state
//! machine sequencing capture, a multipart upload and three classes of
//! asynchronous, potentially stale backend exchanges.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod backend;
pub mod config;
pub mod defaults;
pub mod drafts;
pub mod error;
pub mod pins;
pub mod session;
pub mod transcript;

#[cfg(feature = "cli")]
pub mod cli;

// Capture layer (device seam + controller)
pub use audio::{
    AudioChunk, CaptureController, CaptureDevice, Clip, ClipFormat, DeviceEncoding,
    MockCaptureDevice,
};

// Backend exchanges
pub use backend::{DraftRequest, HttpBackend, LineRequest, LyricsBackend, MockBackend};

// Data model
pub use drafts::{AltCandidateSet, Draft, DraftSet, EditCursor};
pub use pins::PinSet;
pub use transcript::{Note, Transcript};

// Session state machine
pub use session::{RegenTag, SessionController, SessionEvent, SessionEvents, SessionState};

// Error handling
pub use error::{HumlyricError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
