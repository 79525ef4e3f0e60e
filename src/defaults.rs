//! Default configuration constants for humlyric.

/// Default audio sample rate in Hz for PCM capture.
///
/// 16kHz mono is plenty for melody extraction (hummed pitch sits far below
/// the Nyquist limit) and keeps uploads small.
pub const SAMPLE_RATE: u32 = 16000;

/// Default genre for draft generation.
///
/// Matches the backend's own fallback when no genre is supplied.
pub const DEFAULT_GENRE: &str = "pop";

/// Default backend base URL.
pub const BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Default per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Multipart field name the backend expects the clip under.
pub const UPLOAD_FIELD: &str = "file";

/// Base filename for uploaded clips; the extension depends on the clip format.
pub const UPLOAD_BASENAME: &str = "hum";
