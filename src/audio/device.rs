//! Capture device seam.
//!
//! The physical microphone is the one exclusive resource in the system. It is
//! represented as a capability object injected into the capture controller,
//! so tests can substitute a fake source.

use crate::defaults;
use crate::error::{HumlyricError, Result};

/// Encoding a capture device delivers its chunks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEncoding {
    /// Raw signed 16-bit mono PCM; the controller wraps it in a WAV container.
    PcmS16 { sample_rate: u32 },
    /// Pre-compressed Ogg/Opus frames, passed through as-is.
    OggOpus,
}

/// One chunk of captured audio.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioChunk {
    Pcm(Vec<i16>),
    Encoded(Vec<u8>),
}

impl AudioChunk {
    pub fn is_empty(&self) -> bool {
        match self {
            AudioChunk::Pcm(samples) => samples.is_empty(),
            AudioChunk::Encoded(bytes) => bytes.is_empty(),
        }
    }
}

/// Trait for capture devices.
///
/// Allows swapping implementations (real microphone vs mock). Only one
/// consumer may hold a device at a time; the controller enforces the
/// single-active-capture invariant on top of it.
pub trait CaptureDevice: Send {
    /// The encoding this device negotiated with the hardware. Must stay
    /// constant for the lifetime of the device.
    fn encoding(&self) -> DeviceEncoding;

    /// Acquire the device and start capturing.
    fn start(&mut self) -> Result<()>;

    /// Release the device and stop capturing.
    fn stop(&mut self) -> Result<()>;

    /// Drain whatever audio the device has buffered since the last read.
    /// An empty chunk means nothing has arrived yet.
    fn read_chunk(&mut self) -> Result<AudioChunk>;
}

/// Mock capture device for testing.
#[derive(Debug, Clone)]
pub struct MockCaptureDevice {
    encoding: DeviceEncoding,
    chunks: Vec<AudioChunk>,
    next_chunk: usize,
    is_started: bool,
    should_fail_start: bool,
    should_fail_stop: bool,
    fail_stop_after: Option<u32>,
    stops: u32,
    should_fail_read: bool,
    error_message: String,
}

impl MockCaptureDevice {
    pub fn new() -> Self {
        Self {
            encoding: DeviceEncoding::PcmS16 {
                sample_rate: defaults::SAMPLE_RATE,
            },
            chunks: vec![AudioChunk::Pcm(vec![0i16; 160])],
            next_chunk: 0,
            is_started: false,
            should_fail_start: false,
            should_fail_stop: false,
            fail_stop_after: None,
            stops: 0,
            should_fail_read: false,
            error_message: "mock capture error".to_string(),
        }
    }

    /// Configure the chunks handed out by successive reads. Once exhausted,
    /// reads return empty chunks of the configured encoding.
    pub fn with_chunks(mut self, chunks: Vec<AudioChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn with_encoding(mut self, encoding: DeviceEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    pub fn with_stop_failure(mut self) -> Self {
        self.should_fail_stop = true;
        self
    }

    /// Let the first `successes` stops succeed, then fail. Models a device
    /// that disappears mid-session.
    pub fn with_stop_failure_after(mut self, successes: u32) -> Self {
        self.fail_stop_after = Some(successes);
        self
    }

    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }

    fn empty_chunk(&self) -> AudioChunk {
        match self.encoding {
            DeviceEncoding::PcmS16 { .. } => AudioChunk::Pcm(Vec::new()),
            DeviceEncoding::OggOpus => AudioChunk::Encoded(Vec::new()),
        }
    }
}

impl Default for MockCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for MockCaptureDevice {
    fn encoding(&self) -> DeviceEncoding {
        self.encoding
    }

    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(HumlyricError::DeviceUnavailable {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            self.next_chunk = 0;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.stops += 1;
        if self.should_fail_stop || self.fail_stop_after.is_some_and(|n| self.stops > n) {
            Err(HumlyricError::DeviceUnavailable {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = false;
            Ok(())
        }
    }

    fn read_chunk(&mut self) -> Result<AudioChunk> {
        if self.should_fail_read {
            return Err(HumlyricError::DeviceUnavailable {
                message: self.error_message.clone(),
            });
        }
        match self.chunks.get(self.next_chunk) {
            Some(chunk) => {
                self.next_chunk += 1;
                Ok(chunk.clone())
            }
            None => Ok(self.empty_chunk()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_returns_configured_chunks_in_order() {
        let mut device = MockCaptureDevice::new().with_chunks(vec![
            AudioChunk::Pcm(vec![1, 2, 3]),
            AudioChunk::Pcm(vec![4, 5]),
        ]);
        assert_eq!(device.read_chunk().unwrap(), AudioChunk::Pcm(vec![1, 2, 3]));
        assert_eq!(device.read_chunk().unwrap(), AudioChunk::Pcm(vec![4, 5]));
        // Exhausted: empty chunks from here on
        assert!(device.read_chunk().unwrap().is_empty());
    }

    #[test]
    fn test_mock_start_stop_state() {
        let mut device = MockCaptureDevice::new();
        assert!(!device.is_started());
        device.start().unwrap();
        assert!(device.is_started());
        device.stop().unwrap();
        assert!(!device.is_started());
    }

    #[test]
    fn test_mock_start_failure() {
        let mut device = MockCaptureDevice::new()
            .with_start_failure()
            .with_error_message("no input device");
        match device.start() {
            Err(HumlyricError::DeviceUnavailable { message }) => {
                assert_eq!(message, "no input device");
            }
            other => panic!("expected DeviceUnavailable, got {:?}", other),
        }
        assert!(!device.is_started());
    }

    #[test]
    fn test_mock_stop_failure_after_successes() {
        let mut device = MockCaptureDevice::new().with_stop_failure_after(1);
        device.start().unwrap();
        device.stop().unwrap();
        device.start().unwrap();
        assert!(matches!(
            device.stop(),
            Err(HumlyricError::DeviceUnavailable { .. })
        ));
    }

    #[test]
    fn test_mock_read_failure() {
        let mut device = MockCaptureDevice::new().with_read_failure();
        assert!(device.read_chunk().is_err());
    }

    #[test]
    fn test_mock_encoded_device_empty_chunk_kind() {
        let mut device = MockCaptureDevice::new()
            .with_encoding(DeviceEncoding::OggOpus)
            .with_chunks(vec![]);
        assert_eq!(device.read_chunk().unwrap(), AudioChunk::Encoded(Vec::new()));
    }

    #[test]
    fn test_trait_is_object_safe() {
        let mut device: Box<dyn CaptureDevice> = Box::new(MockCaptureDevice::new());
        device.start().unwrap();
        assert_eq!(
            device.encoding(),
            DeviceEncoding::PcmS16 {
                sample_rate: defaults::SAMPLE_RATE
            }
        );
        device.stop().unwrap();
    }

    #[test]
    fn test_restart_rewinds_chunks() {
        let mut device =
            MockCaptureDevice::new().with_chunks(vec![AudioChunk::Pcm(vec![7, 8])]);
        device.start().unwrap();
        let _ = device.read_chunk().unwrap();
        device.stop().unwrap();
        device.start().unwrap();
        assert_eq!(device.read_chunk().unwrap(), AudioChunk::Pcm(vec![7, 8]));
    }
}
