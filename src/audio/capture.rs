//! Capture controller: accumulates device chunks into one encoded clip.
//!
//! Format selection policy: a PCM-capable device gets the lossless path (the
//! raw samples are wrapped in a WAV container on finalize); a device that
//! only delivers compressed frames has its bytes passed through untouched.
//! Either way the resulting clip is tagged with the format actually used, so
//! the upload step can set the matching content type and filename suffix.

use crate::audio::device::{AudioChunk, CaptureDevice, DeviceEncoding};
use crate::error::{HumlyricError, Result};
use std::io::Cursor;

/// Container format of a finalized clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipFormat {
    /// Lossless PCM in a WAV container (preferred).
    Wav,
    /// Compressed Ogg/Opus fallback.
    OggOpus,
}

impl ClipFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ClipFormat::Wav => "audio/wav",
            ClipFormat::OggOpus => "audio/ogg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ClipFormat::Wav => "wav",
            ClipFormat::OggOpus => "ogg",
        }
    }
}

/// One finalized recording, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub bytes: Vec<u8>,
    pub format: ClipFormat,
}

/// Owns the exclusive recording device handle and accumulates raw audio
/// chunks into a single encoded clip.
pub struct CaptureController {
    device: Box<dyn CaptureDevice>,
    active: bool,
    pcm: Vec<i16>,
    encoded: Vec<u8>,
}

impl CaptureController {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            device,
            active: false,
            pcm: Vec::new(),
            encoded: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Acquire the device exclusively and begin accumulating.
    ///
    /// # Errors
    /// `DeviceUnavailable` if the device cannot start; `CaptureActive` if a
    /// capture is already running (programming error, the session state
    /// machine never reaches this).
    pub fn start(&mut self) -> Result<()> {
        if self.active {
            return Err(HumlyricError::CaptureActive);
        }
        self.device.start()?;
        self.pcm.clear();
        self.encoded.clear();
        self.active = true;
        Ok(())
    }

    /// Drain one buffered chunk from the device. No-op while idle.
    pub fn poll(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        let chunk = self.device.read_chunk()?;
        self.accumulate(chunk);
        Ok(())
    }

    /// Finalize the clip. Idle stop is a no-op returning `None`.
    ///
    /// The device is released on every exit path, including a failed final
    /// drain; only after release is the clip encoded.
    pub fn stop(&mut self) -> Result<Option<Clip>> {
        if !self.active {
            return Ok(None);
        }

        let drain_result = self.drain();
        let stop_result = self.device.stop();
        self.active = false;

        drain_result?;
        stop_result?;

        let clip = self.encode()?;
        Ok(Some(clip))
    }

    /// Read chunks until the device reports its buffer empty.
    fn drain(&mut self) -> Result<()> {
        loop {
            let chunk = self.device.read_chunk()?;
            if chunk.is_empty() {
                return Ok(());
            }
            self.accumulate(chunk);
        }
    }

    fn accumulate(&mut self, chunk: AudioChunk) {
        match chunk {
            AudioChunk::Pcm(samples) => self.pcm.extend_from_slice(&samples),
            AudioChunk::Encoded(bytes) => self.encoded.extend_from_slice(&bytes),
        }
    }

    fn encode(&mut self) -> Result<Clip> {
        match self.device.encoding() {
            DeviceEncoding::PcmS16 { sample_rate } => {
                let bytes = encode_wav(&self.pcm, sample_rate)?;
                self.pcm.clear();
                Ok(Clip {
                    bytes,
                    format: ClipFormat::Wav,
                })
            }
            DeviceEncoding::OggOpus => Ok(Clip {
                bytes: std::mem::take(&mut self.encoded),
                format: ClipFormat::OggOpus,
            }),
        }
    }
}

/// Wrap mono i16 samples in a WAV container, in memory.
fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| {
        HumlyricError::Other(format!("Failed to create WAV writer: {}", e))
    })?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| HumlyricError::Other(format!("Failed to write WAV sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| HumlyricError::Other(format!("Failed to finalize WAV clip: {}", e)))?;

    Ok(cursor.into_inner())
}
