//! Real capture device using CPAL (Cross-Platform Audio Library).

use crate::audio::device::{AudioChunk, CaptureDevice, DeviceEncoding};
use crate::error::{HumlyricError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// Suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers while
/// probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2.
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Preferred device names for GNOME/PipeWire environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List available audio input devices, preferred ones marked "\[recommended\]".
///
/// # Errors
/// Returns `DeviceUnavailable` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| HumlyricError::DeviceUnavailable {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Get the best default input device, preferring PipeWire/PulseAudio so the
/// desktop's device selection is respected.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name()
                    && is_preferred_device(&name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| HumlyricError::DeviceUnavailable {
                message: "no default input device".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched from the thread driving the capture
/// controller; it is never shared across threads.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone capture via CPAL, delivering 16-bit mono PCM chunks.
///
/// Tries i16 at the target rate first (zero-copy path), then f32 with sample
/// conversion for devices that only expose float formats. PipeWire and
/// PulseAudio resample transparently for both.
pub struct CpalCaptureDevice {
    device: cpal::Device,
    stream: Option<SendableStream>,
    buffer: Arc<Mutex<Vec<i16>>>,
    sample_rate: u32,
}

impl CpalCaptureDevice {
    /// Create a capture device.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name; `None` picks the best default.
    /// * `sample_rate` - Target capture rate; PipeWire/PulseAudio resample to
    ///   it transparently.
    ///
    /// # Errors
    /// `DeviceUnavailable` if the named device does not exist or no input
    /// device is available.
    pub fn new(device_name: Option<&str>, sample_rate: u32) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host
                    .input_devices()
                    .map_err(|e| HumlyricError::DeviceUnavailable {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                for dev in devices {
                    if let Ok(dev_name) = dev.name()
                        && dev_name == name
                    {
                        return Ok(dev);
                    }
                }

                Err(HumlyricError::DeviceUnavailable {
                    message: format!("input device not found: {}", name),
                })
            } else {
                get_best_default_device()
            }
        })?;

        Ok(Self {
            device,
            stream: None,
            buffer: Arc::new(Mutex::new(Vec::new())),
            sample_rate,
        })
    }

    /// Build the input stream: i16 first, f32 with conversion as fallback.
    fn build_stream(&self) -> Result<cpal::Stream> {
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            tracing::warn!("audio stream error: {}", err);
        };

        let buffer = Arc::clone(&self.buffer);
        if let Ok(stream) = self.device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        let buffer = Arc::clone(&self.buffer);
        self.device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend(
                            data.iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                        );
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| HumlyricError::DeviceUnavailable {
                message: format!("Failed to build input stream: {}", e),
            })
    }
}

impl CaptureDevice for CpalCaptureDevice {
    fn encoding(&self) -> DeviceEncoding {
        DeviceEncoding::PcmS16 {
            sample_rate: self.sample_rate,
        }
    }

    fn start(&mut self) -> Result<()> {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
        let stream = self.build_stream()?;
        stream.play().map_err(|e| HumlyricError::DeviceUnavailable {
            message: format!("Failed to start input stream: {}", e),
        })?;
        self.stream = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        // Dropping the stream releases the hardware handle.
        self.stream = None;
        Ok(())
    }

    fn read_chunk(&mut self) -> Result<AudioChunk> {
        let samples = match self.buffer.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => Vec::new(),
        };
        Ok(AudioChunk::Pcm(samples))
    }
}
