//! Audio capture: device seam, recording controller and clip encoding.

pub mod capture;
#[cfg(feature = "cpal-audio")]
pub mod cpal_device;
pub mod device;

pub use capture::{CaptureController, Clip, ClipFormat};
pub use device::{AudioChunk, CaptureDevice, DeviceEncoding, MockCaptureDevice};
