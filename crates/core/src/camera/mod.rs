mod synthetic;

use bytes::Bytes;
use std::time::SystemTime;

pub use synthetic::SyntheticFrameSource;

/// Channel layout of a frame's pixel buffer. Capture devices commonly hand out
/// BGR; the classifier contract expects RGB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Bgr8,
    Rgb8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(&self) -> usize {
        3
    }
}

/// One captured frame. The pixel buffer is immutable and cheaply cloneable so
/// frames can cross thread boundaries without copying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Bytes,
    pub captured_at: SystemTime,
}

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("frame read failed: {0}")]
    ReadFailed(String),

    #[error("frame buffer is {actual} bytes, expected {expected}")]
    MalformedBuffer { expected: usize, actual: usize },
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Bytes,
        captured_at: SystemTime,
    ) -> Result<Self, CameraError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(CameraError::MalformedBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
            captured_at,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns this frame with pixels in RGB channel order, swizzling only when
    /// the source layout differs.
    pub fn to_rgb8(&self) -> Frame {
        match self.format {
            PixelFormat::Rgb8 => self.clone(),
            PixelFormat::Bgr8 => {
                let mut converted = self.data.to_vec();
                for px in converted.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                Frame {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Rgb8,
                    data: Bytes::from(converted),
                    captured_at: self.captured_at,
                }
            }
        }
    }
}

/// Frame acquisition collaborator. Implementations own the device handle; the
/// detection loop only borrows a source for the duration of one read.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
}
