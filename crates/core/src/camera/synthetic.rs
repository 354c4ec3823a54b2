use crate::camera::{CameraError, Frame, FrameSource, PixelFormat};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::SystemTime;

/// Deterministic stand-in for a webcam. Emits flat-tinted BGR frames that
/// slowly drift through a palette, with a little per-pixel noise so downstream
/// statistics are not degenerate.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    tints: Vec<[u8; 3]>,
    frames_per_tint: u32,
    emitted: u32,
    rng: StdRng,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        Self {
            width,
            height,
            // BGR tints roughly spanning the classifier's chroma heuristics.
            tints: vec![
                [40, 180, 220],
                [60, 60, 200],
                [200, 80, 40],
                [120, 120, 120],
            ],
            frames_per_tint: 8,
            emitted: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_tints(mut self, tints: Vec<[u8; 3]>) -> Self {
        if !tints.is_empty() {
            self.tints = tints;
        }
        self
    }
}

impl FrameSource for SyntheticFrameSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let tint_idx = (self.emitted / self.frames_per_tint) as usize % self.tints.len();
        let tint = self.tints[tint_idx];
        self.emitted = self.emitted.wrapping_add(1);

        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for _ in 0..self.width as usize * self.height as usize {
            for channel in tint {
                let noise: i16 = self.rng.random_range(-8..=8);
                data.push((channel as i16 + noise).clamp(0, 255) as u8);
            }
        }

        Frame::new(
            self.width,
            self.height,
            PixelFormat::Bgr8,
            Bytes::from(data),
            SystemTime::now(),
        )
    }
}
