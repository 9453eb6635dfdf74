use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of a camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Planar YUV 4:2:0, what the analysis use-case delivers
    Yuv420,
    /// Packed RGB, 3 bytes per pixel, what gets encoded into a still
    Rgb24,
}

impl FrameFormat {
    /// Byte length of a `width` x `height` frame
    pub fn frame_len(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            FrameFormat::Yuv420 => pixels + pixels / 2,
            FrameFormat::Rgb24 => pixels * 3,
        }
    }
}

/// One camera frame plus metadata
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Monotonic frame identifier
    pub id: u64,
    /// Timestamp when the frame was produced
    pub timestamp: SystemTime,
    /// Raw frame bytes, shared between producer and analyzer
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
}

impl FrameData {
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Deterministic RGB frame: a diagonal gradient shifted by `id`
    pub fn gradient(id: u64, width: u32, height: u32) -> Self {
        let mut data = Vec::with_capacity(FrameFormat::Rgb24.frame_len(width, height));
        let shift = (id % 256) as u32;
        for y in 0..height {
            for x in 0..width {
                let r = ((x * 255) / width.max(1) + shift) % 256;
                let g = ((y * 255) / height.max(1) + shift) % 256;
                let b = ((x + y) / 4 + shift) % 256;
                data.extend_from_slice(&[r as u8, g as u8, b as u8]);
            }
        }
        Self::new(
            id,
            SystemTime::now(),
            data,
            width,
            height,
            FrameFormat::Rgb24,
        )
    }
}
