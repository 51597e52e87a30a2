//! Synthetic camera frames.
//!
//! Generated RGBA buffers with known brightness/contrast characteristics,
//! so quality scoring and the polling loop can be exercised offline with
//! predictable outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::PlateWatchError;
use crate::scanner::FrameSource;
use crate::types::ImageFrame;

/// A bright, high-contrast frame that scores well on quality.
///
/// Content varies with `sequence` so consecutive captures differ, the way
/// real video frames do.
pub fn synthetic_plate_frame(sequence: u64, width: u32, height: u32) -> ImageFrame {
    let mut data = vec![0u8; (width * height * 4) as usize];
    let base = (sequence % 64) as u8;

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 4) as usize;
            // Luminance swings between 128 and 255 across the frame
            let value = 128u8.wrapping_add(((x + y) as u8).wrapping_add(base) % 128);
            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value;
            data[idx + 3] = 255;
        }
    }

    ImageFrame::new(data, width, height, "synthetic".to_string())
}

/// A dark, flat frame that scores poorly on quality.
pub fn synthetic_dark_frame(width: u32, height: u32) -> ImageFrame {
    let mut data = vec![0u8; (width * height * 4) as usize];
    for pixel in data.chunks_exact_mut(4) {
        pixel[0] = 10;
        pixel[1] = 10;
        pixel[2] = 10;
        pixel[3] = 255;
    }
    ImageFrame::new(data, width, height, "synthetic_dark".to_string())
}

/// Frame source producing bright synthetic frames with a running counter.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    captured: AtomicU64,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            captured: AtomicU64::new(0),
        }
    }

    /// Number of frames handed out so far.
    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::SeqCst)
    }
}

impl FrameSource for SyntheticCamera {
    fn capture_frame(&self) -> Result<ImageFrame, PlateWatchError> {
        let sequence = self.captured.fetch_add(1, Ordering::SeqCst);
        Ok(synthetic_plate_frame(sequence, self.width, self.height))
    }
}

/// Frame source that always fails, for exercising capture-error paths.
pub struct DisconnectedCamera;

impl FrameSource for DisconnectedCamera {
    fn capture_frame(&self) -> Result<ImageFrame, PlateWatchError> {
        Err(PlateWatchError::CaptureError(
            "camera is not connected".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{assess_frame_quality, QualityLevel};

    #[test]
    fn test_synthetic_frame_correct_size() {
        let frame = synthetic_plate_frame(0, 320, 240);
        assert_eq!(frame.width, 320);
        assert_eq!(frame.height, 240);
        assert!(frame.is_well_formed());
    }

    #[test]
    fn test_synthetic_frames_differ() {
        let frame0 = synthetic_plate_frame(0, 64, 64);
        let frame1 = synthetic_plate_frame(1, 64, 64);
        assert_ne!(frame0.data, frame1.data);
    }

    #[test]
    fn test_bright_frame_scores_good() {
        let frame = synthetic_plate_frame(0, 64, 64);
        let score = assess_frame_quality(&frame);
        assert_eq!(QualityLevel::from_score(score), QualityLevel::Good);
    }

    #[test]
    fn test_dark_frame_scores_poor() {
        let frame = synthetic_dark_frame(64, 64);
        let score = assess_frame_quality(&frame);
        assert_eq!(QualityLevel::from_score(score), QualityLevel::Poor);
    }

    #[test]
    fn test_synthetic_camera_counts_captures() {
        let camera = SyntheticCamera::new(32, 32);
        assert_eq!(camera.captured(), 0);
        camera.capture_frame().unwrap();
        camera.capture_frame().unwrap();
        assert_eq!(camera.captured(), 2);
    }

    #[test]
    fn test_disconnected_camera_fails() {
        assert!(DisconnectedCamera.capture_frame().is_err());
    }
}
