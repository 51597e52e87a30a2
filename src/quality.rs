//! Frame quality scoring.
//!
//! Scores a captured frame for brightness and contrast, producing the
//! normalized quality score the detector feeds on. Blur analysis is out of
//! scope; plates are legible or they are not once brightness and contrast
//! are reasonable.

use crate::types::ImageFrame;

/// Weight of normalized brightness in the combined score.
pub const BRIGHTNESS_WEIGHT: f32 = 0.6;
/// Weight of sampled contrast in the combined score.
pub const CONTRAST_WEIGHT: f32 = 0.4;
/// Fixed boost applied before clamping; raw webcam frames skew dark.
pub const QUALITY_BOOST: f32 = 1.5;
/// Default pixel stride for the contrast sample.
pub const DEFAULT_SAMPLE_STRIDE: usize = 5;

/// Quality threshold for a frame considered good.
pub const QUALITY_GOOD: f32 = 0.7;
/// Quality threshold for a frame considered usable.
pub const QUALITY_MEDIUM: f32 = 0.5;

/// Coarse quality bucket reported alongside scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Good,
    Medium,
    Poor,
}

impl QualityLevel {
    pub fn from_score(score: f32) -> Self {
        if score >= QUALITY_GOOD {
            QualityLevel::Good
        } else if score >= QUALITY_MEDIUM {
            QualityLevel::Medium
        } else {
            QualityLevel::Poor
        }
    }
}

/// Score a frame with the default contrast stride.
pub fn assess_frame_quality(frame: &ImageFrame) -> f32 {
    assess_frame_quality_with(frame, DEFAULT_SAMPLE_STRIDE, QUALITY_BOOST)
}

/// Score a frame for brightness and contrast, normalized to [0, 1].
///
/// Mean brightness runs over every pixel; contrast is the max-min spread
/// of luminance sampled every `stride` pixels. Total function: malformed
/// or empty frames score 0.0.
pub fn assess_frame_quality_with(frame: &ImageFrame, stride: usize, boost: f32) -> f32 {
    let pixels = frame.pixel_count();
    if pixels == 0 || !frame.is_well_formed() {
        return 0.0;
    }

    let data = &frame.data;
    let mut sum: u64 = 0;
    for p in 0..pixels {
        let i = p * 4;
        sum += (data[i] as u32 + data[i + 1] as u32 + data[i + 2] as u32) as u64;
    }
    let brightness = sum as f32 / (pixels as f32 * 3.0);

    let stride = stride.max(1);
    let mut min_lum = f32::MAX;
    let mut max_lum = f32::MIN;
    let mut p = 0;
    while p < pixels {
        let i = p * 4;
        let lum = (data[i] as f32 + data[i + 1] as f32 + data[i + 2] as f32) / 3.0;
        min_lum = min_lum.min(lum);
        max_lum = max_lum.max(lum);
        p += stride;
    }
    let contrast = ((max_lum - min_lum) / 255.0).min(1.0);

    let score = (brightness / 255.0) * BRIGHTNESS_WEIGHT + contrast * CONTRAST_WEIGHT;
    (score * boost).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_frame(value: u8, width: u32, height: u32) -> ImageFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[value, value, value, 255]);
        }
        ImageFrame::new(data, width, height, "test".to_string())
    }

    #[test]
    fn test_empty_frame_scores_zero() {
        let frame = ImageFrame::new(Vec::new(), 0, 0, "test".to_string());
        assert_eq!(assess_frame_quality(&frame), 0.0);
    }

    #[test]
    fn test_malformed_frame_scores_zero() {
        let frame = ImageFrame::new(vec![255u8; 7], 4, 4, "test".to_string());
        assert_eq!(assess_frame_quality(&frame), 0.0);
    }

    #[test]
    fn test_bright_beats_dark() {
        let bright = uniform_frame(220, 16, 16);
        let dark = uniform_frame(15, 16, 16);
        assert!(assess_frame_quality(&bright) > assess_frame_quality(&dark));
    }

    #[test]
    fn test_uniform_frame_has_no_contrast() {
        // Pure white: brightness term saturates but contrast is zero.
        let white = uniform_frame(255, 8, 8);
        let score = assess_frame_quality(&white);
        let expected = (BRIGHTNESS_WEIGHT * QUALITY_BOOST).min(1.0);
        assert!((score - expected).abs() < 1e-5, "score {}", score);
    }

    #[test]
    fn test_score_clamped_to_one() {
        // Bright half, dark half: both terms near max, boost pushes past 1.0.
        let mut data = Vec::new();
        for p in 0..64 {
            let v = if p % 2 == 0 { 255 } else { 0 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
        let frame = ImageFrame::new(data, 8, 8, "test".to_string());
        let score = assess_frame_quality_with(&frame, 1, QUALITY_BOOST);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_quality_levels() {
        assert_eq!(QualityLevel::from_score(0.9), QualityLevel::Good);
        assert_eq!(QualityLevel::from_score(0.6), QualityLevel::Medium);
        assert_eq!(QualityLevel::from_score(0.2), QualityLevel::Poor);
    }
}
