//! Single-pass recognition pipeline: quality -> detect -> recognize ->
//! clean -> validate.
//!
//! The pipeline is an explicitly constructed, owned resource: build it once
//! at startup, hand it to the scanner by `Arc`. There is no lazily
//! initialized global model handle.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::model::{Detection, PlateDetector, PlateRecognizer, SimulatedDetector, SimulatedRecognizer};
use crate::quality::assess_frame_quality_with;
use crate::text::clean_plate_text;
use crate::types::{ImageFrame, PlateCandidate, PlateSource, ScanReport};
use crate::validation::validate_plate;

/// Confidence reported when recognized text cannot be shaped into any
/// known plate grammar.
const UNREADABLE_TEXT_CONFIDENCE: f32 = 0.3;

pub struct RecognitionPipeline {
    detector: Arc<dyn PlateDetector>,
    recognizer: Arc<dyn PlateRecognizer>,
    config: PipelineConfig,
}

impl RecognitionPipeline {
    pub fn new(
        detector: Arc<dyn PlateDetector>,
        recognizer: Arc<dyn PlateRecognizer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            detector,
            recognizer,
            config,
        }
    }

    /// Pipeline backed by the simulated model, seeded from entropy.
    pub fn simulated(config: PipelineConfig) -> Self {
        let detector = Arc::new(SimulatedDetector::new(config.detection_threshold));
        let recognizer = Arc::new(SimulatedRecognizer::new(
            config.detection_threshold,
            config.recognition_threshold,
        ));
        Self::new(detector, recognizer, config)
    }

    /// Pipeline backed by the simulated model with a fixed seed; replays
    /// identical decisions run after run.
    pub fn simulated_with_seed(config: PipelineConfig, seed: u64) -> Self {
        let detector = Arc::new(SimulatedDetector::with_seed(
            config.detection_threshold,
            seed,
        ));
        let recognizer = Arc::new(SimulatedRecognizer::with_seed(
            config.detection_threshold,
            config.recognition_threshold,
            seed.wrapping_add(1),
        ));
        Self::new(detector, recognizer, config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Quality-score a frame with the configured stride and boost.
    pub fn assess(&self, frame: &ImageFrame) -> f32 {
        assess_frame_quality_with(
            frame,
            self.config.quality_sample_stride,
            self.config.quality_boost,
        )
    }

    /// Run only the detection stage.
    pub fn detect(&self, frame: &ImageFrame, quality: f32) -> Detection {
        self.detector.detect(frame, quality)
    }

    /// Run recognition, cleanup, and validation over an already-detected
    /// frame.
    pub fn recognize(
        &self,
        frame: &ImageFrame,
        detection: &Detection,
        quality: f32,
        source: PlateSource,
    ) -> ScanReport {
        let recognition = match self.recognizer.recognize(frame, detection, quality) {
            Ok(recognition) => recognition,
            Err(e) => {
                log::warn!("Recognizer failed: {}", e);
                return ScanReport::failure(quality, e.to_string());
            }
        };

        let Some(raw_text) = recognition.text else {
            return ScanReport::miss(
                quality,
                recognition.confidence,
                "Text below recognition threshold",
            );
        };

        let cleaned = clean_plate_text(&raw_text);
        let validation = validate_plate(&cleaned);

        // Valid text passes through; salvageable text is replaced by the
        // validator's suggestion, which is guaranteed to re-validate.
        let plate = if validation.is_valid {
            cleaned
        } else if let Some(suggestion) = validation.suggestion {
            log::debug!("Reformatted recognized text {:?} as {:?}", cleaned, suggestion);
            suggestion
        } else {
            log::debug!("Recognized text {:?} is not a plate: {}", cleaned, validation.message);
            return ScanReport::miss(quality, UNREADABLE_TEXT_CONFIDENCE, validation.message);
        };

        let candidate = PlateCandidate::new(raw_text, plate, recognition.confidence, source);
        log::info!(
            "Recognized plate {} (confidence {:.2}, source {})",
            candidate.text,
            candidate.confidence,
            candidate.source.as_str()
        );
        ScanReport::detected(candidate, quality)
    }

    /// Full single-pass run over one frame.
    pub fn process_frame(&self, frame: &ImageFrame, source: PlateSource) -> ScanReport {
        let quality = self.assess(frame);
        log::debug!(
            "Processing {}x{} frame from {:?}, quality {:.2}",
            frame.width,
            frame.height,
            frame.device_id,
            quality
        );

        let detection = self.detect(frame, quality);
        if !detection.detected {
            return ScanReport::miss(
                quality,
                detection.confidence,
                "No plate region found in frame",
            );
        }

        self.recognize(frame, &detection, quality, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::errors::PlateWatchError;
    use crate::model::Recognition;

    struct NeverDetects;
    impl PlateDetector for NeverDetects {
        fn detect(&self, _frame: &ImageFrame, _quality: f32) -> Detection {
            Detection::not_found(0.2)
        }
    }

    struct AlwaysDetects;
    impl PlateDetector for AlwaysDetects {
        fn detect(&self, _frame: &ImageFrame, _quality: f32) -> Detection {
            Detection {
                detected: true,
                confidence: 0.92,
                region: None,
            }
        }
    }

    struct FixedText(&'static str);
    impl PlateRecognizer for FixedText {
        fn recognize(
            &self,
            _frame: &ImageFrame,
            _detection: &Detection,
            _quality: f32,
        ) -> Result<Recognition, PlateWatchError> {
            Ok(Recognition {
                text: Some(self.0.to_string()),
                confidence: 0.9,
            })
        }
    }

    struct Broken;
    impl PlateRecognizer for Broken {
        fn recognize(
            &self,
            _frame: &ImageFrame,
            _detection: &Detection,
            _quality: f32,
        ) -> Result<Recognition, PlateWatchError> {
            Err(PlateWatchError::RecognitionError("model crashed".to_string()))
        }
    }

    fn frame() -> ImageFrame {
        ImageFrame::new(vec![200u8; 16 * 16 * 4], 16, 16, "test".to_string())
    }

    fn pipeline(
        detector: impl PlateDetector + 'static,
        recognizer: impl PlateRecognizer + 'static,
    ) -> RecognitionPipeline {
        RecognitionPipeline::new(
            Arc::new(detector),
            Arc::new(recognizer),
            PipelineConfig::default(),
        )
    }

    #[test]
    fn test_miss_when_nothing_detected() {
        let report = pipeline(NeverDetects, FixedText("51F23891"))
            .process_frame(&frame(), PlateSource::Camera);
        assert!(!report.success);
        assert!(report.candidate.is_none());
        assert!((report.confidence - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_valid_text_passes_through_cleaned() {
        let report = pipeline(AlwaysDetects, FixedText("51f 238 91"))
            .process_frame(&frame(), PlateSource::Upload);
        assert!(report.success);
        let candidate = report.candidate.expect("successful report has a candidate");
        assert_eq!(candidate.text, "51F23891");
        assert_eq!(candidate.raw_text, "51f 238 91");
        assert_eq!(candidate.source, PlateSource::Upload);
    }

    #[test]
    fn test_salvageable_text_uses_suggestion() {
        // Cleaned "43A1234" matches no grammar; validator suggests 43A-1234
        let report = pipeline(AlwaysDetects, FixedText("43a/1234"))
            .process_frame(&frame(), PlateSource::Camera);
        assert!(report.success);
        assert_eq!(report.candidate.unwrap().text, "43A-1234");
    }

    #[test]
    fn test_unshapeable_text_is_a_miss() {
        let report = pipeline(AlwaysDetects, FixedText("garbage"))
            .process_frame(&frame(), PlateSource::Camera);
        assert!(!report.success);
        assert!(report.candidate.is_none());
        assert!((report.confidence - UNREADABLE_TEXT_CONFIDENCE).abs() < 1e-6);
    }

    #[test]
    fn test_recognizer_error_becomes_failure_report() {
        let report = pipeline(AlwaysDetects, Broken).process_frame(&frame(), PlateSource::Camera);
        assert!(!report.success);
        assert_eq!(report.confidence, 0.0);
        assert!(report.message.unwrap().contains("model crashed"));
    }
}
