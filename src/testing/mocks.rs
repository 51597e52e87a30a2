//! Scripted model implementations.
//!
//! Deterministic [`PlateDetector`] / [`PlateRecognizer`] stand-ins that
//! replay a queue of prepared responses, for driving the orchestrator
//! through exact scenarios (tick-by-tick confidences, slow inference,
//! failing backends).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::PlateWatchError;
use crate::model::{Detection, PlateDetector, PlateRecognizer, Recognition};
use crate::types::{ImageFrame, PlateBox};

/// Detector that replays a scripted sequence of confidences.
///
/// Each call pops the next confidence; once the script is exhausted every
/// further call reports confidence 0.0 (no detection).
pub struct ScriptedDetector {
    threshold: f32,
    script: Mutex<VecDeque<f32>>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(threshold: f32, confidences: Vec<f32>) -> Self {
        Self {
            threshold,
            script: Mutex::new(confidences.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn invocations(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PlateDetector for ScriptedDetector {
    fn detect(&self, frame: &ImageFrame, _quality: f32) -> Detection {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let confidence = self
            .script
            .lock()
            .expect("detector script poisoned")
            .pop_front()
            .unwrap_or(0.0);

        if confidence >= self.threshold {
            Detection {
                detected: true,
                confidence,
                region: Some(PlateBox {
                    x: frame.width as f32 * 0.4,
                    y: frame.height as f32 * 0.4,
                    width: frame.width as f32 * 0.25,
                    height: frame.height as f32 * 0.08,
                }),
            }
        } else {
            Detection::not_found(confidence)
        }
    }
}

/// Recognizer that replays a scripted sequence of responses, optionally
/// stalling each call to simulate slow inference.
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<Result<Recognition, PlateWatchError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(responses: Vec<Result<Recognition, PlateWatchError>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Recognizer that reads the given plate on every call.
    pub fn reading(text: &str, confidence: f32, repeats: usize) -> Self {
        let response = Ok(Recognition {
            text: Some(text.to_string()),
            confidence,
        });
        Self::new(vec![response; repeats])
    }

    /// Stall every call by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PlateRecognizer for ScriptedRecognizer {
    fn recognize(
        &self,
        _frame: &ImageFrame,
        _detection: &Detection,
        _quality: f32,
    ) -> Result<Recognition, PlateWatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            // Runs on the blocking pool; a thread sleep is the point here
            std::thread::sleep(delay);
        }
        self.script
            .lock()
            .expect("recognizer script poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(Recognition::unreadable()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_plate_frame;

    #[test]
    fn test_scripted_detector_replays_then_goes_quiet() {
        let frame = synthetic_plate_frame(0, 32, 32);
        let detector = ScriptedDetector::new(0.7, vec![0.65, 0.92]);

        let first = detector.detect(&frame, 1.0);
        assert!(!first.detected);
        assert!((first.confidence - 0.65).abs() < 1e-6);

        let second = detector.detect(&frame, 1.0);
        assert!(second.detected);
        assert!(second.region.is_some());

        let exhausted = detector.detect(&frame, 1.0);
        assert!(!exhausted.detected);
        assert_eq!(exhausted.confidence, 0.0);
        assert_eq!(detector.invocations(), 3);
    }

    #[test]
    fn test_scripted_recognizer_replays() {
        let frame = synthetic_plate_frame(0, 32, 32);
        let detection = Detection::not_found(0.9);
        let recognizer = ScriptedRecognizer::reading("51F23891", 0.9, 1);

        let first = recognizer.recognize(&frame, &detection, 1.0).unwrap();
        assert_eq!(first.text.as_deref(), Some("51F23891"));

        let exhausted = recognizer.recognize(&frame, &detection, 1.0).unwrap();
        assert!(exhausted.text.is_none());
        assert_eq!(recognizer.invocations(), 2);
    }
}
