//! Simulated detection and recognition models.
//!
//! Stand-ins for a trained detector and OCR backend, useful for demos and
//! offline testing. Both draw from a private SplitMix64 stream, so a model
//! built with [`SimulatedDetector::with_seed`] replays the exact same
//! decisions run after run. Detection probability is keyed off the frame
//! quality score, matching how a real model degrades on dark or washed-out
//! frames.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::PlateWatchError;
use crate::model::{Detection, PlateDetector, PlateRecognizer, Recognition};
use crate::types::{ImageFrame, PlateBox};

/// Plates known to the demo violation store; the simulated recognizer
/// prefers these so scans usually hit a record.
pub const SAMPLE_PLATES: [&str; 5] = [
    "43A-123.45",
    "92C-437.19",
    "43B-592.73",
    "51G-246.81",
    "74D-555.32",
];

/// Province prefixes used when synthesizing a fresh plate.
pub const PROVINCE_CODES: [&str; 6] = ["43A", "51G", "92C", "74D", "38H", "43B"];

/// Small deterministic PRNG (SplitMix64). Enough randomness for a
/// simulated model without pulling in an RNG dependency, and seedable so
/// tests can replay a run.
#[derive(Debug, Clone)]
pub(crate) struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(0x4d595df4d0f33173);
        Self::new(nanos ^ 0x9e3779b97f4a7c15)
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Uniform draw in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    pub fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }
}

/// Simulated plate detector.
///
/// Draws a detection probability from the frame quality plus a random
/// component; at or above the threshold it synthesizes a center-biased
/// bounding box the way a plate typically sits in a traffic frame.
pub struct SimulatedDetector {
    threshold: f32,
    rng: Mutex<SplitMix64>,
}

impl SimulatedDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            rng: Mutex::new(SplitMix64::from_entropy()),
        }
    }

    pub fn with_seed(threshold: f32, seed: u64) -> Self {
        Self {
            threshold,
            rng: Mutex::new(SplitMix64::new(seed)),
        }
    }
}

impl PlateDetector for SimulatedDetector {
    fn detect(&self, frame: &ImageFrame, quality: f32) -> Detection {
        let mut rng = self.rng.lock().expect("detector rng poisoned");

        let probability = (quality * 0.9 + rng.next_f32() * 0.25).min(0.98);
        if probability < self.threshold {
            return Detection::not_found(probability);
        }

        let width = frame.width as f32;
        let height = frame.height as f32;

        // Center-ish box with randomized size
        let center_x = width * (0.4 + rng.next_f32() * 0.2);
        let center_y = height * (0.4 + rng.next_f32() * 0.2);
        let box_width = width * (0.2 + rng.next_f32() * 0.15);
        let box_height = box_width * (0.3 + rng.next_f32() * 0.1);

        Detection {
            detected: true,
            confidence: probability,
            region: Some(PlateBox {
                x: center_x - box_width / 2.0,
                y: center_y - box_height / 2.0,
                width: box_width,
                height: box_height,
            }),
        }
    }
}

/// Simulated plate text recognizer.
///
/// Only attempts a read when detection confidence clears the detection
/// threshold; the recognition probability then combines detection
/// confidence, frame quality, and a random component. Successful reads
/// mostly return one of [`SAMPLE_PLATES`], otherwise a synthesized plate.
pub struct SimulatedRecognizer {
    detection_threshold: f32,
    recognition_threshold: f32,
    rng: Mutex<SplitMix64>,
}

impl SimulatedRecognizer {
    pub fn new(detection_threshold: f32, recognition_threshold: f32) -> Self {
        Self {
            detection_threshold,
            recognition_threshold,
            rng: Mutex::new(SplitMix64::from_entropy()),
        }
    }

    pub fn with_seed(detection_threshold: f32, recognition_threshold: f32, seed: u64) -> Self {
        Self {
            detection_threshold,
            recognition_threshold,
            rng: Mutex::new(SplitMix64::new(seed)),
        }
    }
}

impl PlateRecognizer for SimulatedRecognizer {
    fn recognize(
        &self,
        _frame: &ImageFrame,
        detection: &Detection,
        quality: f32,
    ) -> Result<Recognition, PlateWatchError> {
        if detection.confidence < self.detection_threshold {
            return Ok(Recognition::unreadable());
        }

        let mut rng = self.rng.lock().expect("recognizer rng poisoned");

        let probability =
            (detection.confidence * 0.8 + quality * 0.2 + rng.next_f32() * 0.15).min(0.98);
        if probability < self.recognition_threshold {
            return Ok(Recognition::unreadable());
        }

        // Prefer plates the demo store knows about
        let text = if rng.next_f32() < 0.8 {
            SAMPLE_PLATES[rng.next_index(SAMPLE_PLATES.len())].to_string()
        } else {
            let province = PROVINCE_CODES[rng.next_index(PROVINCE_CODES.len())];
            let digits = format!("{:05}", rng.next_u64() % 100_000);
            format!("{}-{}.{}", province, &digits[..3], &digits[3..])
        };

        Ok(Recognition {
            text: Some(text),
            confidence: probability,
        })
    }
}
