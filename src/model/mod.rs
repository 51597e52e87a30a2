//! Detection and recognition model boundary.
//!
//! The pipeline talks to plate models only through the [`PlateDetector`]
//! and [`PlateRecognizer`] traits, so the bundled simulated model can be
//! swapped for a real detector or an external OCR service without touching
//! the orchestrator.

pub mod simulated;

pub use simulated::{SimulatedDetector, SimulatedRecognizer};

use serde::{Deserialize, Serialize};

use crate::errors::PlateWatchError;
use crate::types::{ImageFrame, PlateBox};

/// Result of the detection stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub detected: bool,
    /// Detection probability, also reported for sub-threshold frames
    pub confidence: f32,
    pub region: Option<PlateBox>,
}

impl Detection {
    pub fn not_found(confidence: f32) -> Self {
        Self {
            detected: false,
            confidence,
            region: None,
        }
    }
}

/// Result of the text recognition stage. `text` is `None` when the
/// recognizer could not read a plate at its confidence bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub text: Option<String>,
    pub confidence: f32,
}

impl Recognition {
    pub fn unreadable() -> Self {
        Self {
            text: None,
            confidence: 0.0,
        }
    }
}

/// First stage: decide whether the frame contains a plate region.
pub trait PlateDetector: Send + Sync {
    fn detect(&self, frame: &ImageFrame, quality: f32) -> Detection;
}

/// Second stage: read the plate text out of a detected region.
///
/// External OCR backends may fail; the orchestrator converts any error
/// into a failed [`crate::types::ScanReport`], never a panic.
pub trait PlateRecognizer: Send + Sync {
    fn recognize(
        &self,
        frame: &ImageFrame,
        detection: &Detection,
        quality: f32,
    ) -> Result<Recognition, PlateWatchError>;
}
