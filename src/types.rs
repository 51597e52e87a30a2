//! Core data types shared across the recognition pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clamp a confidence score to the [0, 1] range.
///
/// Non-finite inputs collapse to 0.0 so a misbehaving recognizer can never
/// leak NaN into reports or stored records.
pub fn clamp_confidence(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// A single captured image, RGBA8 interleaved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFrame {
    /// Raw RGBA pixel data, `width * height * 4` bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Identifier of the capturing device ("upload" for file-based frames)
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ImageFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        Self {
            data,
            width,
            height,
            device_id,
            timestamp: Utc::now(),
        }
    }

    /// Build a frame from a decoded image (the upload path).
    pub fn from_dynamic_image(image: &image::DynamicImage, device_id: &str) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(rgba.into_raw(), width, height, device_id.to_string())
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// A frame is well-formed when the buffer holds exactly one RGBA quad
    /// per pixel.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.pixel_count() * 4
    }
}

/// Region of a frame where a plate was (reportedly) found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where a recognition attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateSource {
    Camera,
    Upload,
    Manual,
}

impl PlateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlateSource::Camera => "camera",
            PlateSource::Upload => "upload",
            PlateSource::Manual => "manual",
        }
    }

    /// Device type recorded when a scan from this source is persisted.
    pub fn device_type(&self) -> DeviceType {
        match self {
            PlateSource::Camera => DeviceType::Camera,
            PlateSource::Upload => DeviceType::Upload,
            PlateSource::Manual => DeviceType::Web,
        }
    }
}

/// Enumerated device types accepted by the scan store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Web,
    Mobile,
    Camera,
    Upload,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Web => "web",
            DeviceType::Mobile => "mobile",
            DeviceType::Camera => "camera",
            DeviceType::Upload => "upload",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "web" => Some(DeviceType::Web),
            "mobile" => Some(DeviceType::Mobile),
            "camera" => Some(DeviceType::Camera),
            "upload" => Some(DeviceType::Upload),
            _ => None,
        }
    }
}

/// Stage of the per-frame recognition cycle.
///
/// Each cycle runs idle -> detecting -> recognizing -> idle and is
/// restartable; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStage {
    Idle,
    Detecting,
    Recognizing,
}

/// One recognized plate, held only for the lifetime of the attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateCandidate {
    /// Text as produced by the recognizer, before cleanup
    pub raw_text: String,
    /// Cleaned, display-ready plate string
    pub text: String,
    pub confidence: f32,
    pub source: PlateSource,
}

impl PlateCandidate {
    pub fn new(raw_text: String, text: String, confidence: f32, source: PlateSource) -> Self {
        Self {
            raw_text,
            text,
            confidence: clamp_confidence(confidence),
            source,
        }
    }
}

/// Typed outcome of a recognition attempt.
///
/// Failures are reported through this struct rather than an error: a frame
/// with no plate in it is a normal outcome, not an exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub success: bool,
    pub candidate: Option<PlateCandidate>,
    pub confidence: f32,
    /// Quality score of the analyzed frame, [0, 1]
    pub quality: f32,
    pub message: Option<String>,
}

impl ScanReport {
    pub fn detected(candidate: PlateCandidate, quality: f32) -> Self {
        Self {
            success: true,
            confidence: candidate.confidence,
            candidate: Some(candidate),
            quality: clamp_confidence(quality),
            message: None,
        }
    }

    /// A tick that found nothing: sub-threshold detection or unreadable
    /// text. Not an error.
    pub fn miss(quality: f32, confidence: f32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            candidate: None,
            confidence: clamp_confidence(confidence),
            quality: clamp_confidence(quality),
            message: Some(message.into()),
        }
    }

    /// An external model call failed outright.
    pub fn failure(quality: f32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            candidate: None,
            confidence: 0.0,
            quality: clamp_confidence(quality),
            message: Some(message.into()),
        }
    }
}
