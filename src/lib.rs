//! PlateWatch: license plate recognition and violation lookup engine
//!
//! This crate provides the recognition pipeline behind a traffic-monitoring
//! dashboard: frame quality scoring, plate detection and text recognition
//! behind swappable model traits, OCR text cleanup, Vietnamese plate format
//! validation with best-effort reformatting, and a camera polling
//! orchestrator with single-inference-in-flight semantics.
//!
//! # Features
//! - Two-stage detection/recognition behind swappable model traits
//! - Simulated, seedable model for demos and offline testing
//! - Plate grammar validation with self-consistent suggestions
//! - Camera polling loop that halts on first detection
//! - Store traits for violations, search history, and scan persistence
//!
//! # Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use platewatch::config::PlateWatchConfig;
//! use platewatch::pipeline::RecognitionPipeline;
//! use platewatch::scanner::PlateScanner;
//! use platewatch::store::MemoryScanStore;
//!
//! # async fn run() {
//! let config = PlateWatchConfig::load_or_default();
//! let pipeline = Arc::new(RecognitionPipeline::simulated(config.pipeline.clone()));
//! let scanner = PlateScanner::new(pipeline, Arc::new(MemoryScanStore::new()), config.scanner);
//!
//! let image = image::open("vehicle.jpg").expect("readable image");
//! let report = scanner.scan_image(&image, Some("user-1")).await;
//! println!("{:?}", report);
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod quality;
pub mod scanner;
pub mod store;
pub mod testing;
pub mod text;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use config::PlateWatchConfig;
pub use errors::PlateWatchError;
pub use pipeline::RecognitionPipeline;
pub use quality::{assess_frame_quality, QualityLevel};
pub use scanner::{FrameSource, PlateScanner, WatchEvent, WatchSession};
pub use text::clean_plate_text;
pub use types::{
    DeviceType, ImageFrame, PlateBox, PlateCandidate, PlateSource, ProcessingStage, ScanReport,
};
pub use validation::{normalize_plate, validate_plate, PlateValidation};

/// Initialize logging for the recognition engine
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "platewatch=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "platewatch");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PlateWatchConfig::default().validate().is_ok());
    }
}
