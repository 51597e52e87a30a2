//! Testing utilities for platewatch.
//!
//! Synthetic frames and scripted model implementations for reliable
//! offline testing without cameras or a real recognizer.

pub mod mocks;
pub mod synthetic_data;

pub use mocks::{ScriptedDetector, ScriptedRecognizer};
pub use synthetic_data::{
    synthetic_dark_frame, synthetic_plate_frame, DisconnectedCamera, SyntheticCamera,
};
