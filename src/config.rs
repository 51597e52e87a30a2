//! Configuration management for platewatch.
//!
//! Provides configuration loading, saving, and validation for pipeline
//! thresholds, scanner polling, and history retention.

use crate::errors::PlateWatchError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateWatchConfig {
    pub pipeline: PipelineConfig,
    pub scanner: ScannerConfig,
}

/// Recognition pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum detection probability to report a plate region (0.0-1.0)
    pub detection_threshold: f32,
    /// Minimum recognition probability to report plate text (0.0-1.0)
    pub recognition_threshold: f32,
    /// Pixel stride of the contrast sample in quality scoring
    pub quality_sample_stride: usize,
    /// Fixed multiplier applied to the combined quality score
    pub quality_boost: f32,
}

/// Scanner / polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Interval between camera polling ticks in milliseconds
    pub poll_interval_ms: u64,
    /// Most-recent search history entries returned per user
    pub history_limit: usize,
}

impl Default for PlateWatchConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            scanner: ScannerConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 0.7,
            recognition_threshold: 0.8,
            quality_sample_stride: crate::quality::DEFAULT_SAMPLE_STRIDE,
            quality_boost: crate::quality::QUALITY_BOOST,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            history_limit: 10,
        }
    }
}

impl PlateWatchConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PlateWatchError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            PlateWatchError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: PlateWatchConfig = toml::from_str(&contents).map_err(|e| {
            PlateWatchError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PlateWatchError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PlateWatchError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            PlateWatchError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            PlateWatchError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("platewatch.toml")
    }

    /// Load from default location or create with defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.pipeline.detection_threshold) {
            return Err("Detection threshold must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.pipeline.recognition_threshold) {
            return Err("Recognition threshold must be between 0.0 and 1.0".to_string());
        }
        if self.pipeline.quality_sample_stride == 0 {
            return Err("Quality sample stride must be at least 1".to_string());
        }
        if !(1.0..=3.0).contains(&self.pipeline.quality_boost) {
            return Err("Quality boost must be between 1.0 and 3.0".to_string());
        }

        if self.scanner.poll_interval_ms < 100 {
            return Err("Poll interval must be at least 100ms".to_string());
        }
        if self.scanner.history_limit == 0 || self.scanner.history_limit > 100 {
            return Err("History limit must be between 1 and 100".to_string());
        }

        Ok(())
    }
}
