use thiserror::Error;

/// Crate-wide error type.
///
/// Every fallible operation in the pipeline returns one of these variants;
/// nothing in the recognition path throws past the orchestrator boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlateWatchError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("frame capture error: {0}")]
    CaptureError(String),
    #[error("recognition error: {0}")]
    RecognitionError(String),
    #[error("store error: {0}")]
    StoreError(String),
    #[error("invalid scan record: {0}")]
    InvalidScan(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlateWatchError::CaptureError("camera unplugged".to_string());
        assert_eq!(err.to_string(), "frame capture error: camera unplugged");

        let err = PlateWatchError::InvalidScan("plate too long".to_string());
        assert!(err.to_string().contains("invalid scan record"));
    }
}
