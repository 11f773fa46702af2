//! Error types for boundary detection

use std::fmt;

/// Errors that can occur during boundary detection
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Invalid input (empty signal, zero sample rate, bad time range)
    InvalidInput(String),

    /// Detection parameter outside its valid domain
    InvalidParameter(String),

    /// Audio decoding error
    DecodingError(String),

    /// Processing error during detection
    ProcessingError(String),

    /// Detection was cancelled through its token
    Cancelled,
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DetectionError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            DetectionError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            DetectionError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            DetectionError::Cancelled => write!(f, "Detection cancelled"),
        }
    }
}

impl std::error::Error for DetectionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = DetectionError::InvalidParameter("ratio must be in (0, 1]".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: ratio must be in (0, 1]");
        assert_eq!(DetectionError::Cancelled.to_string(), "Detection cancelled");
    }
}
