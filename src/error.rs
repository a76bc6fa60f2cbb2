//! Error types and handling for crier

/// Result type alias for crier operations
pub type Result<T> = std::result::Result<T, CrierError>;

/// Error types for the crier broadcast transport
///
/// Only configuration and resource failures are represented here. The
/// steady-state races of the broadcast protocol are ordinary return values:
/// a torn read surfaces as `validate() == false` and a lapped receiver as an
/// incremented `lap_count()`, never as an error.
#[derive(Debug, thiserror::Error)]
pub enum CrierError {
    /// I/O related errors (file operations, mmap, etc.)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Insufficient space for a region or a record
    #[error("Insufficient space: requested {requested}, available {available}")]
    InsufficientSpace { requested: usize, available: usize },

    /// Alignment requirements not met
    #[error("Alignment error: address {address:#x} not aligned to {alignment}")]
    Alignment { address: usize, alignment: usize },

    /// A copying receiver fell so far behind that a message was overwritten
    /// while it was being copied out
    #[error("Receiver overrun: {message}")]
    Overrun { message: String },

    /// Platform-specific errors
    #[error("Platform error: {message}")]
    Platform { message: String },
}

impl CrierError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an insufficient space error
    pub fn insufficient_space(requested: usize, available: usize) -> Self {
        Self::InsufficientSpace {
            requested,
            available,
        }
    }

    /// Create an alignment error
    pub fn alignment(address: usize, alignment: usize) -> Self {
        Self::Alignment { address, alignment }
    }

    /// Create a receiver overrun error
    pub fn overrun(message: impl Into<String>) -> Self {
        Self::Overrun {
            message: message.into(),
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for CrierError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CrierError::invalid_parameter("capacity", "not a power of two");
        assert!(matches!(err, CrierError::InvalidParameter { .. }));

        let err = CrierError::insufficient_space(1024, 512);
        assert!(matches!(err, CrierError::InsufficientSpace { .. }));

        let err = CrierError::alignment(0x1003, 8);
        assert!(matches!(err, CrierError::Alignment { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = CrierError::invalid_parameter("capacity", "not a power of two");
        let display = format!("{}", err);
        assert!(display.contains("Invalid parameter"));
        assert!(display.contains("capacity"));

        let err = CrierError::insufficient_space(256, 128);
        let display = format!("{}", err);
        assert!(display.contains("requested 256"));
        assert!(display.contains("available 128"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CrierError = io_err.into();
        assert!(matches!(err, CrierError::Io { .. }));
    }
}
