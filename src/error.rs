//! Error types for spectral fusion operations.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, FusionError>;

/// Which input sensor a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    /// Lower-wavelength sensor (VNIR)
    Low,
    /// Higher-wavelength sensor (SWIR)
    High,
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensor::Low => write!(f, "low"),
            Sensor::High => write!(f, "high"),
        }
    }
}

/// Errors that can occur while fusing, loading or writing cubes.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Wavelength grid is not strictly increasing
    #[error(
        "{sensor} wavelength grid is not strictly increasing at band {index}: {previous} nm followed by {current} nm"
    )]
    NonAscendingGrid {
        /// Offending sensor
        sensor: Sensor,
        /// Index of the first band that breaks ordering
        index: usize,
        /// Wavelength of the preceding band
        previous: f64,
        /// Wavelength at `index`
        current: f64,
    },

    /// Wavelength grid contains NaN or infinity
    #[error("{sensor} wavelength grid has a non-finite value at band {index}")]
    NonFiniteWavelength {
        /// Offending sensor
        sensor: Sensor,
        /// Band index of the bad value
        index: usize,
    },

    /// Wavelength grid has no bands
    #[error("{sensor} wavelength grid is empty")]
    EmptyGrid {
        /// Offending sensor
        sensor: Sensor,
    },

    /// Input cubes do not share the same spatial extent
    #[error("spatial dimensions differ: low is {low:?} (rows, cols), high is {high:?}")]
    SpatialMismatch {
        /// Low cube (rows, cols)
        low: (usize, usize),
        /// High cube (rows, cols)
        high: (usize, usize),
    },

    /// Cube band count does not match its wavelength list
    #[error("cube has {bands} bands but {wavelengths} wavelengths")]
    BandCountMismatch {
        /// Bands in the data array
        bands: usize,
        /// Entries in the wavelength list
        wavelengths: usize,
    },

    /// Overlap bands are not a single contiguous run at the expected end of the grid
    #[error("{sensor} overlap bands are not contiguous at the grid edge")]
    NonContiguousOverlap {
        /// Offending sensor
        sensor: Sensor,
    },

    /// Scaled values exceeded the quantized container in strict mode
    #[error("{count} values overflow the uint16 range at scale factor {scale_factor}")]
    QuantizationOverflow {
        /// Number of overflowing values
        count: usize,
        /// Scale factor in use
        scale_factor: f64,
    },

    /// Assembled output disagrees with itself
    #[error("internal consistency check failed: {message}")]
    InternalConsistency {
        /// Description of the disagreement
        message: String,
    },

    /// Configuration is unusable
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },

    /// Required metadata field is missing or malformed
    #[error("Missing or malformed metadata field: {field}")]
    MissingMetadata {
        /// Name of the field
        field: String,
    },

    /// Header names an element type the store cannot decode
    #[error("Unsupported cube dtype '{dtype}'")]
    UnsupportedDtype {
        /// The header's dtype value
        dtype: String,
    },

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Array could not be reshaped
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// NumPy body could not be read
    #[error("NumPy read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// NumPy body could not be written
    #[error("NumPy write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),
}

impl FusionError {
    /// Create an internal consistency error with a message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalConsistency {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error with a message.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing metadata error.
    pub fn missing_metadata(field: impl Into<String>) -> Self {
        Self::MissingMetadata {
            field: field.into(),
        }
    }

    /// Whether this error belongs to the fail-fast input validation family.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NonAscendingGrid { .. }
                | Self::NonFiniteWavelength { .. }
                | Self::EmptyGrid { .. }
                | Self::SpatialMismatch { .. }
                | Self::BandCountMismatch { .. }
                | Self::NonContiguousOverlap { .. }
        )
    }
}

impl From<tempfile::PersistError> for FusionError {
    fn from(e: tempfile::PersistError) -> Self {
        Self::Io(e.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        let err = FusionError::SpatialMismatch {
            low: (2, 3),
            high: (2, 4),
        };
        assert!(err.is_validation());
        assert!(!FusionError::internal("bands diverged").is_validation());
    }

    #[test]
    fn test_display_mentions_sensor() {
        let err = FusionError::NonAscendingGrid {
            sensor: Sensor::High,
            index: 3,
            previous: 990.0,
            current: 980.0,
        };
        let message = err.to_string();
        assert!(message.starts_with("high wavelength grid"));
        assert!(message.contains("band 3"));
    }
}
