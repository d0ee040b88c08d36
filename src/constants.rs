//! Global constants for spectral fusion

/// Default fixed-point multiplier applied to reflectance before quantization.
pub const DEFAULT_SCALE_FACTOR: f64 = 10_000.0;

/// Largest value representable by the quantized container.
pub const QUANTIZED_MAX: u16 = u16::MAX;

/// Number of distinct values in the quantized container (2^16).
pub const QUANTIZED_MODULUS: i64 = 1 << 16;

/// Data type tag written to output metadata.
pub const QUANTIZED_DTYPE: &str = "uint16";

/// Metadata keys consumed from inputs and produced for the writer.
pub mod metadata_keys {
    /// Ordered list of band centre wavelengths (nanometers).
    pub const WAVELENGTH: &str = "wavelength";
    /// Band count.
    pub const BANDS: &str = "bands";
    /// Row count.
    pub const LINES: &str = "lines";
    /// Column count.
    pub const SAMPLES: &str = "samples";
    /// Storage data type tag.
    pub const DTYPE: &str = "dtype";
    /// Multiplier used to convert reflectance into stored integers.
    pub const SCALE_FACTOR: &str = "reflectance scale factor";
}

/// Conversion between Gaussian FWHM and standard deviation: 2 * sqrt(2 * ln 2).
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// Gaussian response weights are evaluated out to this many standard deviations.
pub const GAUSSIAN_SUPPORT_SIGMAS: f64 = 3.0;
