//! HSFUSE - Hyperspectral Spectral-overlap Fusion
//!
//! Fuses a co-registered VNIR ("low") and SWIR ("high") hyperspectral cube
//! into one continuous-spectrum cube with a strictly increasing wavelength
//! axis, quantized to `u16` reflectance for storage.
//!
//! ```rust,ignore
//! use hsfuse::{FusionOptions, HyperspectralCube, fusion};
//!
//! let output = fusion::fuse(low, high, &FusionOptions::default())?;
//! assert_eq!(output.quantized.metadata.bands, output.report.final_bands());
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod fusion;
pub mod hyperspectral;
pub mod io;

pub use config::{FusionConfig, FusionOptions, LogLevel};
pub use error::{FusionError, Result, Sensor};
pub use hyperspectral::{HyperspectralCube, Metadata, WavelengthGrid};
