//! Spectral-overlap fusion of a low (VNIR) and a high (SWIR) cube.
//!
//! Stages, in data-flow order:
//!
//! 1. [`overlap`]: which bands of each sensor share wavelengths
//! 2. [`resample`]: high overlap bands re-expressed on the low overlap grid
//! 3. [`blend`]: position-weighted convex combination inside the overlap
//! 4. [`assemble`]: pre-overlap + blended + post-overlap concatenation
//! 5. [`quantize`]: fixed-point `u16` conversion plus writer metadata
//!
//! [`pipeline`] chains them and owns the intermediate buffers.

pub mod assemble;
pub mod blend;
pub mod overlap;
pub mod pipeline;
pub mod quantize;
pub mod resample;

#[cfg(test)]
mod tests;

pub use assemble::{FusedCube, SegmentLayout};
pub use blend::{blend, blend_weights};
pub use overlap::{OverlapRegion, analyze_overlap};
pub use pipeline::{FusionOutput, FusionReport, FusedReflectance, fuse, fuse_reflectance, run, run_with};
pub use quantize::{OutputMetadata, QuantizedCube, Quantizer, dequantize};
pub use resample::{Resampled, SpectralResamplingStrategy, strategy_for};
