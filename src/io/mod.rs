//! Raster storage seam.
//!
//! Fusion itself never touches files. Cubes come in through a [`CubeReader`]
//! and go out through a [`CubeWriter`], so other raster formats (ENVI, HDF5)
//! can be added by implementing these traits.
//!
//! The built-in [`NpyCubeStore`] keeps a cube as a NumPy `.npy` body with
//! shape (rows, cols, bands) plus a `.json` header holding the metadata map.

mod npy_store;

pub use npy_store::NpyCubeStore;

use std::path::{Path, PathBuf};

use crate::constants::metadata_keys;
use crate::error::{FusionError, Result};
use crate::fusion::QuantizedCube;
use crate::hyperspectral::{HyperspectralCube, Metadata, WavelengthGrid};

/// Loads a cube together with its per-band wavelengths.
pub trait CubeReader {
    /// Unique identifier for this reader (e.g., "npy").
    fn id(&self) -> &'static str;

    /// Files `read` opens for the cube at `path`.
    fn files(&self, path: &Path) -> Vec<PathBuf>;

    /// Load the cube stored at `path`.
    fn read(&self, path: &Path) -> Result<HyperspectralCube>;
}

/// Persists a quantized cube and its header.
pub trait CubeWriter {
    /// Unique identifier for this writer (e.g., "npy").
    fn id(&self) -> &'static str;

    /// Files `write` creates or replaces for the cube at `path`.
    fn files(&self, path: &Path) -> Vec<PathBuf>;

    /// Write `cube` at `path`, returning the files created.
    ///
    /// Implementations must not leave a partial file that looks like valid
    /// output when the write fails.
    fn write(&self, path: &Path, cube: &QuantizedCube) -> Result<Vec<PathBuf>>;
}

/// Parse the `wavelength` header field.
///
/// Accepts a list of numbers or of numeric strings (ENVI headers keep
/// wavelengths as text).
pub fn wavelengths_from_metadata(metadata: &Metadata) -> Result<WavelengthGrid> {
    let field = metadata_keys::WAVELENGTH;
    let values = metadata
        .get(field)
        .and_then(|v| v.as_array())
        .ok_or_else(|| FusionError::missing_metadata(field))?;

    values
        .iter()
        .map(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .collect::<Option<Vec<f64>>>()
        .map(WavelengthGrid::new)
        .ok_or_else(|| FusionError::missing_metadata(field))
}

/// Scale factor recorded in a header, if any.
pub fn scale_factor_from_metadata(metadata: &Metadata) -> Option<f64> {
    match metadata.get(metadata_keys::SCALE_FACTOR)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
