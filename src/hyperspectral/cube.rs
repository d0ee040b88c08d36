//! Hyperspectral cube held fully in memory.

use std::ops::Range;

use ndarray::{Array3, ArrayView3, s};

use crate::error::{FusionError, Result};
use crate::hyperspectral::WavelengthGrid;

/// Free-form key/value metadata carried alongside a cube (header fields).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Reflectance cube indexed by (row, column, band), paired 1:1 with its
/// wavelength grid.
#[derive(Debug, Clone)]
pub struct HyperspectralCube {
    data: Array3<f32>,
    wavelengths: WavelengthGrid,
    metadata: Metadata,
}

impl HyperspectralCube {
    /// Pair a data array with its wavelength grid.
    ///
    /// Fails with [`FusionError::BandCountMismatch`] when the band axis and
    /// the grid disagree in length.
    pub fn new(data: Array3<f32>, wavelengths: impl Into<WavelengthGrid>) -> Result<Self> {
        let wavelengths = wavelengths.into();
        let bands = data.dim().2;
        if bands != wavelengths.len() {
            return Err(FusionError::BandCountMismatch {
                bands,
                wavelengths: wavelengths.len(),
            });
        }
        Ok(Self {
            data,
            wavelengths,
            metadata: Metadata::new(),
        })
    }

    /// Attach header metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    /// Spatial extent as (rows, cols).
    pub fn spatial_dim(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn wavelengths(&self) -> &WavelengthGrid {
        &self.wavelengths
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Borrow a contiguous run of bands.
    pub fn band_range(&self, range: Range<usize>) -> ArrayView3<'_, f32> {
        self.data.slice(s![.., .., range])
    }
}
