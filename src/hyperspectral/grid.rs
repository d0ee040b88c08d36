//! Per-band wavelength grids.

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result, Sensor};

/// Ordered band centre wavelengths in nanometers, one per band.
///
/// Construction does not check ordering; [`WavelengthGrid::validate`] is the
/// guard every fusion entry point runs before touching the grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WavelengthGrid {
    values: Vec<f64>,
}

impl WavelengthGrid {
    /// Wrap a list of wavelengths.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Wavelengths as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest wavelength (first band of an ascending grid).
    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Largest wavelength (last band of an ascending grid).
    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Grid restricted to the given band indices, in the order given.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self::new(indices.iter().map(|&i| self.values[i]).collect())
    }

    /// Contiguous sub-range of the grid.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Self {
        Self::new(self.values[range].to_vec())
    }

    /// Check that the grid is non-empty, finite and strictly increasing.
    pub fn validate(&self, sensor: Sensor) -> Result<()> {
        if self.values.is_empty() {
            return Err(FusionError::EmptyGrid { sensor });
        }
        if let Some(index) = self.values.iter().position(|w| !w.is_finite()) {
            return Err(FusionError::NonFiniteWavelength { sensor, index });
        }
        for (index, pair) in self.values.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(FusionError::NonAscendingGrid {
                    sensor,
                    index: index + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }
        Ok(())
    }

    /// Whether the grid is strictly increasing (empty and single-band grids are).
    pub fn is_strictly_increasing(&self) -> bool {
        self.values.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Spacing-based full width at half maximum estimate for each band.
    ///
    /// Interior bands use the mean distance to both neighbours, edge bands the
    /// distance to their single neighbour. A single-band grid has no spacing
    /// and reports `None`.
    pub fn estimated_fwhm(&self) -> Option<Vec<f64>> {
        let n = self.values.len();
        if n < 2 {
            return None;
        }
        let w = &self.values;
        Some(
            (0..n)
                .map(|i| match i {
                    0 => w[1] - w[0],
                    i if i == n - 1 => w[n - 1] - w[n - 2],
                    i => (w[i + 1] - w[i - 1]) / 2.0,
                })
                .collect(),
        )
    }
}

impl From<Vec<f64>> for WavelengthGrid {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<&[f64]> for WavelengthGrid {
    fn from(values: &[f64]) -> Self {
        Self::new(values.to_vec())
    }
}
