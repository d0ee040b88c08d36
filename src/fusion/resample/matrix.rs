//! Dense resampling operator.

use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, Array3, ArrayView3};

use crate::error::{FusionError, Result};

/// Linear operator of shape (target bands, source bands).
///
/// Row `i` holds the weights that build target band `i` from the source
/// bands. Rows listed in `extrapolated` belong to targets outside the source
/// span; they are all-zero under the zero-weight policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResamplingMatrix {
    weights: Array2<f64>,
    extrapolated: Vec<usize>,
}

impl ResamplingMatrix {
    /// Empty operator mapping `source` bands to `target` bands.
    pub fn zeros(target: usize, source: usize) -> Self {
        Self {
            weights: Array2::zeros((target, source)),
            extrapolated: Vec::new(),
        }
    }

    pub fn target_bands(&self) -> usize {
        self.weights.nrows()
    }

    pub fn source_bands(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Target rows that fell outside the source span.
    pub fn extrapolated(&self) -> &[usize] {
        &self.extrapolated
    }

    /// Set one weight.
    pub(crate) fn set(&mut self, target: usize, source: usize, weight: f64) {
        self.weights[[target, source]] = weight;
    }

    /// Record that `target` needed the extrapolation policy.
    pub(crate) fn mark_extrapolated(&mut self, target: usize) {
        self.extrapolated.push(target);
    }

    /// Apply the operator to every pixel spectrum of a (rows, cols, source) cube.
    ///
    /// The spatial axes are flattened into one pixel axis, multiplied against
    /// the transposed operator and reshaped back to (rows, cols, target).
    pub fn apply(&self, values: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        let (rows, cols, bands) = values.dim();
        if bands != self.source_bands() {
            return Err(FusionError::BandCountMismatch {
                bands,
                wavelengths: self.source_bands(),
            });
        }

        let pixels = values.to_shape((rows * cols, bands))?;
        let operator = self.weights.t().mapv(|w| w as f32);
        let mut flat = Array2::<f32>::zeros((rows * cols, self.target_bands()));
        general_mat_mul(1.0, &pixels, &operator, 0.0, &mut flat);

        Ok(flat.into_shape_with_order((rows, cols, self.target_bands()))?)
    }
}
