//! Gaussian spectral-response resampling.
//!
//! Models each target band as a Gaussian response centred on its wavelength
//! with a full width at half maximum estimated from the target grid spacing.
//! The operator row for a target band is that response evaluated at the
//! source band centres (within a few standard deviations), normalised to sum
//! to one. Source bands that are far narrower than the target spacing are
//! averaged instead of just interpolated.

use ndarray::ArrayView3;

use super::nearest::nearest_index;
use super::{
    Resampled, ResamplingMatrix, SpectralResamplingStrategy, check_source_bands,
    extrapolation_edge, resample_with_matrix, within_span,
};
use crate::config::ExtrapolationPolicy;
use crate::constants::{FWHM_PER_SIGMA, GAUSSIAN_SUPPORT_SIGMAS};
use crate::error::Result;
use crate::hyperspectral::WavelengthGrid;

/// Band-response resampler with spacing-derived FWHM.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianResampler {
    extrapolation: ExtrapolationPolicy,
}

impl GaussianResampler {
    pub fn new(extrapolation: ExtrapolationPolicy) -> Self {
        Self { extrapolation }
    }

    pub fn matrix(&self, source: &WavelengthGrid, target: &WavelengthGrid) -> ResamplingMatrix {
        let src = source.as_slice();
        let mut matrix = ResamplingMatrix::zeros(target.len(), src.len());

        // A single-band target grid has no spacing of its own; borrow the
        // source spacing, and fall back to nearest-band copy if neither has one.
        let target_fwhm = target.estimated_fwhm().or_else(|| {
            source
                .estimated_fwhm()
                .map(|f| vec![f.iter().sum::<f64>() / f.len() as f64; target.len()])
        });

        for (i, &t) in target.as_slice().iter().enumerate() {
            if !within_span(t, src) {
                matrix.mark_extrapolated(i);
                if let Some(edge) = extrapolation_edge(self.extrapolation, t, src) {
                    matrix.set(i, edge, 1.0);
                }
                continue;
            }

            let Some(sigma) = target_fwhm.as_ref().map(|f| f[i] / FWHM_PER_SIGMA) else {
                matrix.set(i, nearest_index(src, t), 1.0);
                continue;
            };

            let support = GAUSSIAN_SUPPORT_SIGMAS * sigma;
            let responses: Vec<(usize, f64)> = src
                .iter()
                .enumerate()
                .filter(|(_, s)| (**s - t).abs() <= support)
                .map(|(j, &s)| (j, (-0.5 * ((s - t) / sigma).powi(2)).exp()))
                .collect();
            let total: f64 = responses.iter().map(|(_, r)| r).sum();

            if total <= f64::EPSILON {
                matrix.set(i, nearest_index(src, t), 1.0);
                continue;
            }
            for (j, response) in responses {
                matrix.set(i, j, response / total);
            }
        }

        matrix
    }
}

impl SpectralResamplingStrategy for GaussianResampler {
    fn id(&self) -> &'static str {
        "gaussian"
    }

    fn resample(
        &self,
        source: &WavelengthGrid,
        values: ArrayView3<'_, f32>,
        target: &WavelengthGrid,
    ) -> Result<Resampled> {
        check_source_bands(source, &values)?;
        let matrix = self.matrix(source, target);
        resample_with_matrix(self.id(), &matrix, values, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_neighbours_share_weight() {
        let matrix = GaussianResampler::default().matrix(
            &WavelengthGrid::from(vec![950.0, 970.0]),
            &WavelengthGrid::from(vec![960.0, 980.0]),
        );
        let w = matrix.weights();
        assert!((w[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((w[[0, 1]] - 0.5).abs() < 1e-12);
        assert_eq!(matrix.extrapolated(), &[1]);
    }

    #[test]
    fn test_rows_normalised() {
        let source: Vec<f64> = (0..40).map(|i| 950.0 + i as f64 * 2.5).collect();
        let target: Vec<f64> = (0..10).map(|i| 955.0 + i as f64 * 9.0).collect();
        let matrix = GaussianResampler::default()
            .matrix(&WavelengthGrid::from(source), &WavelengthGrid::from(target));
        assert!(matrix.extrapolated().is_empty());
        for row in matrix.weights().rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().filter(|w| **w > 0.0).count() > 1);
        }
    }

    #[test]
    fn test_single_band_grids_fall_back_to_nearest() {
        let matrix = GaussianResampler::default().matrix(
            &WavelengthGrid::from(vec![960.0]),
            &WavelengthGrid::from(vec![960.0]),
        );
        assert_eq!(matrix.weights()[[0, 0]], 1.0);
    }
}
