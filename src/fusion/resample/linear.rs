//! Piecewise-linear spectral resampling.

use ndarray::ArrayView3;

use super::{
    Resampled, ResamplingMatrix, SpectralResamplingStrategy, check_source_bands,
    extrapolation_edge, resample_with_matrix, within_span,
};
use crate::config::ExtrapolationPolicy;
use crate::error::Result;
use crate::hyperspectral::WavelengthGrid;

/// Each target band is the linear interpolation of its two bracketing
/// source bands.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearResampler {
    extrapolation: ExtrapolationPolicy,
}

impl LinearResampler {
    pub fn new(extrapolation: ExtrapolationPolicy) -> Self {
        Self { extrapolation }
    }

    /// Build the (target × source) interpolation operator.
    pub fn matrix(&self, source: &WavelengthGrid, target: &WavelengthGrid) -> ResamplingMatrix {
        let src = source.as_slice();
        let mut matrix = ResamplingMatrix::zeros(target.len(), src.len());

        for (i, &t) in target.as_slice().iter().enumerate() {
            if !within_span(t, src) {
                matrix.mark_extrapolated(i);
                if let Some(edge) = extrapolation_edge(self.extrapolation, t, src) {
                    matrix.set(i, edge, 1.0);
                }
                continue;
            }

            // Last source band at or below t; exists because t >= src[0].
            let lower = src.partition_point(|&s| s <= t) - 1;
            if lower == src.len() - 1 {
                matrix.set(i, lower, 1.0);
                continue;
            }
            let fraction = (t - src[lower]) / (src[lower + 1] - src[lower]);
            matrix.set(i, lower, 1.0 - fraction);
            matrix.set(i, lower + 1, fraction);
        }

        matrix
    }
}

impl SpectralResamplingStrategy for LinearResampler {
    fn id(&self) -> &'static str {
        "linear"
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
    use ndarray::Array3;

    use super::*;

    fn grid(values: &[f64]) -> WavelengthGrid {
        WavelengthGrid::from(values)
    }

    #[test]
    fn test_interior_weights() {
        let matrix = LinearResampler::default().matrix(
            &grid(&[950.0, 970.0, 990.0]),
            &grid(&[955.0, 970.0, 985.0]),
        );
        let w = matrix.weights();
        assert!((w[[0, 0]] - 0.75).abs() < 1e-12);
        assert!((w[[0, 1]] - 0.25).abs() < 1e-12);
        assert!((w[[1, 1]] - 1.0).abs() < 1e-12);
        assert!((w[[2, 1]] - 0.25).abs() < 1e-12);
        assert!((w[[2, 2]] - 0.75).abs() < 1e-12);
        assert!(matrix.extrapolated().is_empty());
    }

    #[test]
    fn test_rows_sum_to_one_inside_span() {
        let matrix = LinearResampler::default().matrix(
            &grid(&[950.0, 963.0, 971.0, 990.0]),
            &grid(&[950.0, 960.0, 970.0, 980.0, 990.0]),
        );
        for row in matrix.weights().rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_policy_above_span() {
        let matrix =
            LinearResampler::default().matrix(&grid(&[950.0, 970.0]), &grid(&[960.0, 980.0]));
        assert_eq!(matrix.extrapolated(), &[1]);
        assert_eq!(matrix.weights().row(1).sum(), 0.0);
        assert!((matrix.weights()[[0, 0]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_policy_above_span() {
        let matrix = LinearResampler::new(ExtrapolationPolicy::NearestClamp)
            .matrix(&grid(&[950.0, 970.0]), &grid(&[960.0, 980.0]));
        assert_eq!(matrix.extrapolated(), &[1]);
        assert_eq!(matrix.weights()[[1, 1]], 1.0);
    }

    #[test]
    fn test_single_source_band() {
        let matrix = LinearResampler::default().matrix(&grid(&[950.0]), &grid(&[950.0, 960.0]));
        assert_eq!(matrix.weights()[[0, 0]], 1.0);
        assert_eq!(matrix.extrapolated(), &[1]);
    }

    #[test]
    fn test_resample_linear_spectrum_exactly() {
        let source = grid(&[950.0, 970.0, 990.0]);
        let target = grid(&[955.0, 965.0, 980.0]);
        let values = Array3::from_shape_fn((2, 2, 3), |(r, c, b)| {
            (r + c) as f32 * 0.1 + source.as_slice()[b] as f32 * 0.001
        });

        let out = LinearResampler::default()
            .resample(&source, values.view(), &target)
            .unwrap();

        assert_eq!(out.values.dim(), (2, 2, 3));
        assert!(out.extrapolated.is_empty());
        for ((r, c, b), v) in out.values.indexed_iter() {
            let expected = (r + c) as f32 * 0.1 + target.as_slice()[b] as f32 * 0.001;
            assert!((v - expected).abs() < 1e-5);
        }
    }
}
