//! Nearest-neighbour spectral resampling.

use ndarray::ArrayView3;

use super::{
    Resampled, ResamplingMatrix, SpectralResamplingStrategy, check_source_bands,
    extrapolation_edge, resample_with_matrix, within_span,
};
use crate::config::ExtrapolationPolicy;
use crate::error::Result;
use crate::hyperspectral::WavelengthGrid;

/// Each target band copies the closest source band (ties go to the shorter
/// wavelength).
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestResampler {
    extrapolation: ExtrapolationPolicy,
}

impl NearestResampler {
    pub fn new(extrapolation: ExtrapolationPolicy) -> Self {
        Self { extrapolation }
    }

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
            matrix.set(i, nearest_index(src, t), 1.0);
        }

        matrix
    }
}

/// Index of the source wavelength closest to `t`.
pub(super) fn nearest_index(src: &[f64], t: f64) -> usize {
    let upper = src.partition_point(|&s| s < t);
    if upper == 0 {
        return 0;
    }
    if upper == src.len() {
        return src.len() - 1;
    }
    if t - src[upper - 1] <= src[upper] - t {
        upper - 1
    } else {
        upper
    }
}

impl SpectralResamplingStrategy for NearestResampler {
    fn id(&self) -> &'static str {
        "nearest"
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
    fn test_nearest_index() {
        let src = [950.0, 970.0, 990.0];
        assert_eq!(nearest_index(&src, 950.0), 0);
        assert_eq!(nearest_index(&src, 959.0), 0);
        assert_eq!(nearest_index(&src, 960.0), 0); // tie
        assert_eq!(nearest_index(&src, 961.0), 1);
        assert_eq!(nearest_index(&src, 990.0), 2);
    }

    #[test]
    fn test_matrix_is_one_hot() {
        let matrix = NearestResampler::default().matrix(
            &WavelengthGrid::from(vec![950.0, 970.0, 990.0]),
            &WavelengthGrid::from(vec![965.0, 985.0, 995.0]),
        );
        assert_eq!(matrix.weights()[[0, 1]], 1.0);
        assert_eq!(matrix.weights()[[1, 2]], 1.0);
        assert_eq!(matrix.weights().row(2).sum(), 0.0);
        assert_eq!(matrix.extrapolated(), &[2]);
    }
}
