//! Spectral resampling of overlap bands onto a target wavelength grid.
//!
//! Every built-in strategy reduces to a linear operator of shape
//! (target bands × source bands) applied to each pixel's spectrum. The
//! [`SpectralResamplingStrategy`] trait is the seam: the blender and the
//! assembler only ever see its output, so a new interpolation scheme plugs in
//! without touching them.
//!
//! ## Out-of-range targets
//!
//! A target wavelength outside the source grid's span is handled by the
//! configured [`ExtrapolationPolicy`]. The default, [`ExtrapolationPolicy::Zero`],
//! leaves that operator row empty so the target band resamples to zero. This
//! loses precision at the overlap's upper edge and is reported through
//! [`Resampled::extrapolated`] and a `log::warn!`.

mod gaussian;
mod linear;
mod matrix;
mod nearest;

pub use gaussian::GaussianResampler;
pub use linear::LinearResampler;
pub use matrix::ResamplingMatrix;
pub use nearest::NearestResampler;

use ndarray::{Array3, ArrayView3};

use crate::config::{ExtrapolationPolicy, ResamplingMethod};
use crate::error::{FusionError, Result};
use crate::hyperspectral::WavelengthGrid;

/// Output of a resampling pass.
#[derive(Debug, Clone)]
pub struct Resampled {
    /// Values on the target grid, shape (rows, cols, target bands)
    pub values: Array3<f32>,
    /// Target wavelengths that fell outside the source span
    pub extrapolated: Vec<f64>,
}

/// Capability for re-expressing spectra sampled on one grid onto another.
pub trait SpectralResamplingStrategy: Send + Sync {
    /// Unique identifier for this strategy (e.g., "linear").
    fn id(&self) -> &'static str;

    /// Resample `values` (rows, cols, source bands) from `source` onto `target`.
    fn resample(
        &self,
        source: &WavelengthGrid,
        values: ArrayView3<'_, f32>,
        target: &WavelengthGrid,
    ) -> Result<Resampled>;
}

/// Construct the built-in strategy for a configured method.
pub fn strategy_for(
    method: ResamplingMethod,
    extrapolation: ExtrapolationPolicy,
) -> Box<dyn SpectralResamplingStrategy> {
    match method {
        ResamplingMethod::Linear => Box::new(LinearResampler::new(extrapolation)),
        ResamplingMethod::Nearest => Box::new(NearestResampler::new(extrapolation)),
        ResamplingMethod::Gaussian => Box::new(GaussianResampler::new(extrapolation)),
    }
}

/// Shared driver for matrix-based strategies.
pub(crate) fn resample_with_matrix(
    strategy_id: &str,
    matrix: &ResamplingMatrix,
    values: ArrayView3<'_, f32>,
    target: &WavelengthGrid,
) -> Result<Resampled> {
    let extrapolated: Vec<f64> = matrix
        .extrapolated()
        .iter()
        .map(|&i| target.as_slice()[i])
        .collect();
    if !extrapolated.is_empty() {
        log::warn!(
            "{} resampler: {} target wavelength(s) outside the source span {:?}",
            strategy_id,
            extrapolated.len(),
            extrapolated
        );
    }

    let values = matrix.apply(values)?;
    log::debug!(
        "{} resampler produced cube of shape {:?}",
        strategy_id,
        values.dim()
    );

    Ok(Resampled {
        values,
        extrapolated,
    })
}

/// Edge band a clamped target falls back to, if the policy allows one.
pub(crate) fn extrapolation_edge(
    policy: ExtrapolationPolicy,
    target: f64,
    source: &[f64],
) -> Option<usize> {
    match policy {
        ExtrapolationPolicy::Zero => None,
        ExtrapolationPolicy::NearestClamp => {
            if source.is_empty() {
                None
            } else if target < source[0] {
                Some(0)
            } else {
                Some(source.len() - 1)
            }
        }
    }
}

/// Whether `target` lies inside the closed span of `source`.
pub(crate) fn within_span(target: f64, source: &[f64]) -> bool {
    match (source.first(), source.last()) {
        (Some(&lo), Some(&hi)) => target >= lo && target <= hi,
        _ => false,
    }
}

/// Source values must have one band per source wavelength.
pub(crate) fn check_source_bands(source: &WavelengthGrid, values: &ArrayView3<'_, f32>) -> Result<()> {
    let bands = values.dim().2;
    if bands != source.len() {
        return Err(FusionError::BandCountMismatch {
            bands,
            wavelengths: source.len(),
        });
    }
    Ok(())
}
