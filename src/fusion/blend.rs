//! Position-weighted blending of the two sensors inside the overlap.
//!
//! Both inputs live on the low sensor's overlap grid. Band `i` of `n` gets
//! weight `(i + 0.5) / n` on the high sensor, so the low sensor dominates near
//! the overlap's short-wavelength edge and the high sensor near its long edge.

use ndarray::{Array1, Array3, ArrayView3, Zip};

use crate::error::{FusionError, Result};

/// High-sensor weight for each of `n` overlap bands.
///
/// Strictly increasing, strictly inside (0, 1) and symmetric:
/// `w[i] + w[n - 1 - i] == 1`. Empty when `n == 0`.
pub fn blend_weights(n: usize) -> Array1<f64> {
    Array1::from_shape_fn(n, |i| (i as f64 + 0.5) / n as f64)
}

/// Convex combination `low * (1 - w) + high * w`, band by band.
///
/// Arithmetic runs in `f64` so every output value stays between its two
/// inputs after rounding back to `f32`.
pub fn blend(low: ArrayView3<'_, f32>, high: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
    if low.dim() != high.dim() {
        let (lr, lc, lb) = low.dim();
        let (hr, hc, hb) = high.dim();
        if (lr, lc) != (hr, hc) {
            return Err(FusionError::SpatialMismatch {
                low: (lr, lc),
                high: (hr, hc),
            });
        }
        return Err(FusionError::BandCountMismatch {
            bands: hb,
            wavelengths: lb,
        });
    }

    let weights = blend_weights(low.dim().2);
    log::debug!("Blend weights: {:?}", weights.as_slice());

    let weights = weights
        .broadcast(low.dim())
        .ok_or_else(|| FusionError::internal("blend weights do not broadcast over the cube"))?;

    let mut fused = Array3::<f32>::zeros(low.dim());
    Zip::from(fused.view_mut())
        .and(low)
        .and(high)
        .and(weights)
        .for_each(|out, &l, &h, &w| {
            *out = (f64::from(l) * (1.0 - w) + f64::from(h) * w) as f32;
        });

    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_properties() {
        for n in 1..12 {
            let w = blend_weights(n);
            assert_eq!(w.len(), n);
            assert!((w[0] - 0.5 / n as f64).abs() < 1e-12);
            assert!((w[n - 1] - (1.0 - 0.5 / n as f64)).abs() < 1e-12);
            for i in 0..n {
                assert!(w[i] > 0.0 && w[i] < 1.0);
                assert!((w[i] + w[n - 1 - i] - 1.0).abs() < 1e-12);
                if i > 0 {
                    assert!(w[i] > w[i - 1]);
                }
            }
        }
        assert!(blend_weights(0).is_empty());
    }

    #[test]
    fn test_two_band_weights() {
        let w = blend_weights(2);
        assert_eq!(w.to_vec(), vec![0.25, 0.75]);
    }

    #[test]
    fn test_blend_is_convex() {
        let low = Array3::from_shape_fn((3, 4, 5), |(r, c, b)| {
            ((r * 31 + c * 17 + b * 7) % 13) as f32 / 13.0
        });
        let high = Array3::from_shape_fn((3, 4, 5), |(r, c, b)| {
            ((r * 11 + c * 5 + b * 3) % 7) as f32 / 7.0 + 0.05
        });
        let fused = blend(low.view(), high.view()).unwrap();

        for ((idx, &f), (&l, &h)) in fused.indexed_iter().zip(low.iter().zip(high.iter())) {
            assert!(
                l.min(h) <= f && f <= l.max(h),
                "fused {} outside [{}, {}] at {:?}",
                f,
                l.min(h),
                l.max(h),
                idx
            );
        }
    }

    #[test]
    fn test_blend_values() {
        let low = Array3::from_elem((1, 1, 2), 0.2f32);
        let high = Array3::from_elem((1, 1, 2), 0.6f32);
        let fused = blend(low.view(), high.view()).unwrap();
        assert!((fused[[0, 0, 0]] - 0.3).abs() < 1e-6);
        assert!((fused[[0, 0, 1]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_blend_equal_inputs_unchanged() {
        let low = Array3::from_elem((2, 2, 3), 0.123_456_7f32);
        let fused = blend(low.view(), low.view()).unwrap();
        assert!(fused.iter().all(|&v| v == 0.123_456_7f32));
    }

    #[test]
    fn test_blend_shape_mismatch() {
        let low = Array3::<f32>::zeros((2, 2, 3));
        let high = Array3::<f32>::zeros((2, 2, 2));
        assert!(matches!(
            blend(low.view(), high.view()),
            Err(FusionError::BandCountMismatch { .. })
        ));
        let high = Array3::<f32>::zeros((2, 3, 3));
        assert!(matches!(
            blend(low.view(), high.view()),
            Err(FusionError::SpatialMismatch { .. })
        ));
    }

    #[test]
    fn test_blend_empty_overlap() {
        let low = Array3::<f32>::zeros((2, 2, 0));
        let fused = blend(low.view(), low.view()).unwrap();
        assert_eq!(fused.dim(), (2, 2, 0));
    }
}
