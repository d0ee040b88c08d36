//! Scenario tests for the fusion pipeline.
//!
//! These tests drive whole cubes through the stages and check band ordering,
//! the blend invariants and the quantized output.


use ndarray::Array3;

use crate::hyperspectral::HyperspectralCube;

/// Smooth synthetic reflectance: a per-pixel offset plus a gentle slope in
/// wavelength, kept inside (0, 1).
pub(super) fn synthetic_cube(rows: usize, cols: usize, wavelengths: &[f64], gain: f32) -> HyperspectralCube {
    let data = Array3::from_shape_fn((rows, cols, wavelengths.len()), |(r, c, b)| {
        let pixel = (r * cols + c) as f32 / (rows * cols) as f32;
        let slope = (wavelengths[b] as f32 - 400.0) / 4000.0;
        (0.1 + 0.3 * pixel + slope) * gain
    });
    HyperspectralCube::new(data, wavelengths).expect("synthetic cube")
}

/// Cube whose every value is `value`.
pub(super) fn flat_cube(rows: usize, cols: usize, wavelengths: &[f64], value: f32) -> HyperspectralCube {
    HyperspectralCube::new(Array3::from_elem((rows, cols, wavelengths.len()), value), wavelengths)
        .expect("flat cube")
}
