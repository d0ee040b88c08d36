//! Fixed-point quantization of reflectance for storage.
//!
//! `stored = trunc(reflectance * scale_factor)` as `u16`. Truncation toward
//! zero is kept for bit-compatibility with earlier outputs. Values that land
//! outside `0..=65535` wrap modulo 2^16 by default; [`OverflowPolicy::Clamp`]
//! saturates them and [`OverflowPolicy::Error`] refuses to quantize. Every
//! policy counts the out-of-range values.

use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::config::OverflowPolicy;
use crate::constants::{QUANTIZED_DTYPE, QUANTIZED_MAX, QUANTIZED_MODULUS, metadata_keys};
use crate::error::{FusionError, Result};
use crate::hyperspectral::{Metadata, WavelengthGrid};

/// Quantize one reflectance value, returning the stored value and whether
/// it fell outside the `u16` range.
///
/// NaN truncates to 0, like a float-to-integer cast.
pub fn quantize_value(value: f32, scale_factor: f64, policy: OverflowPolicy) -> (u16, bool) {
    let scaled = (f64::from(value) * scale_factor).trunc();
    if scaled.is_nan() {
        return (0, false);
    }
    if (0.0..=f64::from(QUANTIZED_MAX)).contains(&scaled) {
        return (scaled as u16, false);
    }
    let stored = match policy {
        OverflowPolicy::Clamp => scaled.clamp(0.0, f64::from(QUANTIZED_MAX)) as u16,
        OverflowPolicy::Wrap | OverflowPolicy::Error => {
            (scaled as i64).rem_euclid(QUANTIZED_MODULUS) as u16
        }
    };
    (stored, true)
}

/// Recover approximate reflectance from a stored value.
pub fn dequantize_value(stored: u16, scale_factor: f64) -> f32 {
    (f64::from(stored) / scale_factor) as f32
}

/// Header fields handed to the external writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Final wavelength array
    pub wavelength: Vec<f64>,
    /// Band count
    pub bands: usize,
    /// Row count
    pub lines: usize,
    /// Column count
    pub samples: usize,
    /// Storage type tag
    pub dtype: String,
    /// Multiplier used to quantize reflectance
    pub scale_factor: f64,
}

impl OutputMetadata {
    /// Merge these fields over `base` (typically the low cube's header).
    pub fn to_header(&self, base: &Metadata) -> Metadata {
        let mut header = base.clone();
        header.insert(
            metadata_keys::WAVELENGTH.to_string(),
            serde_json::json!(self.wavelength),
        );
        header.insert(metadata_keys::BANDS.to_string(), self.bands.into());
        header.insert(metadata_keys::LINES.to_string(), self.lines.into());
        header.insert(metadata_keys::SAMPLES.to_string(), self.samples.into());
        header.insert(metadata_keys::DTYPE.to_string(), self.dtype.clone().into());
        header.insert(
            metadata_keys::SCALE_FACTOR.to_string(),
            serde_json::json!(self.scale_factor),
        );
        header
    }
}

/// Quantized cube ready for the writer.
#[derive(Debug, Clone)]
pub struct QuantizedCube {
    /// Stored values, shape (rows, cols, bands)
    pub data: Array3<u16>,
    /// Header fields for the writer
    pub metadata: OutputMetadata,
    /// Header carried over from the low cube, with `metadata` merged in
    pub header: Metadata,
    /// Values that did not fit and were wrapped or clamped
    pub overflow_count: usize,
}

/// Scales and truncates reflectance into `u16`.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer {
    scale_factor: f64,
    policy: OverflowPolicy,
}

impl Quantizer {
    pub fn new(scale_factor: f64, policy: OverflowPolicy) -> Self {
        Self {
            scale_factor,
            policy,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Quantize a data array, returning the stored values and overflow count.
    pub fn quantize_array(&self, values: ArrayView3<'_, f32>) -> Result<(Array3<u16>, usize)> {
        let mut overflow_count = 0usize;
        let stored = values.mapv(|v| {
            let (q, overflowed) = quantize_value(v, self.scale_factor, self.policy);
            overflow_count += usize::from(overflowed);
            q
        });

        if overflow_count > 0 {
            match self.policy {
                OverflowPolicy::Error => {
                    return Err(FusionError::QuantizationOverflow {
                        count: overflow_count,
                        scale_factor: self.scale_factor,
                    });
                }
                OverflowPolicy::Wrap => log::warn!(
                    "{} values exceeded the uint16 range at scale factor {} and wrapped",
                    overflow_count,
                    self.scale_factor
                ),
                OverflowPolicy::Clamp => log::warn!(
                    "{} values exceeded the uint16 range at scale factor {} and were clamped",
                    overflow_count,
                    self.scale_factor
                ),
            }
        }

        Ok((stored, overflow_count))
    }

    /// Quantize a fused cube and prepare the writer's metadata.
    pub fn quantize(
        &self,
        values: ArrayView3<'_, f32>,
        wavelengths: &WavelengthGrid,
        base_header: &Metadata,
    ) -> Result<QuantizedCube> {
        let (rows, cols, bands) = values.dim();
        if bands != wavelengths.len() {
            return Err(FusionError::internal(format!(
                "quantizing {} bands against {} wavelengths",
                bands,
                wavelengths.len()
            )));
        }
        log::info!(
            "Quantizing {}x{}x{} cube to {} with scale factor {}",
            rows,
            cols,
            bands,
            QUANTIZED_DTYPE,
            self.scale_factor
        );

        let (data, overflow_count) = self.quantize_array(values)?;
        let metadata = OutputMetadata {
            wavelength: wavelengths.as_slice().to_vec(),
            bands,
            lines: rows,
            samples: cols,
            dtype: QUANTIZED_DTYPE.to_string(),
            scale_factor: self.scale_factor,
        };
        let header = metadata.to_header(base_header);

        Ok(QuantizedCube {
            data,
            metadata,
            header,
            overflow_count,
        })
    }
}

/// Recover approximate reflectance from a quantized array.
pub fn dequantize(stored: ArrayView3<'_, u16>, scale_factor: f64) -> Array3<f32> {
    stored.mapv(|v| dequantize_value(v, scale_factor))
}
