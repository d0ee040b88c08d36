//! Spectral overlap analysis between the low and high wavelength grids.

use std::ops::Range;

use crate::error::{FusionError, Result, Sensor};
use crate::hyperspectral::WavelengthGrid;

/// Band-index view of the wavelength span covered by both sensors.
///
/// Both index lists are ascending. The low list holds every low band at or
/// above the high grid's minimum; the high list every high band at or below
/// the low grid's maximum. Their lengths generally differ.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRegion {
    /// Low-sensor bands inside the overlap
    pub low_indices: Vec<usize>,
    /// High-sensor bands inside the overlap
    pub high_indices: Vec<usize>,
    /// Band count of the low sensor
    pub low_band_count: usize,
    /// Band count of the high sensor
    pub high_band_count: usize,
    /// Largest low-sensor wavelength
    pub low_max: f64,
    /// Smallest high-sensor wavelength
    pub high_min: f64,
}

impl OverlapRegion {
    /// Whether the two grids share no wavelengths.
    pub fn is_empty(&self) -> bool {
        self.low_indices.is_empty() && self.high_indices.is_empty()
    }

    /// Band count of the blended segment (the low-sensor overlap count).
    pub fn blended_band_count(&self) -> usize {
        self.low_indices.len()
    }

    /// `|low overlap| + |high overlap|`, a bound for the combined index array.
    pub fn n_overlap_bound(&self) -> usize {
        self.low_indices.len() + self.high_indices.len()
    }

    /// Overlap positions within the concatenated `[low..., high...]` grid.
    ///
    /// High-sensor indices are offset by the low band count. Values are not
    /// deduplicated by wavelength.
    pub fn combined_indices(&self) -> Vec<usize> {
        self.low_indices
            .iter()
            .copied()
            .chain(self.high_indices.iter().map(|i| i + self.low_band_count))
            .collect()
    }

    /// Low bands strictly below the high grid's minimum.
    pub fn pre_overlap_range(&self) -> Range<usize> {
        0..self.low_indices.first().copied().unwrap_or(self.low_band_count)
    }

    /// First high band whose wavelength is strictly above the low maximum.
    ///
    /// Equals the high band count when the high sensor's last band is itself
    /// inside the overlap.
    pub fn first_high_after_overlap(&self) -> usize {
        self.high_indices.last().map_or(0, |&last| last + 1)
    }

    /// Check that the overlap is a trailing run of the low grid and a leading
    /// run of the high grid, which straight concatenation relies on.
    pub fn ensure_contiguous(&self) -> Result<()> {
        let low_start = self.low_band_count - self.low_indices.len();
        if !self
            .low_indices
            .iter()
            .copied()
            .eq(low_start..self.low_band_count)
        {
            return Err(FusionError::NonContiguousOverlap { sensor: Sensor::Low });
        }
        if !self
            .high_indices
            .iter()
            .copied()
            .eq(0..self.high_indices.len())
        {
            return Err(FusionError::NonContiguousOverlap {
                sensor: Sensor::High,
            });
        }
        Ok(())
    }
}

/// Locate the overlap between two validated grids.
///
/// Both grids must pass [`WavelengthGrid::validate`] first; use
/// [`analyze_overlap`] to run the guard and the analysis together.
pub fn find_overlap(low: &WavelengthGrid, high: &WavelengthGrid) -> Result<OverlapRegion> {
    let low_max = low
        .max()
        .ok_or(FusionError::EmptyGrid { sensor: Sensor::Low })?;
    let high_min = high.min().ok_or(FusionError::EmptyGrid {
        sensor: Sensor::High,
    })?;

    let low_indices: Vec<usize> = low
        .as_slice()
        .iter()
        .enumerate()
        .filter(|(_, w)| **w >= high_min)
        .map(|(i, _)| i)
        .collect();
    let high_indices: Vec<usize> = high
        .as_slice()
        .iter()
        .enumerate()
        .filter(|(_, w)| **w <= low_max)
        .map(|(i, _)| i)
        .collect();

    let region = OverlapRegion {
        low_indices,
        high_indices,
        low_band_count: low.len(),
        high_band_count: high.len(),
        low_max,
        high_min,
    };

    if region.is_empty() {
        log::info!(
            "No spectral overlap: low ends at {} nm, high starts at {} nm",
            low_max,
            high_min
        );
    } else {
        log::info!(
            "Spectral overlap {}-{} nm: {} low bands, {} high bands",
            high_min,
            low_max,
            region.low_indices.len(),
            region.high_indices.len()
        );
        log::debug!(
            "Overlap indices low={:?} high={:?} combined={:?} (at most {})",
            region.low_indices,
            region.high_indices,
            region.combined_indices(),
            region.n_overlap_bound()
        );
    }

    Ok(region)
}

/// Validate both grids, then locate and contiguity-check their overlap.
pub fn analyze_overlap(low: &WavelengthGrid, high: &WavelengthGrid) -> Result<OverlapRegion> {
    low.validate(Sensor::Low)?;
    high.validate(Sensor::High)?;
    let region = find_overlap(low, high)?;
    region.ensure_contiguous()?;
    Ok(region)
}
