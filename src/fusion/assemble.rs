//! Reassembly of the fused cube from its three spectral segments.
//!
//! ```text
//!  low:  [ pre-overlap ............ | overlap ]
//!  high:                 [ overlap | post-overlap ........ ]
//!  out:  [ pre-overlap ............ | blended | post-overlap ........ ]
//! ```
//!
//! The blended segment sits on the low sensor's overlap wavelengths. Bands are
//! concatenated in that order, which is only correct when both grids are
//! ascending and the overlap is a single run at the facing edges; the overlap
//! analysis enforces that. The final argsort check is the one authority on
//! band ordering: any disagreement between data and wavelengths is an
//! internal consistency error rather than silently mislabelled output.

use std::ops::Range;

use ndarray::{Array3, ArrayView3, Axis, concatenate};

use crate::config::PostOverlapBoundary;
use crate::error::{FusionError, Result};
use crate::fusion::overlap::OverlapRegion;
use crate::hyperspectral::{HyperspectralCube, Metadata, WavelengthGrid};

/// Band counts of the three assembled segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLayout {
    /// Low-sensor bands below the overlap
    pub pre: usize,
    /// Blended overlap bands
    pub overlap: usize,
    /// High-sensor bands above the overlap
    pub post: usize,
}

impl SegmentLayout {
    pub fn total(&self) -> usize {
        self.pre + self.overlap + self.post
    }
}

/// Fused reflectance cube with its derived wavelength grid.
#[derive(Debug, Clone)]
pub struct FusedCube {
    cube: HyperspectralCube,
    layout: SegmentLayout,
}

impl FusedCube {
    pub fn cube(&self) -> &HyperspectralCube {
        &self.cube
    }

    pub fn layout(&self) -> SegmentLayout {
        self.layout
    }

    pub fn bands(&self) -> usize {
        self.cube.bands()
    }

    pub fn wavelengths(&self) -> &WavelengthGrid {
        self.cube.wavelengths()
    }

    pub fn into_cube(self) -> HyperspectralCube {
        self.cube
    }
}

/// High-sensor bands kept after the overlap.
///
/// Starts at the first index where `high[i] > max(low)`. Under
/// [`PostOverlapBoundary::ExcludeLastBand`] the high sensor's final band is
/// dropped as well; the range is empty when nothing remains.
pub fn post_overlap_range(region: &OverlapRegion, boundary: PostOverlapBoundary) -> Range<usize> {
    let start = region.first_high_after_overlap();
    let end = match boundary {
        PostOverlapBoundary::ThroughLastBand => region.high_band_count,
        PostOverlapBoundary::ExcludeLastBand => region.high_band_count.saturating_sub(1),
    };
    start..end.max(start)
}

/// Low-sensor band range covered by the overlap.
pub fn low_overlap_range(region: &OverlapRegion) -> Range<usize> {
    region.pre_overlap_range().end..region.low_band_count
}

/// High-sensor band range covered by the overlap.
pub fn high_overlap_range(region: &OverlapRegion) -> Range<usize> {
    0..region.first_high_after_overlap()
}

/// Wavelength array matching [`assemble`]'s band order.
pub fn assemble_wavelengths(
    low: &WavelengthGrid,
    high: &WavelengthGrid,
    region: &OverlapRegion,
    boundary: PostOverlapBoundary,
) -> WavelengthGrid {
    let low = low.as_slice();
    let high = high.as_slice();
    WavelengthGrid::new(
        low[region.pre_overlap_range()]
            .iter()
            .chain(&low[low_overlap_range(region)])
            .chain(&high[post_overlap_range(region, boundary)])
            .copied()
            .collect(),
    )
}

/// Concatenate the pre-overlap, blended and post-overlap segments.
///
/// `blended` must hold one band per low-sensor overlap band. The output's
/// metadata is copied from the low cube.
pub fn assemble(
    low: &HyperspectralCube,
    blended: ArrayView3<'_, f32>,
    high: &HyperspectralCube,
    region: &OverlapRegion,
    boundary: PostOverlapBoundary,
) -> Result<FusedCube> {
    if blended.dim().2 != region.blended_band_count() {
        return Err(FusionError::internal(format!(
            "blended segment has {} bands, overlap expects {}",
            blended.dim().2,
            region.blended_band_count()
        )));
    }

    let pre_range = region.pre_overlap_range();
    let post_range = post_overlap_range(region, boundary);
    let layout = SegmentLayout {
        pre: pre_range.len(),
        overlap: blended.dim().2,
        post: post_range.len(),
    };
    log::info!(
        "Assembling {} pre-overlap + {} blended + {} post-overlap bands",
        layout.pre,
        layout.overlap,
        layout.post
    );

    let data = {
        let pre = low.band_range(pre_range);
        let post = high.band_range(post_range);
        concatenate(Axis(2), &[pre, blended, post])?
    };

    let wavelengths = assemble_wavelengths(low.wavelengths(), high.wavelengths(), region, boundary);
    verify_ordering(&data, &wavelengths)?;

    let metadata: Metadata = low.metadata().clone();
    let cube = HyperspectralCube::new(data, wavelengths)?.with_metadata(metadata);
    if cube.bands() != layout.total() {
        return Err(FusionError::internal(format!(
            "assembled {} bands but segments sum to {}",
            cube.bands(),
            layout.total()
        )));
    }

    Ok(FusedCube { cube, layout })
}

/// Stable argsort of a wavelength list.
pub fn sort_permutation(wavelengths: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..wavelengths.len()).collect();
    order.sort_by(|&a, &b| wavelengths[a].total_cmp(&wavelengths[b]));
    order
}

/// Reorder bands and wavelengths together by `permutation`.
pub fn apply_band_permutation(
    data: ArrayView3<'_, f32>,
    wavelengths: &WavelengthGrid,
    permutation: &[usize],
) -> Result<(Array3<f32>, WavelengthGrid)> {
    if data.dim().2 != wavelengths.len() || permutation.len() != wavelengths.len() {
        return Err(FusionError::internal(format!(
            "permutation of length {} cannot reorder {} bands with {} wavelengths",
            permutation.len(),
            data.dim().2,
            wavelengths.len()
        )));
    }
    Ok((data.select(Axis(2), permutation), wavelengths.select(permutation)))
}

/// Bands and wavelengths agree in count and the wavelengths are already sorted.
pub fn verify_ordering(data: &Array3<f32>, wavelengths: &WavelengthGrid) -> Result<()> {
    let bands = data.dim().2;
    if bands != wavelengths.len() {
        return Err(FusionError::internal(format!(
            "cube has {} bands but wavelength array has {} entries",
            bands,
            wavelengths.len()
        )));
    }
    let permutation = sort_permutation(wavelengths.as_slice());
    if let Some(position) = permutation.iter().enumerate().position(|(i, &p)| i != p) {
        return Err(FusionError::internal(format!(
            "assembled bands are out of wavelength order from position {}",
            position
        )));
    }
    if !wavelengths.is_strictly_increasing() {
        return Err(FusionError::internal(
            "assembled wavelength array repeats a wavelength",
        ));
    }
    Ok(())
}
