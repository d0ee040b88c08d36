//! End-to-end fusion: validate, analyse, resample, blend, assemble, quantize.
//!
//! Every stage consumes its inputs and returns a fresh buffer. Input cubes
//! are taken by value and intermediates live in scoped blocks, so at each
//! stage boundary the only buffers alive are the ones the next stage needs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{FusionConfig, FusionOptions};
use crate::error::{FusionError, Result, Sensor};
use crate::fusion::assemble::{
    FusedCube, SegmentLayout, assemble, high_overlap_range, low_overlap_range,
};
use crate::fusion::blend::blend;
use crate::fusion::overlap::{OverlapRegion, analyze_overlap};
use crate::fusion::quantize::{QuantizedCube, Quantizer};
use crate::fusion::resample::strategy_for;
use crate::hyperspectral::HyperspectralCube;
use crate::io::{CubeReader, CubeWriter, NpyCubeStore};

/// Summary of one fusion run.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionReport {
    /// Low-sensor bands in the overlap
    pub low_overlap_bands: usize,
    /// High-sensor bands in the overlap
    pub high_overlap_bands: usize,
    /// Segment band counts of the fused cube
    pub layout: SegmentLayout,
    /// Target wavelengths the resampler had to extrapolate
    pub extrapolated_wavelengths: Vec<f64>,
    /// Values that did not fit in `u16`
    pub overflow_count: usize,
    /// Files written, empty when saving was disabled
    pub files_written: Vec<PathBuf>,
}

impl FusionReport {
    /// Band count of the fused cube.
    pub fn final_bands(&self) -> usize {
        self.layout.total()
    }
}

/// Reflectance-domain fusion result before quantization.
#[derive(Debug, Clone)]
pub struct FusedReflectance {
    /// The fused cube
    pub fused: FusedCube,
    /// Overlap analysis it was built from
    pub region: OverlapRegion,
    /// Target wavelengths the resampler had to extrapolate
    pub extrapolated_wavelengths: Vec<f64>,
}

/// Quantized fusion result.
#[derive(Debug, Clone)]
pub struct FusionOutput {
    /// Quantized cube with writer metadata
    pub quantized: QuantizedCube,
    /// Run summary
    pub report: FusionReport,
}

/// Fail fast on inputs fusion cannot handle.
pub fn validate_inputs(low: &HyperspectralCube, high: &HyperspectralCube) -> Result<()> {
    low.wavelengths().validate(Sensor::Low)?;
    high.wavelengths().validate(Sensor::High)?;
    if low.spatial_dim() != high.spatial_dim() {
        return Err(FusionError::SpatialMismatch {
            low: low.spatial_dim(),
            high: high.spatial_dim(),
        });
    }
    Ok(())
}

/// Fuse two co-registered cubes into one reflectance cube.
///
/// With no spectral overlap the resampling and blending stages are skipped
/// and the result is the low cube followed by the high cube.
pub fn fuse_reflectance(
    low: HyperspectralCube,
    high: HyperspectralCube,
    options: &FusionOptions,
) -> Result<FusedReflectance> {
    options.validate()?;
    validate_inputs(&low, &high)?;

    let started = Instant::now();
    let region = analyze_overlap(low.wavelengths(), high.wavelengths())?;
    log::info!("Overlap analysis done in {:?}", started.elapsed());

    let (blended, extrapolated_wavelengths) = if region.is_empty() {
        log::info!("Skipping resampling and blending: spectra do not overlap");
        let (rows, cols) = low.spatial_dim();
        (ndarray::Array3::<f32>::zeros((rows, cols, 0)), Vec::new())
    } else {
        let started = Instant::now();
        let low_range = low_overlap_range(&region);
        let high_range = high_overlap_range(&region);
        let low_grid = low.wavelengths().slice(low_range.clone());
        let high_grid = high.wavelengths().slice(high_range.clone());

        let strategy = strategy_for(options.resampling, options.extrapolation);
        log::info!(
            "Resampling {} high overlap bands onto {} low overlap wavelengths ({})",
            high_grid.len(),
            low_grid.len(),
            strategy.id()
        );
        let resampled = strategy.resample(&high_grid, high.band_range(high_range), &low_grid)?;
        log::info!("Resampling done in {:?}", started.elapsed());

        let started = Instant::now();
        let blended = blend(low.band_range(low_range), resampled.values.view())?;
        log::info!(
            "Blended {} overlap bands in {:?}",
            blended.dim().2,
            started.elapsed()
        );
        (blended, resampled.extrapolated)
    };

    let started = Instant::now();
    let fused = assemble(
        &low,
        blended.view(),
        &high,
        &region,
        options.post_overlap_boundary,
    )?;
    drop(blended);
    drop(high);
    drop(low);
    log::info!(
        "Assembled fused cube {:?} in {:?}",
        fused.cube().data().dim(),
        started.elapsed()
    );

    Ok(FusedReflectance {
        fused,
        region,
        extrapolated_wavelengths,
    })
}

/// Fuse two cubes and quantize the result for storage.
pub fn fuse(
    low: HyperspectralCube,
    high: HyperspectralCube,
    options: &FusionOptions,
) -> Result<FusionOutput> {
    let FusedReflectance {
        fused,
        region,
        extrapolated_wavelengths,
    } = fuse_reflectance(low, high, options)?;

    let layout = fused.layout();
    let quantized = {
        let cube = fused.into_cube();
        let started = Instant::now();
        let quantized = Quantizer::new(options.scale_factor, options.overflow).quantize(
            cube.data().view(),
            cube.wavelengths(),
            cube.metadata(),
        )?;
        log::info!("Quantization done in {:?}", started.elapsed());
        quantized
    };

    if quantized.metadata.bands != quantized.metadata.wavelength.len()
        || quantized.metadata.bands != layout.total()
    {
        return Err(FusionError::internal(format!(
            "quantized cube reports {} bands, {} wavelengths, layout of {}",
            quantized.metadata.bands,
            quantized.metadata.wavelength.len(),
            layout.total()
        )));
    }

    let report = FusionReport {
        low_overlap_bands: region.low_indices.len(),
        high_overlap_bands: region.high_indices.len(),
        layout,
        extrapolated_wavelengths,
        overflow_count: quantized.overflow_count,
        files_written: Vec::new(),
    };

    Ok(FusionOutput { quantized, report })
}

/// Absolute form of `path`, resolving its parent directory when it exists.
fn resolved(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Reject runs whose inputs share files or whose output would replace an input.
///
/// Compares the concrete files the store touches, since a store may map
/// several cube paths onto the same files.
fn ensure_distinct_files(
    config: &FusionConfig,
    reader: &dyn CubeReader,
    writer: &dyn CubeWriter,
) -> Result<()> {
    let resolve_all = |files: Vec<PathBuf>| files.iter().map(|f| resolved(f)).collect::<Vec<_>>();
    let low = resolve_all(reader.files(&config.low_path));
    let high = resolve_all(reader.files(&config.high_path));

    if let Some(shared) = low.iter().find(|f| high.contains(f)) {
        return Err(FusionError::invalid_config(format!(
            "low and high inputs both resolve to {:?}",
            shared
        )));
    }

    if config.save {
        let output = resolve_all(writer.files(&config.output_path));
        if let Some(clash) = output.iter().find(|f| low.contains(f) || high.contains(f)) {
            return Err(FusionError::invalid_config(format!(
                "output path {:?} would overwrite input file {:?}",
                config.output_path, clash
            )));
        }
    }
    Ok(())
}

/// Run a configured fusion with explicit storage back ends.
pub fn run_with(
    config: &FusionConfig,
    reader: &dyn CubeReader,
    writer: &dyn CubeWriter,
) -> Result<FusionOutput> {
    config.validate()?;
    ensure_distinct_files(config, reader, writer)?;
    let started = Instant::now();

    let low = reader.read(&config.low_path)?;
    let high = reader.read(&config.high_path)?;

    let mut output = fuse(low, high, &config.options)?;

    if config.save {
        output.report.files_written = writer.write(&config.output_path, &output.quantized)?;
    } else {
        log::info!("Saving disabled, fused cube not written");
    }

    log::info!("Fusion finished in {:.2?}", started.elapsed());
    Ok(output)
}

/// Run a configured fusion with the built-in `.npy` store.
pub fn run(config: &FusionConfig) -> Result<FusionReport> {
    let store = NpyCubeStore;
    Ok(run_with(config, &store, &store)?.report)
}
