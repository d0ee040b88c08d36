//! Configuration file support for spectral fusion.
//!
//! A fusion run is described by one immutable [`FusionConfig`] record that can
//! be loaded from and saved to JSON. The path-free [`FusionOptions`] subset is
//! what the core pipeline consumes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SCALE_FACTOR;
use crate::error::{FusionError, Result};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Interpolation scheme used to move high-sensor overlap spectra onto the low grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    /// Piecewise-linear interpolation between neighbouring source bands
    #[default]
    Linear,
    /// Value of the nearest source band
    Nearest,
    /// Gaussian spectral response with FWHM estimated from band spacing
    Gaussian,
}

/// What a resampler does with a target wavelength outside the source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// The target band receives no contribution (all-zero operator row)
    #[default]
    Zero,
    /// The target band copies the nearest edge source band
    NearestClamp,
}

/// Behaviour when a scaled value does not fit in `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Wrap modulo 2^16 and count the occurrences
    #[default]
    Wrap,
    /// Saturate at 0 and 65535
    Clamp,
    /// Abort quantization with [`FusionError::QuantizationOverflow`]
    Error,
}

/// Where the post-overlap high-sensor segment ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostOverlapBoundary {
    /// Keep every high band above the low sensor's maximum
    #[default]
    ThroughLastBand,
    /// Drop the high sensor's final band (historical `[first:-1]` slicing)
    ExcludeLastBand,
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Algorithm options for one fusion run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionOptions {
    /// Multiplier from reflectance to stored integers
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Resampling scheme for the overlap
    #[serde(default)]
    pub resampling: ResamplingMethod,

    /// Extrapolation policy for targets outside the source span
    #[serde(default)]
    pub extrapolation: ExtrapolationPolicy,

    /// Quantization overflow behaviour
    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Post-overlap boundary interpretation
    #[serde(default)]
    pub post_overlap_boundary: PostOverlapBoundary,
}

fn default_scale_factor() -> f64 {
    DEFAULT_SCALE_FACTOR
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            resampling: ResamplingMethod::default(),
            extrapolation: ExtrapolationPolicy::default(),
            overflow: OverflowPolicy::default(),
            post_overlap_boundary: PostOverlapBoundary::default(),
        }
    }
}

impl FusionOptions {
    /// Set the scale factor.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the resampling method.
    pub fn with_resampling(mut self, resampling: ResamplingMethod) -> Self {
        self.resampling = resampling;
        self
    }

    /// Set the extrapolation policy.
    pub fn with_extrapolation(mut self, extrapolation: ExtrapolationPolicy) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Set the overflow policy.
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set the post-overlap boundary policy.
    pub fn with_post_overlap_boundary(mut self, boundary: PostOverlapBoundary) -> Self {
        self.post_overlap_boundary = boundary;
        self
    }

    /// Reject options the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(FusionError::invalid_config(format!(
                "scale factor must be finite and positive, got {}",
                self.scale_factor
            )));
        }
        Ok(())
    }
}

/// Complete description of a fusion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Low-wavelength (VNIR) cube
    pub low_path: PathBuf,

    /// High-wavelength (SWIR) cube, already co-registered to the low cube
    pub high_path: PathBuf,

    /// Destination of the fused cube
    pub output_path: PathBuf,

    /// Write the fused cube when the run completes
    #[serde(default = "default_save")]
    pub save: bool,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Algorithm options
    #[serde(flatten)]
    pub options: FusionOptions,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_save() -> bool {
    true
}

impl FusionConfig {
    /// Create a configuration with default options.
    pub fn new(
        low_path: impl Into<PathBuf>,
        high_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            version: CONFIG_VERSION,
            low_path: low_path.into(),
            high_path: high_path.into(),
            output_path: output_path.into(),
            save: default_save(),
            log_level: LogLevel::default(),
            options: FusionOptions::default(),
        }
    }

    /// Set whether the fused cube is written.
    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// Replace the algorithm options.
    pub fn with_options(mut self, options: FusionOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading fusion config from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write this configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        log::debug!("Saved fusion config to {:?}", path);
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.version > CONFIG_VERSION {
            return Err(FusionError::invalid_config(format!(
                "config version {} is newer than supported version {}",
                self.version, CONFIG_VERSION
            )));
        }
        if self.low_path == self.high_path {
            return Err(FusionError::invalid_config(
                "low and high inputs point at the same cube",
            ));
        }
        if self.save && (self.output_path == self.low_path || self.output_path == self.high_path)
        {
            return Err(FusionError::invalid_config(
                "output path would overwrite an input cube",
            ));
        }
        self.options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let json = r#"{
            "low_path": "vnir/data",
            "high_path": "swir/data_warped",
            "output_path": "full_spec"
        }"#;
        let config = FusionConfig::from_json(json).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.save);
        assert_eq!(config.options.scale_factor, 10_000.0);
        assert_eq!(config.options.overflow, OverflowPolicy::Wrap);
        assert_eq!(config.options.extrapolation, ExtrapolationPolicy::Zero);
        assert_eq!(
            config.options.post_overlap_boundary,
            PostOverlapBoundary::ThroughLastBand
        );
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = FusionConfig::new("a", "b", "c").with_save(false).with_options(
            FusionOptions::default()
                .with_scale_factor(1000.0)
                .with_overflow(OverflowPolicy::Clamp)
                .with_resampling(ResamplingMethod::Gaussian),
        );
        let loaded = FusionConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_policy_names_in_json() {
        let json = r#"{
            "low_path": "a", "high_path": "b", "output_path": "c",
            "extrapolation": "nearest_clamp",
            "post_overlap_boundary": "exclude_last_band",
            "overflow": "error"
        }"#;
        let config = FusionConfig::from_json(json).unwrap();
        assert_eq!(
            config.options.extrapolation,
            ExtrapolationPolicy::NearestClamp
        );
        assert_eq!(
            config.options.post_overlap_boundary,
            PostOverlapBoundary::ExcludeLastBand
        );
        assert_eq!(config.options.overflow, OverflowPolicy::Error);
    }

    #[test]
    fn test_rejects_bad_scale_factor() {
        let config = FusionConfig::new("a", "b", "c")
            .with_options(FusionOptions::default().with_scale_factor(0.0));
        assert!(matches!(
            config.validate(),
            Err(FusionError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_output_over_input() {
        let config = FusionConfig::new("a", "b", "a");
        assert!(config.validate().is_err());
        assert!(config.with_save(false).validate().is_ok());
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    }
}
