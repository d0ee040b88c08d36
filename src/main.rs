//! HSFUSE command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use hsfuse::config::{
    ExtrapolationPolicy, OverflowPolicy, PostOverlapBoundary, ResamplingMethod,
};
use hsfuse::{FusionConfig, LogLevel};

/// Fuse co-registered VNIR and SWIR cubes into one full-spectrum cube
#[derive(Parser, Debug)]
#[command(name = "hsfuse")]
#[command(version)]
struct Args {
    /// JSON configuration file; other flags override its fields
    #[arg(short, long, env = "HSFUSE_CONFIG")]
    config: Option<PathBuf>,

    /// Low-wavelength (VNIR) cube
    #[arg(long)]
    low: Option<PathBuf>,

    /// High-wavelength (SWIR) cube, already co-registered to the low cube
    #[arg(long)]
    high: Option<PathBuf>,

    /// Output cube path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Reflectance scale factor
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Run the fusion without writing the output
    #[arg(long)]
    no_save: bool,

    /// Saturate instead of wrapping values that exceed the uint16 range
    #[arg(long, conflicts_with = "strict_overflow")]
    clamp: bool,

    /// Abort when any value exceeds the uint16 range
    #[arg(long)]
    strict_overflow: bool,

    /// Clamp out-of-range resampling targets to the nearest edge band
    #[arg(long)]
    clamp_extrapolation: bool,

    /// Drop the high sensor's final band (historical slicing)
    #[arg(long)]
    exclude_last_band: bool,

    /// Resampling method
    #[arg(long, value_parser = parse_method)]
    resampling: Option<ResamplingMethod>,

    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,
}

fn parse_method(s: &str) -> Result<ResamplingMethod, String> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
        .map_err(|_| format!("unknown resampling method '{}'", s))
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
        .map_err(|_| format!("unknown log level '{}'", s))
}

impl Args {
    fn into_config(self) -> hsfuse::Result<FusionConfig> {
        let mut config = match &self.config {
            Some(path) => FusionConfig::load(path)?,
            None => {
                let (Some(low), Some(high), Some(output)) =
                    (self.low.clone(), self.high.clone(), self.output.clone())
                else {
                    return Err(hsfuse::FusionError::invalid_config(
                        "either --config or all of --low, --high and --output are required",
                    ));
                };
                FusionConfig::new(low, high, output)
            }
        };

        if let Some(low) = self.low {
            config.low_path = low;
        }
        if let Some(high) = self.high {
            config.high_path = high;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(scale_factor) = self.scale_factor {
            config.options.scale_factor = scale_factor;
        }
        if let Some(resampling) = self.resampling {
            config.options.resampling = resampling;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.no_save {
            config.save = false;
        }
        if self.clamp {
            config.options.overflow = OverflowPolicy::Clamp;
        }
        if self.strict_overflow {
            config.options.overflow = OverflowPolicy::Error;
        }
        if self.clamp_extrapolation {
            config.options.extrapolation = ExtrapolationPolicy::NearestClamp;
        }
        if self.exclude_last_band {
            config.options.post_overlap_boundary = PostOverlapBoundary::ExcludeLastBand;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    log::info!(
        "Fusing {:?} + {:?} -> {:?}",
        config.low_path,
        config.high_path,
        config.output_path
    );

    match hsfuse::fusion::run(&config) {
        Ok(report) => {
            log::info!(
                "Final cube: {} bands ({} pre + {} blended + {} post)",
                report.final_bands(),
                report.layout.pre,
                report.layout.overlap,
                report.layout.post
            );
            if report.overflow_count > 0 {
                log::warn!(
                    "{} values exceeded the uint16 range",
                    report.overflow_count
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Fusion failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(args: &[&str]) -> hsfuse::Result<FusionConfig> {
        let mut argv = vec!["hsfuse"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap().into_config()
    }

    const PATHS: [&str; 6] = ["--low", "vnir", "--high", "swir", "--output", "fused"];

    #[test]
    fn test_paths_without_config_file() {
        let config = config_from(&PATHS).unwrap();
        assert_eq!(config.low_path, PathBuf::from("vnir"));
        assert_eq!(config.high_path, PathBuf::from("swir"));
        assert_eq!(config.output_path, PathBuf::from("fused"));
        assert!(config.save);
        assert_eq!(config.options.overflow, OverflowPolicy::Wrap);
        assert_eq!(config.options.resampling, ResamplingMethod::Linear);
    }

    #[test]
    fn test_missing_paths_rejected() {
        let err = config_from(&["--low", "vnir", "--high", "swir"]).unwrap_err();
        assert!(matches!(err, hsfuse::FusionError::InvalidConfig { .. }));
    }

    #[test]
    fn test_policy_switches() {
        let mut args = PATHS.to_vec();
        args.extend([
            "--clamp",
            "--clamp-extrapolation",
            "--exclude-last-band",
            "--no-save",
            "--scale-factor",
            "1000",
        ]);
        let config = config_from(&args).unwrap();
        assert_eq!(config.options.overflow, OverflowPolicy::Clamp);
        assert_eq!(
            config.options.extrapolation,
            ExtrapolationPolicy::NearestClamp
        );
        assert_eq!(
            config.options.post_overlap_boundary,
            PostOverlapBoundary::ExcludeLastBand
        );
        assert!(!config.save);
        assert_eq!(config.options.scale_factor, 1000.0);

        let mut args = PATHS.to_vec();
        args.push("--strict-overflow");
        assert_eq!(
            config_from(&args).unwrap().options.overflow,
            OverflowPolicy::Error
        );
    }

    #[test]
    fn test_clamp_conflicts_with_strict_overflow() {
        let mut argv = vec!["hsfuse"];
        argv.extend_from_slice(&PATHS);
        argv.extend(["--clamp", "--strict-overflow"]);
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_enum_flags_ignore_case() {
        let mut args = PATHS.to_vec();
        args.extend(["--resampling", "Gaussian", "--log-level", "DEBUG"]);
        let config = config_from(&args).unwrap();
        assert_eq!(config.options.resampling, ResamplingMethod::Gaussian);
        assert_eq!(config.log_level, LogLevel::Debug);

        let mut argv = vec!["hsfuse"];
        argv.extend_from_slice(&PATHS);
        argv.extend(["--resampling", "cubic"]);
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fusion.json");
        FusionConfig::new("vnir", "swir", "fused")
            .save_to(&path)
            .unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let config = config_from(&[
            "--config",
            path_arg.as_str(),
            "--output",
            "other",
            "--no-save",
        ])
        .unwrap();
        assert_eq!(config.low_path, PathBuf::from("vnir"));
        assert_eq!(config.output_path, PathBuf::from("other"));
        assert!(!config.save);
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let err = config_from(&["--low", "same", "--high", "same", "--output", "fused"]).unwrap_err();
        assert!(matches!(err, hsfuse::FusionError::InvalidConfig { .. }));
    }
}
