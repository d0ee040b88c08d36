//! NumPy `.npy` body + JSON header cube storage.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array3;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use tempfile::NamedTempFile;

use crate::constants::{QUANTIZED_DTYPE, metadata_keys};
use crate::error::{FusionError, Result};
use crate::fusion::QuantizedCube;
use crate::hyperspectral::{HyperspectralCube, Metadata};
use crate::io::{CubeReader, CubeWriter, scale_factor_from_metadata, wavelengths_from_metadata};

/// Stores a cube at `<path>.npy` with its header at `<path>.json`.
///
/// Bodies are (rows, cols, bands). Reading accepts `f32`, `f64` and `u16`
/// bodies; `u16` bodies are divided by the header's reflectance scale factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyCubeStore;

impl NpyCubeStore {
    /// Path of the array body for a cube path.
    pub fn body_path(path: &Path) -> PathBuf {
        path.with_extension("npy")
    }

    /// Path of the JSON header for a cube path.
    pub fn header_path(path: &Path) -> PathBuf {
        path.with_extension("json")
    }

    fn read_header(path: &Path) -> Result<Metadata> {
        let file = File::open(Self::header_path(path))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn read_body(path: &Path, header: &Metadata) -> Result<Array3<f32>> {
        let body = Self::body_path(path);
        let reader = BufReader::new(File::open(&body)?);

        match header.get(metadata_keys::DTYPE).and_then(|v| v.as_str()) {
            Some("float32") | None => Ok(Array3::<f32>::read_npy(reader)?),
            Some("float64") => {
                log::debug!("NpyCubeStore: converting f64 body {:?} to f32", body);
                Ok(Array3::<f64>::read_npy(reader)?.mapv(|v| v as f32))
            }
            Some(QUANTIZED_DTYPE) => {
                let scale = scale_factor_from_metadata(header)
                    .ok_or_else(|| FusionError::missing_metadata(metadata_keys::SCALE_FACTOR))?;
                let stored = Array3::<u16>::read_npy(reader)?;
                log::debug!(
                    "NpyCubeStore: rescaling u16 body {:?} by 1/{}",
                    body,
                    scale
                );
                Ok(crate::fusion::dequantize(stored.view(), scale))
            }
            Some(other) => Err(FusionError::UnsupportedDtype {
                dtype: other.to_string(),
            }),
        }
    }

    /// Write a reflectance cube (f32 body) with its metadata and wavelengths.
    pub fn write_reflectance(&self, path: &Path, cube: &HyperspectralCube) -> Result<Vec<PathBuf>> {
        let mut header = cube.metadata().clone();
        header.insert(
            metadata_keys::WAVELENGTH.to_string(),
            serde_json::json!(cube.wavelengths().as_slice()),
        );
        header.insert(metadata_keys::BANDS.to_string(), cube.bands().into());
        header.insert(metadata_keys::LINES.to_string(), cube.rows().into());
        header.insert(metadata_keys::SAMPLES.to_string(), cube.cols().into());
        header.insert(metadata_keys::DTYPE.to_string(), "float32".into());

        write_atomically(path, &header, |writer| Ok(cube.data().write_npy(writer)?))
    }
}

impl CubeReader for NpyCubeStore {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn files(&self, path: &Path) -> Vec<PathBuf> {
        vec![Self::body_path(path), Self::header_path(path)]
    }

    fn read(&self, path: &Path) -> Result<HyperspectralCube> {
        log::info!("Opening cube {:?}", path);
        let header = Self::read_header(path)?;
        let wavelengths = wavelengths_from_metadata(&header)?;
        let data = Self::read_body(path, &header)?;

        let (rows, cols, bands) = data.dim();
        log::info!("Cube rows, cols, bands: {}, {}, {}", rows, cols, bands);

        Ok(HyperspectralCube::new(data, wavelengths)?.with_metadata(header))
    }
}

impl CubeWriter for NpyCubeStore {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn files(&self, path: &Path) -> Vec<PathBuf> {
        vec![Self::body_path(path), Self::header_path(path)]
    }

    fn write(&self, path: &Path, cube: &QuantizedCube) -> Result<Vec<PathBuf>> {
        log::info!("Writing cube to {:?}", path);
        write_atomically(path, &cube.header, |writer| Ok(cube.data.write_npy(writer)?))
    }
}

/// Write body and header to temporary files next to `path`, then move both
/// into place. The header lands last, so a failure never leaves a readable
/// cube behind.
fn write_atomically<F>(path: &Path, header: &Metadata, write_body: F) -> Result<Vec<PathBuf>>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let body_path = NpyCubeStore::body_path(path);
    let header_path = NpyCubeStore::header_path(path);

    let mut body_tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(body_tmp.as_file_mut());
        write_body(&mut writer)?;
        writer.flush()?;
    }

    let mut header_tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(header_tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, header)?;
        writer.flush()?;
    }

    // A stale header from an earlier run must not pair with the new body.
    if header_path.exists() {
        std::fs::remove_file(&header_path)?;
    }
    body_tmp.persist(&body_path)?;
    header_tmp.persist(&header_path)?;

    log::debug!("Persisted {:?} and {:?}", body_path, header_path);
    Ok(vec![body_path, header_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverflowPolicy;
    use crate::fusion::Quantizer;

    fn sample_cube() -> HyperspectralCube {
        let data = Array3::from_shape_fn((3, 2, 4), |(r, c, b)| {
            0.1 * r as f32 + 0.01 * c as f32 + 0.001 * b as f32
        });
        let mut metadata = Metadata::new();
        metadata.insert("sensor type".to_string(), "VNIR".into());
        HyperspectralCube::new(data, vec![900.0, 920.0, 940.0, 960.0])
            .unwrap()
            .with_metadata(metadata)
    }

    #[test]
    fn test_reflectance_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vnir");
        let cube = sample_cube();

        let files = NpyCubeStore.write_reflectance(&path, &cube).unwrap();
        assert_eq!(files, vec![dir.path().join("vnir.npy"), dir.path().join("vnir.json")]);

        let loaded = NpyCubeStore.read(&path).unwrap();
        assert_eq!(loaded.data(), cube.data());
        assert_eq!(loaded.wavelengths(), cube.wavelengths());
        assert_eq!(loaded.metadata()["sensor type"], "VNIR");
    }

    #[test]
    fn test_quantized_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fused.hdr");
        let cube = sample_cube();
        let quantized = Quantizer::new(10_000.0, OverflowPolicy::Wrap)
            .quantize(cube.data().view(), cube.wavelengths(), cube.metadata())
            .unwrap();

        NpyCubeStore.write(&path, &quantized).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["fused.json", "fused.npy"]);

        let loaded = NpyCubeStore.read(&path).unwrap();
        assert_eq!(loaded.bands(), 4);
        assert_eq!(loaded.metadata()["dtype"], "uint16");
        let expected = crate::fusion::dequantize(quantized.data.view(), 10_000.0);
        assert_eq!(loaded.data(), &expected);
    }

    #[test]
    fn test_missing_header_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NpyCubeStore.read(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, FusionError::Io(_)));
    }

    #[test]
    fn test_header_band_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad");
        NpyCubeStore.write_reflectance(&path, &sample_cube()).unwrap();

        let mut header = NpyCubeStore::read_header(&path).unwrap();
        header.insert(
            metadata_keys::WAVELENGTH.to_string(),
            serde_json::json!([900.0, 920.0]),
        );
        std::fs::write(
            NpyCubeStore::header_path(&path),
            serde_json::to_string(&header).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            NpyCubeStore.read(&path),
            Err(FusionError::BandCountMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_body_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vnir");
        NpyCubeStore.write_reflectance(&path, &sample_cube()).unwrap();

        let body = NpyCubeStore::body_path(&path);
        let bytes = std::fs::read(&body).unwrap();
        std::fs::write(&body, &bytes[..bytes.len() - 8]).unwrap();

        assert!(matches!(
            NpyCubeStore.read(&path),
            Err(FusionError::NpyRead(_))
        ));
    }

    #[test]
    fn test_unknown_dtype_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vnir");
        NpyCubeStore.write_reflectance(&path, &sample_cube()).unwrap();

        let mut header = NpyCubeStore::read_header(&path).unwrap();
        header.insert(metadata_keys::DTYPE.to_string(), "int8".into());
        std::fs::write(
            NpyCubeStore::header_path(&path),
            serde_json::to_string(&header).unwrap(),
        )
        .unwrap();

        match NpyCubeStore.read(&path) {
            Err(FusionError::UnsupportedDtype { dtype }) => assert_eq!(dtype, "int8"),
            other => panic!("expected UnsupportedDtype, got {:?}", other),
        }
    }

    #[test]
    fn test_reader_and_writer_share_file_layout() {
        let path = Path::new("out/fused.hdr");
        let expected = vec![PathBuf::from("out/fused.npy"), PathBuf::from("out/fused.json")];
        assert_eq!(CubeReader::files(&NpyCubeStore, path), expected);
        assert_eq!(CubeWriter::files(&NpyCubeStore, path), expected);
    }
}
