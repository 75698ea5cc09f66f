use crate::core::wavelength::WavelengthGrid;
use crate::io::envi::EnviHeader;
use crate::types::{QaError, QaResult};
use std::path::Path;

/// Load a whitespace-delimited wavelength table: one row per channel with
/// columns (index, center wavelength, fwhm). Blank lines and `#` comments
/// are skipped.
pub fn load_wavelength_table(path: &Path) -> QaResult<(Vec<f64>, Vec<f64>)> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        QaError::Metadata(format!(
            "Cannot read wavelength table {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut wavelengths = Vec::new();
    let mut fwhm = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() != 3 {
            return Err(QaError::InvalidFormat(format!(
                "Wavelength table line {}: expected 3 columns, found {}",
                lineno + 1,
                cols.len()
            )));
        }
        let parse = |tok: &str| -> QaResult<f64> {
            tok.parse::<f64>().map_err(|_| {
                QaError::InvalidFormat(format!(
                    "Wavelength table line {}: invalid number '{}'",
                    lineno + 1,
                    tok
                ))
            })
        };
        parse(cols[0])?; // channel index column, unused
        wavelengths.push(parse(cols[1])?);
        fwhm.push(parse(cols[2])?);
    }

    Ok((wavelengths, fwhm))
}

/// Resolve the wavelength grid for a run: an external table wins, then the
/// raster's own header fields. Failing both is a fatal configuration error,
/// raised before any streaming begins.
pub fn resolve_wavelength_grid(
    header: &EnviHeader,
    table_path: Option<&Path>,
) -> QaResult<WavelengthGrid> {
    if let Some(path) = table_path {
        log::info!("Reading wavelengths from {}", path.display());
        let (wavelengths, fwhm) = load_wavelength_table(path)?;
        return WavelengthGrid::new(wavelengths, fwhm);
    }

    let wavelengths = header.wavelength.clone().ok_or_else(|| {
        QaError::Metadata("Could not find wavelength data anywhere".to_string())
    })?;
    let fwhm = header.fwhm.clone().ok_or_else(|| {
        QaError::Metadata("Could not find fwhm data anywhere".to_string())
    })?;
    WavelengthGrid::new(wavelengths, fwhm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::envi::{DataType, Interleave};
    use std::io::Write;

    fn header(wavelength: Option<Vec<f64>>, fwhm: Option<Vec<f64>>) -> EnviHeader {
        EnviHeader {
            samples: 1,
            lines: 1,
            bands: 3,
            interleave: Interleave::Bip,
            data_type: DataType::Float32,
            big_endian: false,
            wavelength,
            fwhm,
        }
    }

    #[test]
    fn test_load_three_column_table() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# chan  wl  fwhm").unwrap();
        writeln!(f, "0  0.380  0.005").unwrap();
        writeln!(f, "1  0.385  0.005").unwrap();
        writeln!(f, "2  0.390  0.005").unwrap();
        let (wl, fwhm) = load_wavelength_table(f.path()).unwrap();
        assert_eq!(wl, vec![0.380, 0.385, 0.390]);
        assert_eq!(fwhm, vec![0.005; 3]);
    }

    #[test]
    fn test_malformed_table_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "0 0.380").unwrap();
        assert!(load_wavelength_table(f.path()).is_err());
    }

    #[test]
    fn test_header_fields_used_when_no_table() {
        let hdr = header(Some(vec![400.0, 500.0, 600.0]), Some(vec![10.0; 3]));
        let grid = resolve_wavelength_grid(&hdr, None).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.wavelengths()[1], 500.0);
    }

    #[test]
    fn test_missing_everything_is_fatal() {
        let hdr = header(None, None);
        assert!(resolve_wavelength_grid(&hdr, None).is_err());
    }

    #[test]
    fn test_missing_fwhm_is_fatal() {
        let hdr = header(Some(vec![400.0, 500.0, 600.0]), None);
        assert!(resolve_wavelength_grid(&hdr, None).is_err());
    }
}
