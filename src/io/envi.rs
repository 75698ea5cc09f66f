use crate::types::{LineFrame, QaError, QaResult};
use ndarray::Array2;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Raster line layout within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interleave {
    /// Band-interleaved-by-pixel: spectra are already sequential
    Bip,
    /// Band-interleaved-by-line
    Bil,
    /// Band-sequential
    Bsq,
}

/// Supported ENVI element types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int16,
    Float32,
    Float64,
}

impl DataType {
    fn from_code(code: u32) -> QaResult<Self> {
        match code {
            2 => Ok(DataType::Int16),
            4 => Ok(DataType::Float32),
            5 => Ok(DataType::Float64),
            other => Err(QaError::InvalidFormat(format!(
                "Unsupported ENVI data type {} (supported: 2, 4, 5)",
                other
            ))),
        }
    }

    fn size_bytes(&self) -> usize {
        match self {
            DataType::Int16 => 2,
            DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }
}

/// Parsed ENVI header fields needed for streaming
#[derive(Debug, Clone)]
pub struct EnviHeader {
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    pub interleave: Interleave,
    pub data_type: DataType,
    pub big_endian: bool,
    pub wavelength: Option<Vec<f64>>,
    pub fwhm: Option<Vec<f64>>,
}

/// Locate the ENVI header associated with an image file.
///
/// For `.img`/`.dat`/`.raw` files the header may live at either
/// `file.hdr` or `file.img.hdr`; whichever exists wins, preferring the
/// former. A `.hdr` path is returned as-is; any other path gets `.hdr`
/// appended.
pub fn find_header(input: &Path) -> PathBuf {
    match input.extension().and_then(|e| e.to_str()) {
        Some("img") | Some("dat") | Some("raw") => {
            let stem_hdr = input.with_extension("hdr");
            if stem_hdr.is_file() {
                return stem_hdr;
            }
            let appended = append_hdr(input);
            if appended.is_file() {
                return appended;
            }
            stem_hdr
        }
        Some("hdr") => input.to_path_buf(),
        _ => append_hdr(input),
    }
}

fn append_hdr(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".hdr");
    PathBuf::from(name)
}

impl EnviHeader {
    pub fn from_file(path: &Path) -> QaResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            QaError::Metadata(format!("Cannot read ENVI header {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> QaResult<Self> {
        let fields = parse_fields(text);

        let required = |key: &str| -> QaResult<&String> {
            fields.get(key).ok_or_else(|| {
                QaError::Metadata(format!("ENVI header is missing '{}'", key))
            })
        };
        let required_usize = |key: &str| -> QaResult<usize> {
            required(key)?.trim().parse::<usize>().map_err(|_| {
                QaError::Metadata(format!("ENVI header field '{}' is not an integer", key))
            })
        };

        let samples = required_usize("samples")?;
        let lines = required_usize("lines")?;
        let bands = required_usize("bands")?;

        let interleave = match required("interleave")?.trim().to_lowercase().as_str() {
            "bip" => Interleave::Bip,
            "bil" => Interleave::Bil,
            "bsq" => Interleave::Bsq,
            other => {
                return Err(QaError::InvalidFormat(format!(
                    "Unknown interleave '{}'",
                    other
                )))
            }
        };

        let data_type = DataType::from_code(required_usize("data type")? as u32)?;

        let big_endian = match fields.get("byte order") {
            Some(v) => v.trim() == "1",
            None => false,
        };

        let wavelength = fields
            .get("wavelength")
            .map(|v| parse_float_list(v))
            .transpose()?;
        let fwhm = fields.get("fwhm").map(|v| parse_float_list(v)).transpose()?;

        Ok(Self {
            samples,
            lines,
            bands,
            interleave,
            data_type,
            big_endian,
            wavelength,
            fwhm,
        })
    }
}

/// Split header text into lowercase key / raw value pairs. Brace-delimited
/// values (wavelength, fwhm, map info, ...) may span multiple lines.
fn parse_fields(text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("envi") || line.starts_with(';') {
            continue;
        }
        let Some(eq) = line.find('=') else { continue };
        let key = line[..eq].trim().to_lowercase();
        let mut value = line[eq + 1..].trim().to_string();

        if value.starts_with('{') {
            while !value.contains('}') {
                match lines.next() {
                    Some(next) => {
                        value.push(' ');
                        value.push_str(next.trim());
                    }
                    None => break,
                }
            }
            value = value
                .trim_start_matches('{')
                .trim_end_matches('}')
                .trim()
                .to_string();
            if let Some(close) = value.find('}') {
                value.truncate(close);
            }
        }

        fields.insert(key, value);
    }

    fields
}

fn parse_float_list(value: &str) -> QaResult<Vec<f64>> {
    value
        .split(',')
        .map(|tok| tok.trim())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                QaError::Metadata(format!("Invalid numeric header value '{}'", tok))
            })
        })
        .collect()
}

/// Streams one raster line at a time from a flat ENVI binary, decoded to f32
/// and reshaped so each row of the returned frame is one pixel spectrum.
pub struct LineReader {
    reader: BufReader<File>,
    samples: usize,
    bands: usize,
    lines: usize,
    interleave: Interleave,
    data_type: DataType,
    big_endian: bool,
    lines_read: usize,
}

impl LineReader {
    pub fn open(image_path: &Path, header: &EnviHeader) -> QaResult<Self> {
        if !image_path.exists() {
            return Err(QaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", image_path.display()),
            )));
        }
        let file = File::open(image_path)?;
        Ok(Self {
            reader: BufReader::new(file),
            samples: header.samples,
            bands: header.bands,
            lines: header.lines,
            interleave: header.interleave,
            data_type: header.data_type,
            big_endian: header.big_endian,
            lines_read: 0,
        })
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Read the next line frame; `None` once all lines are consumed.
    /// A short read mid-stream is fatal, not a partial result.
    pub fn read_line(&mut self) -> QaResult<Option<LineFrame>> {
        if self.lines_read >= self.lines {
            return Ok(None);
        }

        let frame_elems = self.samples * self.bands;
        let mut raw = vec![0u8; frame_elems * self.data_type.size_bytes()];
        self.reader.read_exact(&mut raw).map_err(|e| {
            QaError::InvalidFormat(format!(
                "Truncated raster at line {}/{}: {}",
                self.lines_read + 1,
                self.lines,
                e
            ))
        })?;
        self.lines_read += 1;

        let data = decode_elements(&raw, self.data_type, self.big_endian);

        // BIP frames are already pixel-sequential; BIL/BSQ lines are
        // band-major and get transposed into pixel order.
        let frame = match self.interleave {
            Interleave::Bip => Array2::from_shape_vec((self.samples, self.bands), data),
            Interleave::Bil | Interleave::Bsq => {
                Array2::from_shape_vec((self.bands, self.samples), data)
                    .map(|a| a.t().to_owned())
            }
        }
        .map_err(|e| QaError::InvalidFormat(format!("Frame reshape failed: {}", e)))?;

        Ok(Some(frame))
    }
}

fn decode_elements(raw: &[u8], data_type: DataType, big_endian: bool) -> Vec<f32> {
    match data_type {
        DataType::Int16 => raw
            .chunks_exact(2)
            .map(|b| {
                let bytes = [b[0], b[1]];
                let v = if big_endian {
                    i16::from_be_bytes(bytes)
                } else {
                    i16::from_le_bytes(bytes)
                };
                v as f32
            })
            .collect(),
        DataType::Float32 => raw
            .chunks_exact(4)
            .map(|b| {
                let bytes = [b[0], b[1], b[2], b[3]];
                if big_endian {
                    f32::from_be_bytes(bytes)
                } else {
                    f32::from_le_bytes(bytes)
                }
            })
            .collect(),
        DataType::Float64 => raw
            .chunks_exact(8)
            .map(|b| {
                let bytes = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
                let v = if big_endian {
                    f64::from_be_bytes(bytes)
                } else {
                    f64::from_le_bytes(bytes)
                };
                v as f32
            })
            .collect(),
    }
}
