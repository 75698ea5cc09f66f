use crate::types::{QaError, QaResult, Reflectance};
use serde::{Deserialize, Serialize};

/// Water-absorption test intervals (nm)
const WATER_A_NM: (f64, f64) = (910.0, 990.0);
const WATER_B_NM: (f64, f64) = (1090.0, 1180.0);

/// Clean reference intervals used to normalize the water-band divergence (nm)
const REF_A_NM: (f64, f64) = (1010.0, 1080.0);
const REF_B_NM: (f64, f64) = (780.0, 900.0);

/// Cloud screening bands and reflectance thresholds
const CLOUD_BANDS_NM: [f64; 3] = [450.0, 1250.0, 1650.0];
const CLOUD_THRESHOLDS: [Reflectance; 3] = [0.29, 0.22, 0.22];

/// Visible-range bounds for the cloud slope fit (nm)
const VIS_FIT_LOW_NM: f64 = 450.0;
const VIS_UPPER_NM: f64 = 1000.0;

/// Spectral channel centers and bandwidths, in nanometers.
///
/// Construction normalizes units exactly once: an axis whose every value is
/// at or below 100 is taken to be in micrometers and rescaled by 1000.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WavelengthGrid {
    wavelengths: Vec<f64>,
    fwhm: Vec<f64>,
}

impl WavelengthGrid {
    pub fn new(mut wavelengths: Vec<f64>, fwhm: Vec<f64>) -> QaResult<Self> {
        if wavelengths.is_empty() {
            return Err(QaError::Metadata(
                "Wavelength axis is empty".to_string(),
            ));
        }
        if fwhm.len() != wavelengths.len() {
            return Err(QaError::Metadata(format!(
                "Wavelength/FWHM length mismatch: {} vs {}",
                wavelengths.len(),
                fwhm.len()
            )));
        }

        if !wavelengths.iter().any(|&w| w > 100.0) {
            log::info!("Assuming wavelengths provided in microns, converting to nm");
            for w in wavelengths.iter_mut() {
                *w *= 1000.0;
            }
        }

        Ok(Self { wavelengths, fwhm })
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn fwhm(&self) -> &[f64] {
        &self.fwhm
    }

    /// Index of the channel closest to the target wavelength (nm).
    /// Ties resolve to the lowest index.
    pub fn nearest_band(&self, target: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, &w) in self.wavelengths.iter().enumerate() {
            let dist = (w - target).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }
}

/// Half-open channel-index intervals for the water test bands and the clean
/// reference bands, resolved once per run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandWindows {
    pub water_a: (usize, usize),
    pub water_b: (usize, usize),
    pub ref_a: (usize, usize),
    pub ref_b: (usize, usize),
}

impl BandWindows {
    pub fn from_grid(grid: &WavelengthGrid) -> Self {
        let interval = |bounds: (f64, f64)| {
            (grid.nearest_band(bounds.0), grid.nearest_band(bounds.1))
        };
        Self {
            water_a: interval(WATER_A_NM),
            water_b: interval(WATER_B_NM),
            ref_a: interval(REF_A_NM),
            ref_b: interval(REF_B_NM),
        }
    }
}

/// Cloud screening bands resolved to channel indices, with their
/// reflectance thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CloudThresholds {
    pub bands: [(usize, Reflectance); 3],
}

impl CloudThresholds {
    pub fn from_grid(grid: &WavelengthGrid) -> Self {
        let mut bands = [(0usize, 0.0 as Reflectance); 3];
        for (slot, (&nm, &thresh)) in bands
            .iter_mut()
            .zip(CLOUD_BANDS_NM.iter().zip(CLOUD_THRESHOLDS.iter()))
        {
            *slot = (grid.nearest_band(nm), thresh);
        }
        Self { bands }
    }
}

/// Channel subsets for the cloud slope analysis: the fit domain
/// (450 nm < wl < 1000 nm) and the wider evaluation domain (wl < 1000 nm)
/// that also sets the width of the reported residual curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisSubsets {
    pub fit_indices: Vec<usize>,
    pub eval_indices: Vec<usize>,
    pub eval_wavelengths: Vec<f64>,
}

impl VisSubsets {
    pub fn from_grid(grid: &WavelengthGrid) -> Self {
        let mut fit_indices = Vec::new();
        let mut eval_indices = Vec::new();
        let mut eval_wavelengths = Vec::new();
        for (i, &w) in grid.wavelengths().iter().enumerate() {
            if w > VIS_FIT_LOW_NM && w < VIS_UPPER_NM {
                fit_indices.push(i);
            }
            if w < VIS_UPPER_NM {
                eval_indices.push(i);
                eval_wavelengths.push(w);
            }
        }
        Self {
            fit_indices,
            eval_indices,
            eval_wavelengths,
        }
    }
}
