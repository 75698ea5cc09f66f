use crate::core::cloud::{fit_cloud_slope, is_cloud, CloudSlopeParams};
use crate::core::noise::excess_error_ratio;
use crate::core::smooth::smooth;
use crate::core::wavelength::{BandWindows, CloudThresholds, VisSubsets, WavelengthGrid};
use crate::types::{LineFrame, QaError, QaResult, FILL_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Streaming aggregation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorParams {
    /// Decimation stride: process every n-th valid spectrum
    pub sample_stride: usize,
    /// Smoothing window for the local reference spectrum (odd)
    pub smooth_window: usize,
    /// Run the visible-range slope fit on cloud spectra
    pub fit_cloud_slope: bool,
    /// Acceptance gate for cloud slope fits
    pub slope_params: CloudSlopeParams,
    /// Log accepted cloud fits at DEBUG (stand-in for interactive plots)
    pub trace_cloud_fits: bool,
}

impl Default for AggregatorParams {
    fn default() -> Self {
        Self {
            sample_stride: 1,
            smooth_window: 3,
            fit_cloud_slope: false,
            slope_params: CloudSlopeParams::default(),
            trace_cloud_fits: false,
        }
    }
}

/// Finalized accumulators handed to the report writer.
#[derive(Debug, Clone)]
pub struct QualitySummary {
    /// One excess-error ratio per processed spectrum, non-finite included
    pub error_ratios: Vec<f64>,
    /// Slopes of accepted cloud fits
    pub slopes: Vec<f64>,
    /// Ratio-to-fit residual curves of accepted cloud fits
    pub residuals: Vec<Vec<f64>>,
    /// Wavelengths for the residual curve rows
    pub eval_wavelengths: Vec<f64>,
}

/// Single-pass consumer of pixel spectra.
///
/// Band intervals, cloud thresholds and visible subsets are resolved from the
/// wavelength grid once at construction; every spectrum then flows through
/// fill rejection, decimation, the noise metric and the cloud path, appending
/// into run-owned accumulators. `finalize` consumes the aggregator, so no
/// mutation is possible after the source is exhausted.
#[derive(Debug)]
pub struct SpectrumAggregator {
    params: AggregatorParams,
    n_channels: usize,
    windows: BandWindows,
    cloud_thresholds: CloudThresholds,
    vis: VisSubsets,
    valid_count: u64,
    error_ratios: Vec<f64>,
    slopes: Vec<f64>,
    residuals: Vec<Vec<f64>>,
}

impl SpectrumAggregator {
    pub fn new(grid: &WavelengthGrid, params: AggregatorParams) -> QaResult<Self> {
        if params.sample_stride == 0 {
            return Err(QaError::Processing(
                "Decimation stride must be a positive integer".to_string(),
            ));
        }

        let windows = BandWindows::from_grid(grid);
        let cloud_thresholds = CloudThresholds::from_grid(grid);
        let vis = VisSubsets::from_grid(grid);

        log::debug!(
            "Band windows: water {:?}/{:?}, reference {:?}/{:?}",
            windows.water_a,
            windows.water_b,
            windows.ref_a,
            windows.ref_b
        );

        Ok(Self {
            params,
            n_channels: grid.len(),
            windows,
            cloud_thresholds,
            vis,
            valid_count: 0,
            error_ratios: Vec::new(),
            slopes: Vec::new(),
            residuals: Vec::new(),
        })
    }

    /// Number of valid (non-fill) spectra seen so far.
    pub fn valid_count(&self) -> u64 {
        self.valid_count
    }

    /// Consume one raster line, pixel by pixel in pixel order.
    pub fn process_line(&mut self, frame: &LineFrame) -> QaResult<()> {
        for pixel in frame.rows() {
            match pixel.as_slice() {
                Some(spectrum) => self.process_spectrum(spectrum)?,
                None => {
                    let owned = pixel.to_vec();
                    self.process_spectrum(&owned)?;
                }
            }
        }
        Ok(())
    }

    /// Consume one pixel spectrum.
    pub fn process_spectrum(&mut self, entry: &[f32]) -> QaResult<()> {
        // Trailing channels beyond the wavelength axis carry ancillary state
        // and are ignored.
        let spectrum = if entry.len() > self.n_channels {
            &entry[..self.n_channels]
        } else if entry.len() < self.n_channels {
            return Err(QaError::Processing(format!(
                "Spectrum has {} channels but the wavelength axis has {}",
                entry.len(),
                self.n_channels
            )));
        } else {
            entry
        };

        // Fill spectra are excluded entirely and do not advance the counter
        if spectrum.iter().any(|&v| v < FILL_THRESHOLD) {
            return Ok(());
        }

        self.valid_count += 1;
        if self.valid_count % self.params.sample_stride as u64 != 0 {
            return Ok(());
        }

        let smoothed = smooth(spectrum, self.params.smooth_window)?;
        let ratio = excess_error_ratio(spectrum, &smoothed, &self.windows);
        // Non-finite ratios are kept so the percentiles can surface pathology
        self.error_ratios.push(ratio as f64);

        if self.params.fit_cloud_slope && is_cloud(spectrum, &self.cloud_thresholds) {
            if let Some(fit) = fit_cloud_slope(spectrum, &self.vis, &self.params.slope_params) {
                if self.params.trace_cloud_fits {
                    log::debug!(
                        "Accepted cloud fit: error {:8.6}, slope {:8.6}",
                        fit.fit_error,
                        fit.slope
                    );
                }
                self.slopes.push(fit.slope);
                self.residuals.push(fit.residual);
            }
        }

        Ok(())
    }

    /// End the streaming pass and hand the accumulators to the caller.
    pub fn finalize(self) -> QualitySummary {
        log::info!(
            "Aggregation complete: {} spectra seen, {} ratios, {} accepted cloud fits",
            self.valid_count,
            self.error_ratios.len(),
            self.slopes.len()
        );
        QualitySummary {
            error_ratios: self.error_ratios,
            slopes: self.slopes,
            residuals: self.residuals,
            eval_wavelengths: self.vis.eval_wavelengths,
        }
    }
}
