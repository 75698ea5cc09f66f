use crate::core::wavelength::{CloudThresholds, VisSubsets};
use serde::{Deserialize, Serialize};

/// Acceptance gate for the visible-range cloud slope fit
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CloudSlopeParams {
    /// Maximum mean absolute relative fit error
    pub uv_err_thresh: f64,
    /// Maximum absolute slope, per channel index
    pub uv_slope_thresh: f64,
}

impl Default for CloudSlopeParams {
    fn default() -> Self {
        Self {
            uv_err_thresh: 0.05,
            uv_slope_thresh: 0.0003,
        }
    }
}

/// Accepted cloud slope fit: the visible-range slope and the ratio-to-fit
/// residual curve over the evaluation subset.
#[derive(Debug, Clone)]
pub struct CloudSlopeFit {
    pub slope: f64,
    pub fit_error: f64,
    pub residual: Vec<f64>,
}

/// A spectrum is cloud iff reflectance strictly exceeds the threshold at all
/// three screening bands.
pub fn is_cloud(spectrum: &[f32], thresholds: &CloudThresholds) -> bool {
    thresholds
        .bands
        .iter()
        .all(|&(band, thresh)| spectrum[band] > thresh)
}

/// Ordinary least-squares line through (x, y); returns (slope, intercept).
fn fit_line(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        cov += (x - x_mean) * (y - y_mean);
        var += (x - x_mean) * (x - x_mean);
    }
    let slope = cov / var;
    (slope, y_mean - slope * x_mean)
}

/// Fit a line to the visible-range reflectance of a cloud spectrum and
/// validate it. The abscissa is the channel index; the slope threshold is
/// calibrated in that space.
///
/// Only clouds that are spectrally flat in the visible are trusted for
/// UV-divergence inference. A steep or noisy fit returns `None`; absence from
/// the accumulators is the only signal.
pub fn fit_cloud_slope(
    spectrum: &[f32],
    vis: &VisSubsets,
    params: &CloudSlopeParams,
) -> Option<CloudSlopeFit> {
    if vis.fit_indices.len() < 2 {
        return None;
    }

    let xs: Vec<f64> = vis.fit_indices.iter().map(|&i| i as f64).collect();
    let ys: Vec<f64> = vis.fit_indices.iter().map(|&i| spectrum[i] as f64).collect();
    let (slope, intercept) = fit_line(&xs, &ys);

    // Mean absolute relative error of the fit over the fit domain
    let fit_error = xs
        .iter()
        .zip(ys.iter())
        .map(|(&x, &y)| (y / (slope * x + intercept) - 1.0).abs())
        .sum::<f64>()
        / xs.len() as f64;

    if fit_error >= params.uv_err_thresh || slope.abs() >= params.uv_slope_thresh {
        return None;
    }

    let residual = vis
        .eval_indices
        .iter()
        .map(|&i| spectrum[i] as f64 / (slope * i as f64 + intercept))
        .collect();

    Some(CloudSlopeFit {
        slope,
        fit_error,
        residual,
    })
}
