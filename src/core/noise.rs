use crate::core::wavelength::BandWindows;

/// Root-mean-square of (spectrum - smoothed) over a half-open channel interval.
fn interval_rms(spectrum: &[f32], smoothed: &[f32], interval: (usize, usize)) -> f32 {
    let (start, end) = interval;
    if end <= start {
        return f32::NAN;
    }
    let mut sum_sq = 0.0f32;
    for i in start..end {
        let diff = spectrum[i] - smoothed[i];
        sum_sq += diff * diff;
    }
    (sum_sq / (end - start) as f32).sqrt()
}

/// Excess error ratio: divergence from the locally smoothed spectrum inside
/// the water-absorption test intervals, normalized by the divergence inside
/// the clean reference intervals.
///
/// The better (smaller) of the two water intervals and the better of the two
/// reference intervals are used, so a single corrupted interval cannot bias
/// the whole-image statistic. A zero reference RMS yields a non-finite ratio;
/// that value is deliberately returned as-is.
pub fn excess_error_ratio(spectrum: &[f32], smoothed: &[f32], windows: &BandWindows) -> f32 {
    let err_a = interval_rms(spectrum, smoothed, windows.water_a);
    let err_b = interval_rms(spectrum, smoothed, windows.water_b);
    let ref_a = interval_rms(spectrum, smoothed, windows.ref_a);
    let ref_b = interval_rms(spectrum, smoothed, windows.ref_b);

    err_a.min(err_b) / ref_a.min(ref_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn windows() -> BandWindows {
        BandWindows {
            water_a: (0, 4),
            water_b: (4, 8),
            ref_a: (8, 12),
            ref_b: (12, 16),
        }
    }

    #[test]
    fn test_identical_spectra_give_non_finite_ratio() {
        let spectrum = vec![0.5_f32; 16];
        let ratio = excess_error_ratio(&spectrum, &spectrum, &windows());
        // 0/0: preserved for the caller, never silently dropped
        assert!(!ratio.is_finite());
    }

    #[test]
    fn test_zero_reference_rms_gives_infinite_ratio() {
        let smoothed = vec![0.5_f32; 16];
        let mut spectrum = smoothed.clone();
        // Divergence only inside the water intervals
        spectrum[1] += 0.1;
        spectrum[5] += 0.1;
        let ratio = excess_error_ratio(&spectrum, &smoothed, &windows());
        assert!(ratio.is_infinite());
    }

    #[test]
    fn test_uses_better_of_each_interval_pair() {
        let smoothed = vec![0.5_f32; 16];
        let mut spectrum = smoothed.clone();
        // water A diverges heavily, water B mildly
        for i in 0..4 {
            spectrum[i] += 0.4;
        }
        for i in 4..8 {
            spectrum[i] += 0.02;
        }
        // reference A mild, reference B heavy
        for i in 8..12 {
            spectrum[i] += 0.01;
        }
        for i in 12..16 {
            spectrum[i] += 0.3;
        }
        let ratio = excess_error_ratio(&spectrum, &smoothed, &windows());
        // min(water) = 0.02, min(reference) = 0.01
        assert_relative_eq!(ratio, 2.0, epsilon = 1e-5);
    }
}
