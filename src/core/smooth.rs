use crate::types::{QaError, QaResult};

/// Moving average smoother with mirrored boundaries.
///
/// The input is extended at both ends with the reflected first and last
/// `window_length - 1` samples, convolved with a uniform kernel, and trimmed
/// by `window_length / 2` samples on each side so the output length equals
/// the input length. The edge channels therefore see reflected data rather
/// than a shrunken window.
pub fn smooth(spectrum: &[f32], window_length: usize) -> QaResult<Vec<f32>> {
    let n = spectrum.len();

    if window_length == 0 || window_length % 2 == 0 {
        return Err(QaError::Processing(format!(
            "Smoothing window must be odd, got {}",
            window_length
        )));
    }
    if n < window_length {
        return Err(QaError::Processing(format!(
            "Spectrum length {} is too short for smoothing window {}",
            n, window_length
        )));
    }

    if window_length == 1 {
        return Ok(spectrum.to_vec());
    }

    // Mirror padding: [x[w-1] .. x[1]] ++ x ++ [x[n-1] .. x[n-w+1]]
    let mut padded = Vec::with_capacity(n + 2 * (window_length - 1));
    for i in (1..window_length).rev() {
        padded.push(spectrum[i]);
    }
    padded.extend_from_slice(spectrum);
    for i in 1..window_length {
        padded.push(spectrum[n - i]);
    }

    // "valid" convolution with a uniform 1/w kernel
    let kernel_weight = 1.0 / window_length as f32;
    let valid_len = padded.len() - window_length + 1;
    let mut convolved = Vec::with_capacity(valid_len);
    for i in 0..valid_len {
        let sum: f32 = padded[i..i + window_length].iter().sum();
        convolved.push(sum * kernel_weight);
    }

    // Trim the half-window overhang on each side
    let trim = window_length / 2;
    Ok(convolved[trim..convolved.len() - trim].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_spectrum_is_unchanged() {
        let spectrum = vec![0.5_f32; 20];
        for window in [1, 3, 5, 7] {
            let smoothed = smooth(&spectrum, window).unwrap();
            assert_eq!(smoothed.len(), spectrum.len());
            for v in smoothed {
                assert_relative_eq!(v, 0.5, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_output_length_matches_input() {
        let spectrum: Vec<f32> = (0..50).map(|i| (i as f32).sin()).collect();
        for window in [1, 3, 5, 9] {
            let smoothed = smooth(&spectrum, window).unwrap();
            assert_eq!(smoothed.len(), spectrum.len());
        }
    }

    #[test]
    fn test_interior_is_windowed_mean() {
        let spectrum = vec![1.0, 2.0, 6.0, 2.0, 1.0];
        let smoothed = smooth(&spectrum, 3).unwrap();
        // Away from the boundary, a plain centered average
        assert_relative_eq!(smoothed[1], (1.0 + 2.0 + 6.0) / 3.0, epsilon = 1e-6);
        assert_relative_eq!(smoothed[2], (2.0 + 6.0 + 2.0) / 3.0, epsilon = 1e-6);
        assert_relative_eq!(smoothed[3], (6.0 + 2.0 + 1.0) / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_boundary_uses_reflected_samples() {
        let spectrum = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = smooth(&spectrum, 3).unwrap();
        // Padded front is [x2, x1], so the first output averages (x1, x0, x1)
        // after the half-window trim.
        assert_relative_eq!(smoothed[0], (2.0 + 1.0 + 2.0) / 3.0, epsilon = 1e-6);
        // Padded back is [x4, x3]: last output averages (x4, x4, x3).
        assert_relative_eq!(smoothed[4], (4.0 + 5.0 + 5.0) / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_even_window_rejected() {
        let spectrum = vec![1.0_f32; 10];
        assert!(smooth(&spectrum, 4).is_err());
        assert!(smooth(&spectrum, 0).is_err());
    }

    #[test]
    fn test_short_spectrum_rejected() {
        let spectrum = vec![1.0_f32, 2.0];
        assert!(smooth(&spectrum, 3).is_err());
    }
}
