use crate::core::aggregate::QualitySummary;
use crate::types::QaResult;
use std::io::Write;

/// Percentiles reported for the excess-error distribution
const REPORT_PERCENTILES: [f64; 3] = [50.0, 95.0, 99.9];

/// Minimum number of accepted cloud fits for a slope summary line
const MIN_SLOPE_COUNT: usize = 3;

/// Linear-interpolated percentile of a sorted slice (numpy convention).
/// Any NaN in the input poisons the result, so a single 0/0 ratio shows up
/// in every percentile line rather than hiding in the tail.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    // NaN sorts last under total_cmp
    if sorted[sorted.len() - 1].is_nan() {
        return f64::NAN;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Median of an unsorted slice; the average of the two central order
/// statistics for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        0.5 * (sorted[mid - 1] + sorted[mid])
    }
}

/// Collapse residual curves to one curve via the element-wise median.
fn median_curve(curves: &[Vec<f64>]) -> Vec<f64> {
    let width = curves.first().map_or(0, |c| c.len());
    let mut column = Vec::with_capacity(curves.len());
    (0..width)
        .map(|i| {
            column.clear();
            column.extend(curves.iter().map(|c| c[i]));
            median(&column)
        })
        .collect()
}

fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        format!("{:8.6}", v)
    } else {
        format!("{:>8}", "nan")
    }
}

/// Write the flat text report: three percentile lines, one slope summary
/// line, then one (wavelength, median residual) line per visible channel.
pub fn write_report<W: Write>(summary: &QualitySummary, out: &mut W) -> QaResult<()> {
    let mut errors = summary.error_ratios.clone();
    errors.sort_by(f64::total_cmp);

    for pct in REPORT_PERCENTILES {
        writeln!(out, "{}", fmt_value(percentile(&errors, pct)))?;
    }

    if summary.slopes.len() >= MIN_SLOPE_COUNT {
        writeln!(
            out,
            "{} {}",
            summary.slopes.len(),
            fmt_value(median(&summary.slopes))
        )?;
    } else {
        writeln!(out, "nan")?;
    }

    if !summary.residuals.is_empty() {
        let curve = median_curve(&summary.residuals);
        for (w, r) in summary.eval_wavelengths.iter().zip(curve.iter()) {
            writeln!(out, "{} {}", fmt_value(*w), fmt_value(*r))?;
        }
    } else {
        for w in &summary.eval_wavelengths {
            writeln!(out, "{} nan", fmt_value(*w))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn summary(
        error_ratios: Vec<f64>,
        slopes: Vec<f64>,
        residuals: Vec<Vec<f64>>,
    ) -> QualitySummary {
        QualitySummary {
            error_ratios,
            slopes,
            residuals,
            eval_wavelengths: vec![400.0, 500.0],
        }
    }

    fn report_lines(summary: &QualitySummary) -> Vec<String> {
        let mut buf = Vec::new();
        write_report(summary, &mut buf).unwrap();
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_percentile_interpolates_linearly() {
        let sorted = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&sorted, 50.0), 2.0);
        assert_relative_eq!(percentile(&sorted, 95.0), 3.8);
        assert_relative_eq!(percentile(&sorted, 100.0), 4.0);
        assert_relative_eq!(percentile(&sorted, 0.0), 0.0);
    }

    #[test]
    fn test_percentiles_are_monotonic() {
        let mut values: Vec<f64> = (0..100).map(|i| ((i * 37) % 100) as f64 / 25.0).collect();
        values.sort_by(f64::total_cmp);
        let p50 = percentile(&values, 50.0);
        let p95 = percentile(&values, 95.0);
        let p999 = percentile(&values, 99.9);
        assert!(p50 <= p95 && p95 <= p999);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
    }

    #[test]
    fn test_nan_among_finite_ratios_poisons_all_percentiles() {
        let mut values = vec![0.1, 0.2, 0.3, 0.4, f64::NAN];
        values.sort_by(f64::total_cmp);
        for pct in [50.0, 95.0, 99.9] {
            assert!(percentile(&values, pct).is_nan());
        }

        let lines = report_lines(&summary(
            vec![0.1, 0.2, f64::NAN, 0.3, 0.4],
            vec![],
            vec![],
        ));
        assert_eq!(lines[0], "     nan");
        assert_eq!(lines[1], "     nan");
        assert_eq!(lines[2], "     nan");
    }

    #[test]
    fn test_single_nan_ratio_poisons_all_percentiles() {
        let lines = report_lines(&summary(vec![f64::NAN], vec![], vec![]));
        assert_eq!(lines[0], "     nan");
        assert_eq!(lines[1], "     nan");
        assert_eq!(lines[2], "     nan");
    }

    #[test]
    fn test_slope_line_requires_more_than_two_fits() {
        let lines = report_lines(&summary(vec![0.5], vec![1e-4, 2e-4], vec![]));
        assert_eq!(lines[3], "nan");

        let lines = report_lines(&summary(vec![0.5], vec![1e-4, 2e-4, 3e-4], vec![]));
        assert_eq!(lines[3], "3 0.000200");
    }

    #[test]
    fn test_residual_table_collapses_to_elementwise_median() {
        let residuals = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let lines = report_lines(&summary(vec![0.5], vec![], residuals));
        assert_eq!(lines[4], "400.000000 3.000000");
        assert_eq!(lines[5], "500.000000 4.000000");
    }

    #[test]
    fn test_empty_residuals_emit_nan_rows() {
        let lines = report_lines(&summary(vec![0.5], vec![], vec![]));
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[4], "400.000000 nan");
        assert_eq!(lines[5], "500.000000 nan");
    }

    #[test]
    fn test_percentile_lines_formatted_with_six_decimals() {
        let lines = report_lines(&summary(vec![0.5, 0.5, 0.5], vec![], vec![]));
        assert_eq!(lines[0], "0.500000");
    }
}
