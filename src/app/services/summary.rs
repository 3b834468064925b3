//! Small descriptive statistics used by behavioral summaries and outlier bounds

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); `None` for fewer than two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|x| (x - m) * (x - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// `mean + k * sd`, the usual reaction-time outlier bound
pub fn upper_bound(values: &[f64], k: f64) -> Option<f64> {
    sample_std(values).map(|sd| mean(values) + k * sd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_sample_std() {
        let sd = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-9);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn test_upper_bound() {
        assert_eq!(upper_bound(&[1.0, 3.0], 3.0), Some(2.0 + 3.0 * 2f64.sqrt()));
        assert_eq!(upper_bound(&[], 3.0), None);
    }
}
