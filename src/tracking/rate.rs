use super::window::Sample;

/// Spans shorter than this are stretched to it, so two polls a second apart
/// do not extrapolate into an absurd daily figure.
pub const MIN_SPAN_SECS: f64 = 60.0;

const SECS_PER_DAY: f64 = 86_400.0;

/// Estimated earnings per day from the first and last sample of the window.
///
/// `None` until the window holds at least two samples.
pub fn estimate(samples: &[Sample]) -> Option<f64> {
    let (first, last) = match samples {
        [first, .., last] => (first, last),
        _ => return None,
    };

    let span_secs =
        (last.timestamp.saturating_sub(first.timestamp) as f64 / 1000.0).max(MIN_SPAN_SECS);
    let mined_in_span = last.cumulative_mined - first.cumulative_mined;

    Some(mined_in_span / span_secs * SECS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_two_samples() {
        assert_eq!(estimate(&[]), None);
        assert_eq!(estimate(&[Sample::new(0, 5.0)]), None);
    }

    #[test]
    fn test_hour_span() {
        let rate = estimate(&[Sample::new(0, 0.0), Sample::new(3_600_000, 10.0)]).unwrap();
        assert!((rate - 240.0).abs() < 1e-9, "rate was {rate}");
    }

    #[test]
    fn test_uses_endpoints_only() {
        let samples = [
            Sample::new(0, 1.0),
            Sample::new(1_000_000, 500.0),
            Sample::new(3_600_000, 11.0),
        ];
        let rate = estimate(&samples).unwrap();
        assert!((rate - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_span_is_floored() {
        // 1 second apart, treated as 60 seconds
        let rate = estimate(&[Sample::new(0, 0.0), Sample::new(1_000, 1.0)]).unwrap();
        assert!((rate - 1440.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_is_zero() {
        let rate = estimate(&[Sample::new(0, 7.0), Sample::new(600_000, 7.0)]).unwrap();
        assert_eq!(rate, 0.0);
    }
}
