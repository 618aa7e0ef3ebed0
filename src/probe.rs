//! Deterministic probe-set generators.
//!
//! Linear spacing drives append-size checkpoints; logarithmic spacing biases
//! lookup-distance sampling toward recently written positions.

use crate::{BenchError, BenchResult};

/// `n` points evenly spaced between `min` and `max` inclusive, rounded to the
/// nearest integer. Duplicate keys near the low end are legal output when the
/// range is narrower than the point count; the accumulator treats repeats as
/// extra samples for that key.
pub fn linspace(min: u64, max: u64, n: usize) -> BenchResult<Vec<u64>> {
    check_range(min, max, n)?;
    let step = (max - min) as f64 / (n - 1) as f64;
    Ok((0..n)
        .map(|i| (min as f64 + step * i as f64).round() as u64)
        .collect())
}

/// `n` points log-spaced between `min` and `max` inclusive. Requires
/// `min > 0`.
pub fn logspace(min: u64, max: u64, n: usize) -> BenchResult<Vec<u64>> {
    if min == 0 {
        return Err(BenchError::InvalidParameter(
            "logspace requires min > 0".into(),
        ));
    }
    check_range(min, max, n)?;
    let log_min = (min as f64).ln();
    let log_max = (max as f64).ln();
    let step = (log_max - log_min) / (n - 1) as f64;
    Ok((0..n)
        .map(|i| (log_min + step * i as f64).exp().round() as u64)
        .collect())
}

fn check_range(min: u64, max: u64, n: usize) -> BenchResult<()> {
    if n <= 1 {
        return Err(BenchError::InvalidParameter(format!(
            "point count must be greater than 1, got {n}"
        )));
    }
    if max < min {
        return Err(BenchError::InvalidParameter(format!(
            "max ({max}) must be at least min ({min})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_exact_unit_steps() {
        assert_eq!(
            linspace(1, 10, 10).unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]
        );
    }

    #[test]
    fn test_linspace_endpoints_and_monotonicity() {
        let points = linspace(1, 1_000_000, 10).unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(points[0], 1);
        assert_eq!(points[9], 1_000_000);
        assert!(points.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_linspace_tolerates_duplicates_in_narrow_range() {
        let points = linspace(1, 3, 5).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], 1);
        assert_eq!(points[4], 3);
        assert!(points.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_logspace_decades() {
        let points = logspace(1, 1_000_000, 7).unwrap();
        assert_eq!(points[0], 1);
        assert_eq!(points[6], 1_000_000);
        assert!(points.windows(2).all(|w| w[0] < w[1]));
        // Interior points land on (approximate) powers of ten.
        for (i, &p) in points.iter().enumerate() {
            let expected = 10f64.powi(i as i32);
            let ratio = p as f64 / expected;
            assert!(
                (0.99..=1.01).contains(&ratio),
                "point {i} = {p}, expected ~{expected}"
            );
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(
            linspace(1, 10, 1),
            Err(BenchError::InvalidParameter(_))
        ));
        assert!(matches!(
            linspace(10, 1, 5),
            Err(BenchError::InvalidParameter(_))
        ));
        assert!(matches!(
            logspace(0, 10, 5),
            Err(BenchError::InvalidParameter(_))
        ));
        assert!(matches!(
            logspace(1, 10, 0),
            Err(BenchError::InvalidParameter(_))
        ));
    }
}
