//! Offset Statistics Utilities
//!
//! Small numeric helpers shared by the calibration engine and the batch
//! calibration binary. All functions are pure and operate on plain slices.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N, not N-1).
///
/// Calibration offsets describe the full season's paired set, not a sample
/// drawn from it, so the population form is the correct one.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Minimum and maximum of a slice. Returns (0.0, 0.0) for an empty slice.
pub fn min_max(values: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    if values.is_empty() {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}
