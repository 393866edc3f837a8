//! Aggregate accuracy diagnostics
//!
//! Pure functions over a paired results array: MAE, RMSE, R² against the
//! actual-value mean, and fixed absolute-error accuracy bands. Used to
//! monitor model performance and spot regions/cultivars needing more data.

use serde::{Deserialize, Serialize};

use crate::calibration::engine::ObservationPair;
use crate::utils::mean;

/// Absolute-error thresholds (Brix) for the accuracy bands.
pub const ACCURACY_BANDS: [f64; 4] = [0.5, 1.0, 1.5, 2.0];

/// Aggregate accuracy over a set of paired observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub sample_count: usize,
    /// Mean absolute error (Brix)
    pub mae: f64,
    /// Root mean squared error (Brix)
    pub rmse: f64,
    /// Coefficient of determination against the actual-value mean
    pub r_squared: f64,
    /// Counts of predictions within +/-0.5, 1.0, 1.5, 2.0 Brix
    pub within_bands: [usize; 4],
}

impl AccuracyReport {
    fn empty() -> Self {
        AccuracyReport {
            sample_count: 0,
            mae: 0.0,
            rmse: 0.0,
            r_squared: 0.0,
            within_bands: [0; 4],
        }
    }

    /// Share of predictions inside a band, as a percentage.
    pub fn band_pct(&self, band_index: usize) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        self.within_bands[band_index] as f64 / self.sample_count as f64 * 100.0
    }
}

/// Compute the aggregate diagnostics for a results array.
///
/// Degenerate inputs stay finite: an empty array reports zeros, and a
/// constant actual series (SStot = 0) reports R² = 1 when the predictions
/// are exact and 0 otherwise.
pub fn accuracy_report(pairs: &[ObservationPair]) -> AccuracyReport {
    if pairs.is_empty() {
        return AccuracyReport::empty();
    }

    let errors: Vec<f64> = pairs.iter().map(|p| p.actual_brix - p.predicted_brix).collect();
    let abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();

    let mae = mean(&abs_errors);
    let rmse = mean(&errors.iter().map(|e| e * e).collect::<Vec<_>>()).sqrt();

    let actual_mean = mean(&pairs.iter().map(|p| p.actual_brix).collect::<Vec<_>>());
    let ss_res: f64 = errors.iter().map(|e| e * e).sum();
    let ss_tot: f64 = pairs.iter().map(|p| (p.actual_brix - actual_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    let mut within_bands = [0usize; 4];
    for err in &abs_errors {
        for (i, band) in ACCURACY_BANDS.iter().enumerate() {
            if *err <= *band {
                within_bands[i] += 1;
            }
        }
    }

    AccuracyReport {
        sample_count: pairs.len(),
        mae,
        rmse,
        r_squared,
        within_bands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair(predicted: f64, actual: f64) -> ObservationPair {
        ObservationPair {
            cultivar_id: "washington_navel".to_string(),
            region_id: "indian_river".to_string(),
            season_year: 2024,
            predicted_brix: predicted,
            actual_brix: actual,
        }
    }

    #[test]
    fn test_exact_predictions() {
        let pairs = vec![pair(11.0, 11.0), pair(12.0, 12.0), pair(13.0, 13.0)];
        let report = accuracy_report(&pairs);
        assert_relative_eq!(report.mae, 0.0, epsilon = 1e-12);
        assert_relative_eq!(report.rmse, 0.0, epsilon = 1e-12);
        assert_relative_eq!(report.r_squared, 1.0, epsilon = 1e-12);
        assert_eq!(report.within_bands, [3, 3, 3, 3]);
    }

    #[test]
    fn test_mae_and_rmse() {
        // Errors: +1, -1, +2 -> MAE = 4/3, RMSE = sqrt(6/3)
        let pairs = vec![pair(10.0, 11.0), pair(12.0, 11.0), pair(10.0, 12.0)];
        let report = accuracy_report(&pairs);
        assert_relative_eq!(report.mae, 4.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(report.rmse, (2.0_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_accuracy_bands_are_cumulative() {
        // |errors|: 0.3, 0.8, 1.2, 1.9, 2.5
        let pairs = vec![
            pair(10.0, 10.3),
            pair(10.0, 10.8),
            pair(10.0, 11.2),
            pair(10.0, 11.9),
            pair(10.0, 12.5),
        ];
        let report = accuracy_report(&pairs);
        assert_eq!(report.within_bands, [1, 2, 3, 4]);
        assert_relative_eq!(report.band_pct(0), 20.0, epsilon = 1e-9);
        assert_relative_eq!(report.band_pct(3), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_r_squared_against_actual_mean() {
        // Actuals 10, 12, 14 (mean 12); predictions 11, 12, 13
        // SSres = 1 + 0 + 1 = 2; SStot = 4 + 0 + 4 = 8; R² = 0.75
        let pairs = vec![pair(11.0, 10.0), pair(12.0, 12.0), pair(13.0, 14.0)];
        let report = accuracy_report(&pairs);
        assert_relative_eq!(report.r_squared, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        assert_eq!(accuracy_report(&[]).sample_count, 0);

        // Constant actuals, imperfect predictions: R² pinned to 0, not NaN
        let pairs = vec![pair(11.0, 12.0), pair(13.0, 12.0)];
        let report = accuracy_report(&pairs);
        assert_eq!(report.r_squared, 0.0);
        assert!(report.rmse.is_finite());

        // Constant actuals, exact predictions: R² = 1
        let pairs = vec![pair(12.0, 12.0), pair(12.0, 12.0)];
        assert_relative_eq!(accuracy_report(&pairs).r_squared, 1.0, epsilon = 1e-12);
    }
}
