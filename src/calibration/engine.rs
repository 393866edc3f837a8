//! Per-season offset statistics
//!
//! Groups paired (predicted, actual) observations by (cultivar, region,
//! season) and derives one CalibrationRecord per tuple that clears the
//! sample floor. Records are always recomputed from the full season's pairs;
//! there is no incremental merge, which is what makes last-writer-wins
//! persistence safe.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::utils::{mean, min_max, population_stddev};

/// Hard floor on pairs per tuple. Below this no record is emitted at all.
pub const MIN_SAMPLES_PER_TUPLE: usize = 5;

/// Sample count at which the confidence boost saturates.
const BOOST_SATURATION_SAMPLES: f64 = 500.0;
const BOOST_CAP: f64 = 0.1;

/// One paired prediction/measurement observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationPair {
    pub cultivar_id: String,
    pub region_id: String,
    pub season_year: i32,
    pub predicted_brix: f64,
    pub actual_brix: f64,
}

impl ObservationPair {
    /// Offset convention: actual minus predicted, so a positive mean means
    /// the model under-predicts.
    pub fn offset(&self) -> f64 {
        self.actual_brix - self.predicted_brix
    }
}

/// Offset statistics for one (cultivar, region, season) tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub cultivar_id: String,
    pub region_id: String,
    pub season_year: i32,
    pub sample_count: usize,
    pub offset_mean: f64,
    pub offset_stddev: f64,
    pub offset_min: f64,
    pub offset_max: f64,
    /// Confidence boost earned by observation volume, capped at 0.1
    pub confidence_boost: f64,
}

/// Confidence boost for a season's sample count: linear in volume, capped.
pub fn confidence_boost(sample_count: usize) -> f64 {
    (sample_count as f64 / BOOST_SATURATION_SAMPLES).min(BOOST_CAP)
}

/// Compute calibration records for every tuple clearing the sample floor.
///
/// Output is sorted by (cultivar, region, season) so repeated runs over the
/// same pairs produce byte-identical output.
pub fn calibrate(pairs: &[ObservationPair]) -> Vec<CalibrationRecord> {
    let mut by_tuple: FxHashMap<(String, String, i32), Vec<f64>> = FxHashMap::default();

    for pair in pairs {
        by_tuple
            .entry((pair.cultivar_id.clone(), pair.region_id.clone(), pair.season_year))
            .or_default()
            .push(pair.offset());
    }

    let mut records: Vec<CalibrationRecord> = by_tuple
        .into_iter()
        .filter(|(_, offsets)| offsets.len() >= MIN_SAMPLES_PER_TUPLE)
        .map(|((cultivar_id, region_id, season_year), offsets)| {
            let (offset_min, offset_max) = min_max(&offsets);
            CalibrationRecord {
                cultivar_id,
                region_id,
                season_year,
                sample_count: offsets.len(),
                offset_mean: mean(&offsets),
                offset_stddev: population_stddev(&offsets),
                offset_min,
                offset_max,
                confidence_boost: confidence_boost(offsets.len()),
            }
        })
        .collect();

    records.sort_by(|a, b| {
        (&a.cultivar_id, &a.region_id, a.season_year)
            .cmp(&(&b.cultivar_id, &b.region_id, b.season_year))
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair(cultivar: &str, season: i32, predicted: f64, actual: f64) -> ObservationPair {
        ObservationPair {
            cultivar_id: cultivar.to_string(),
            region_id: "indian_river".to_string(),
            season_year: season,
            predicted_brix: predicted,
            actual_brix: actual,
        }
    }

    #[test]
    fn test_perfect_predictions_have_zero_offset_stats() {
        let pairs: Vec<_> = (0..8).map(|_| pair("washington_navel", 2024, 11.8, 11.8)).collect();
        let records = calibrate(&pairs);

        assert_eq!(records.len(), 1);
        assert_relative_eq!(records[0].offset_mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(records[0].offset_stddev, 0.0, epsilon = 1e-12);
        assert_eq!(records[0].sample_count, 8);
    }

    #[test]
    fn test_sample_floor_four_emits_nothing_five_emits_one() {
        let four: Vec<_> = (0..4).map(|i| pair("bing", 2024, 17.0, 17.0 + i as f64 * 0.1)).collect();
        assert!(calibrate(&four).is_empty());

        let five: Vec<_> = (0..5).map(|i| pair("bing", 2024, 17.0, 17.0 + i as f64 * 0.1)).collect();
        let records = calibrate(&five);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sample_count, 5);
    }

    #[test]
    fn test_offset_statistics() {
        // Offsets: +0.5, +0.5, -0.5, -0.5, +1.0 -> mean 0.2
        let pairs = vec![
            pair("washington_navel", 2024, 12.0, 12.5),
            pair("washington_navel", 2024, 12.0, 12.5),
            pair("washington_navel", 2024, 12.0, 11.5),
            pair("washington_navel", 2024, 12.0, 11.5),
            pair("washington_navel", 2024, 12.0, 13.0),
        ];
        let records = calibrate(&pairs);
        let record = &records[0];

        assert_relative_eq!(record.offset_mean, 0.2, epsilon = 1e-12);
        assert_relative_eq!(record.offset_min, -0.5, epsilon = 1e-12);
        assert_relative_eq!(record.offset_max, 1.0, epsilon = 1e-12);
        // Population stddev of [0.5, 0.5, -0.5, -0.5, 1.0]
        let expected = (((0.3f64).powi(2) * 2.0 + (0.7f64).powi(2) * 2.0 + (0.8f64).powi(2)) / 5.0).sqrt();
        assert_relative_eq!(record.offset_stddev, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_tuples_are_independent() {
        let mut pairs: Vec<_> = (0..6).map(|_| pair("washington_navel", 2024, 12.0, 12.4)).collect();
        pairs.extend((0..6).map(|_| pair("washington_navel", 2023, 12.0, 11.7)));
        pairs.extend((0..3).map(|_| pair("bing", 2024, 17.0, 17.5))); // below floor

        let records = calibrate(&pairs);
        assert_eq!(records.len(), 2);
        // Sorted output: seasons in order
        assert_eq!(records[0].season_year, 2023);
        assert_eq!(records[1].season_year, 2024);
        assert_relative_eq!(records[0].offset_mean, -0.3, epsilon = 1e-12);
        assert_relative_eq!(records[1].offset_mean, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_confidence_boost_scales_and_caps() {
        assert_relative_eq!(confidence_boost(5), 0.01, epsilon = 1e-12);
        assert_relative_eq!(confidence_boost(25), 0.05, epsilon = 1e-12);
        assert_relative_eq!(confidence_boost(50), 0.1, epsilon = 1e-12);
        // Saturates: more data never exceeds the cap
        assert_relative_eq!(confidence_boost(10_000), 0.1, epsilon = 1e-12);
    }
}
