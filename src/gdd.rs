//! GDD Accumulator
//!
//! Converts daily temperature extremes into cumulative heat units from bloom.
//! Where observed weather is missing, days are filled from the region's
//! monthly climatology and the result carries a confidence penalty instead of
//! failing.

use chrono::{Datelike, Duration, NaiveDate};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::phenology::{CropPhenologyProfile, GrowingRegion};

/// Hard ceiling on how long a single crop cycle is tracked (Valencia oranges
/// hang ~15 months; nothing legitimate runs longer).
pub const MAX_SEASON_DAYS: i64 = 550;

/// Floor applied to accumulation confidence no matter how much weather is missing.
const CONFIDENCE_FLOOR: f64 = 0.5;

/// Penalty weight for climatology-filled days: a fully estimated season
/// bottoms out at the floor, a fully observed one stays at 1.0.
const MISSING_DAY_PENALTY: f64 = 0.5;

/// One day of observed temperature extremes (degrees F).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DailyTemps {
    pub date: NaiveDate,
    pub tmax_f: f64,
    pub tmin_f: f64,
}

/// Where the accumulated heat units came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GddSource {
    /// Every day backed by an observation
    Observed,
    /// Every day estimated from regional monthly rates
    Climatology,
    /// Observed with climatology filling gaps
    Mixed,
}

/// Cumulative GDD from bloom through the evaluation date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GddAccumulation {
    pub cumulative_gdd: f64,
    pub days_elapsed: u32,
    pub days_estimated: u32,
    pub avg_daily_gdd: f64,
    pub source: GddSource,
    /// 1.0 for fully observed seasons, penalized toward the floor as
    /// climatology fills in
    pub confidence: f64,
}

/// Heat units for a single day.
///
/// The daily mean is clamped into [base, cap] before subtracting the base:
/// days above the cap contribute exactly as much as a day at the cap (a
/// physiological plateau), never zero, and days below the base contribute
/// nothing.
pub fn daily_gdd(tmax_f: f64, tmin_f: f64, base_temp: f64, max_temp: Option<f64>) -> f64 {
    let mean = (tmax_f + tmin_f) / 2.0;
    let capped = match max_temp {
        Some(cap) => mean.clamp(base_temp, cap),
        None => mean.max(base_temp),
    };
    (capped - base_temp).max(0.0)
}

/// Accumulate GDD from bloom through `today`, filling unobserved days from the
/// region's monthly climatology.
///
/// A bloom date in the future yields a zero accumulation at full confidence
/// (there is simply nothing to accumulate yet).
pub fn accumulate(
    profile: &CropPhenologyProfile,
    region: &GrowingRegion,
    bloom_date: NaiveDate,
    today: NaiveDate,
    observations: &[DailyTemps],
) -> GddAccumulation {
    if today < bloom_date {
        return GddAccumulation {
            cumulative_gdd: 0.0,
            days_elapsed: 0,
            days_estimated: 0,
            avg_daily_gdd: region.daily_rate_for_month(bloom_date.month()),
            source: GddSource::Climatology,
            confidence: 1.0,
        };
    }

    let by_date: FxHashMap<NaiveDate, &DailyTemps> =
        observations.iter().map(|o| (o.date, o)).collect();

    let span_days = today
        .signed_duration_since(bloom_date)
        .num_days()
        .min(MAX_SEASON_DAYS);

    let mut cumulative = 0.0;
    let mut estimated = 0u32;

    for offset in 0..span_days {
        let date = bloom_date + Duration::days(offset);
        match by_date.get(&date) {
            Some(obs) => {
                cumulative += daily_gdd(obs.tmax_f, obs.tmin_f, profile.base_temp, profile.max_temp);
            }
            None => {
                cumulative += region.daily_rate_for_month(date.month());
                estimated += 1;
            }
        }
    }

    let days = span_days.max(0) as u32;
    let source = match (estimated, days) {
        (0, _) => GddSource::Observed,
        (e, d) if e == d => GddSource::Climatology,
        _ => GddSource::Mixed,
    };
    let missing_frac = if days > 0 { estimated as f64 / days as f64 } else { 0.0 };
    let confidence = (1.0 - MISSING_DAY_PENALTY * missing_frac).max(CONFIDENCE_FLOOR);

    GddAccumulation {
        cumulative_gdd: cumulative,
        days_elapsed: days,
        days_estimated: estimated,
        avg_daily_gdd: if days > 0 { cumulative / days as f64 } else { 0.0 },
        source,
        confidence,
    }
}

/// Climatology-only accumulation for when no weather feed exists at all.
pub fn estimate_accumulation(
    profile: &CropPhenologyProfile,
    region: &GrowingRegion,
    bloom_date: NaiveDate,
    today: NaiveDate,
) -> GddAccumulation {
    accumulate(profile, region, bloom_date, today, &[])
}

/// Walk the regional climatology forward from bloom to the date a GDD target
/// is projected to be reached. None if the target is out of reach inside the
/// season ceiling (e.g. a cold region that never accumulates enough heat).
pub fn project_date_of_gdd(
    region: &GrowingRegion,
    bloom_date: NaiveDate,
    target_gdd: f64,
) -> Option<NaiveDate> {
    let mut cumulative = 0.0;
    let mut date = bloom_date;

    for _ in 0..MAX_SEASON_DAYS {
        if cumulative >= target_gdd {
            return Some(date);
        }
        cumulative += region.daily_rate_for_month(date.month());
        date = date + Duration::days(1);
    }

    if cumulative >= target_gdd {
        Some(date)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phenology::PhenologyRegistry;
    use approx::assert_relative_eq;

    fn citrus_fixture() -> (CropPhenologyProfile, GrowingRegion) {
        let registry = PhenologyRegistry::curated();
        let profile = registry.profile("navel_orange", "indian_river").unwrap().clone();
        let region = registry.region("indian_river").unwrap().clone();
        (profile, region)
    }

    #[test]
    fn test_daily_gdd_basic() {
        // Mean 70F against base 55 = 15 heat units
        assert_relative_eq!(daily_gdd(80.0, 60.0, 55.0, None), 15.0, epsilon = 1e-12);
        // Mean below base accrues nothing
        assert_relative_eq!(daily_gdd(50.0, 40.0, 55.0, None), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_daily_gdd_cap_is_a_plateau_not_a_cutoff() {
        // Mean 95F with cap 86: contributes exactly what a day at 86 would
        let scorching = daily_gdd(105.0, 85.0, 50.0, Some(86.0));
        let at_cap = daily_gdd(86.0, 86.0, 50.0, Some(86.0));
        assert_relative_eq!(scorching, at_cap, epsilon = 1e-12);
        assert_relative_eq!(scorching, 36.0, epsilon = 1e-12);
        assert!(scorching > 0.0);
    }

    #[test]
    fn test_fully_observed_accumulation() {
        let (profile, region) = citrus_fixture();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let today = bloom + Duration::days(10);

        let obs: Vec<DailyTemps> = (0..10)
            .map(|i| DailyTemps {
                date: bloom + Duration::days(i),
                tmax_f: 85.0,
                tmin_f: 65.0,
            })
            .collect();

        let acc = accumulate(&profile, &region, bloom, today, &obs);
        // 10 days at mean 75F over base 55 = 200 GDD
        assert_relative_eq!(acc.cumulative_gdd, 200.0, epsilon = 1e-9);
        assert_eq!(acc.source, GddSource::Observed);
        assert_relative_eq!(acc.confidence, 1.0, epsilon = 1e-12);
        assert_eq!(acc.days_estimated, 0);
    }

    #[test]
    fn test_missing_days_fall_back_with_penalty() {
        let (profile, region) = citrus_fixture();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let today = bloom + Duration::days(10);

        // Only the first 5 days observed
        let obs: Vec<DailyTemps> = (0..5)
            .map(|i| DailyTemps {
                date: bloom + Duration::days(i),
                tmax_f: 85.0,
                tmin_f: 65.0,
            })
            .collect();

        let acc = accumulate(&profile, &region, bloom, today, &obs);
        assert_eq!(acc.source, GddSource::Mixed);
        assert_eq!(acc.days_estimated, 5);
        assert!(acc.confidence < 1.0, "gap-filled accumulation must be penalized");
        assert!(acc.confidence >= 0.5);
        assert!(acc.cumulative_gdd > 100.0);
    }

    #[test]
    fn test_no_observations_is_climatology_never_a_failure() {
        let (profile, region) = citrus_fixture();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let today = bloom + Duration::days(100);

        let acc = accumulate(&profile, &region, bloom, today, &[]);
        assert_eq!(acc.source, GddSource::Climatology);
        assert_relative_eq!(acc.confidence, 0.5, epsilon = 1e-12);
        assert!(acc.cumulative_gdd > 0.0);
    }

    #[test]
    fn test_pre_bloom_is_zero() {
        let (profile, region) = citrus_fixture();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let before = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let acc = accumulate(&profile, &region, bloom, before, &[]);
        assert_eq!(acc.cumulative_gdd, 0.0);
        assert_eq!(acc.days_elapsed, 0);
    }

    #[test]
    fn test_project_date_reaches_citrus_maturity_in_fall() {
        let (profile, region) = citrus_fixture();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let maturity = project_date_of_gdd(&region, bloom, profile.gdd_to_maturity).unwrap();
        // ~5100 GDD at Florida rates lands in late autumn
        assert!(maturity > NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert!(maturity < NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_project_date_unreachable_target() {
        let (_, region) = citrus_fixture();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(project_date_of_gdd(&region, bloom, 1_000_000.0).is_none());
    }
}
