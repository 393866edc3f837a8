//! Harvest Window Predictor
//!
//! Projects the phenology GDD thresholds onto calendar dates given an average
//! daily accumulation rate, and classifies the current position in the season
//! with a pure state machine. The evaluation date is always an explicit
//! parameter; nothing here reads the system clock, so the same inputs always
//! produce the same window.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::phenology::CropPhenologyProfile;

/// Days ahead of window open at which `Approaching` begins.
const APPROACHING_DAYS: i64 = 30;

/// Fraction trimmed off each end of the full window to get the optimal band.
const OPTIMAL_TRIM: f64 = 0.25;

/// Forecast horizon (days) at which confidence bottoms out at the floor.
const HORIZON_FULL_DECAY_DAYS: f64 = 365.0;
const HORIZON_CONFIDENCE_CEIL: f64 = 0.9;
const HORIZON_CONFIDENCE_FLOOR: f64 = 0.5;

/// Where the crop sits in its season on a given date.
///
/// Recomputed idempotently from the boundary dates on every call; never
/// stored or transitioned incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStatus {
    /// More than 30 days before the window opens
    PreSeason,
    /// Within 30 days of the window opening
    Approaching,
    /// Window open, before the optimal band
    InSeason,
    /// Inside the optimal (center) band
    AtPeak,
    /// Past the optimal band, window still open
    PastPeak,
    /// Window closed
    Ended,
}

/// A predicted harvest window for one crop/region/season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestWindow {
    pub crop_id: String,
    pub region_id: String,
    /// Date the projection was made from
    pub evaluated_on: NaiveDate,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub optimal_start: NaiveDate,
    pub optimal_end: NaiveDate,
    pub peak_date: NaiveDate,
    pub gdd_at_window_start: f64,
    pub gdd_at_peak: f64,
    pub gdd_at_window_end: f64,
    /// Days from evaluation to maturity; negative once maturity has passed
    pub days_to_maturity: f64,
    pub days_to_peak: f64,
    pub status: HarvestStatus,
    pub confidence: f64,
}

impl HarvestWindow {
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        date >= self.window_start && date <= self.window_end
    }
}

/// Signed days until a GDD target is reached at the given accumulation rate.
/// Negative means the target is already behind us.
pub fn days_to_target(target_gdd: f64, current_gdd: f64, avg_daily_rate: f64) -> f64 {
    if avg_daily_rate <= 0.0 {
        return f64::INFINITY;
    }
    (target_gdd - current_gdd) / avg_daily_rate
}

/// Classify a date against the four derived boundary dates.
pub fn status_on(
    today: NaiveDate,
    window_start: NaiveDate,
    optimal_start: NaiveDate,
    optimal_end: NaiveDate,
    window_end: NaiveDate,
) -> HarvestStatus {
    if today < window_start {
        let lead = window_start.signed_duration_since(today).num_days();
        if lead > APPROACHING_DAYS {
            HarvestStatus::PreSeason
        } else {
            HarvestStatus::Approaching
        }
    } else if today > window_end {
        HarvestStatus::Ended
    } else if today < optimal_start {
        HarvestStatus::InSeason
    } else if today <= optimal_end {
        HarvestStatus::AtPeak
    } else {
        HarvestStatus::PastPeak
    }
}

/// Linear confidence decay with forecast horizon, floored.
///
/// A projection for tomorrow is trusted near the ceiling; one a year out sits
/// at the floor. Combined (by minimum) with the accumulation's own confidence.
fn horizon_confidence(days_ahead: f64) -> f64 {
    let horizon = days_ahead.max(0.0).min(HORIZON_FULL_DECAY_DAYS);
    let decayed = HORIZON_CONFIDENCE_CEIL
        - (HORIZON_CONFIDENCE_CEIL - HORIZON_CONFIDENCE_FLOOR) * horizon / HORIZON_FULL_DECAY_DAYS;
    decayed.max(HORIZON_CONFIDENCE_FLOOR)
}

/// Project the harvest window from current accumulation state.
///
/// `accumulation_confidence` is the confidence of the GDD figure itself
/// (1.0 for fully observed weather); the window confidence is the minimum of
/// that and the horizon decay.
pub fn predict_window(
    profile: &CropPhenologyProfile,
    region_id: &str,
    current_gdd: f64,
    avg_daily_rate: f64,
    today: NaiveDate,
    accumulation_confidence: f64,
) -> HarvestWindow {
    let gdd_window_end = profile.gdd_to_maturity + profile.gdd_window;
    let gdd_optimal_start = profile.gdd_to_maturity + OPTIMAL_TRIM * profile.gdd_window;
    let gdd_optimal_end = gdd_window_end - OPTIMAL_TRIM * profile.gdd_window;

    let days_to_maturity = days_to_target(profile.gdd_to_maturity, current_gdd, avg_daily_rate);
    let days_to_peak = days_to_target(profile.gdd_to_peak, current_gdd, avg_daily_rate);
    let days_to_optimal_start = days_to_target(gdd_optimal_start, current_gdd, avg_daily_rate);
    let days_to_optimal_end = days_to_target(gdd_optimal_end, current_gdd, avg_daily_rate);
    let days_to_window_end = days_to_target(gdd_window_end, current_gdd, avg_daily_rate);

    // Projections beyond any real season are pinned rather than overflowing
    // the calendar (a zero rate makes every target infinitely far away).
    let project = |days: f64| today + Duration::days(days.round().clamp(-10_000.0, 10_000.0) as i64);

    let window_start = project(days_to_maturity);
    let optimal_start = project(days_to_optimal_start);
    let optimal_end = project(days_to_optimal_end);
    let window_end = project(days_to_window_end);
    let peak_date = project(days_to_peak);

    let status = status_on(today, window_start, optimal_start, optimal_end, window_end);
    let confidence = horizon_confidence(days_to_maturity).min(accumulation_confidence);

    HarvestWindow {
        crop_id: profile.crop_id.clone(),
        region_id: region_id.to_string(),
        evaluated_on: today,
        window_start,
        window_end,
        optimal_start,
        optimal_end,
        peak_date,
        gdd_at_window_start: profile.gdd_to_maturity,
        gdd_at_peak: profile.gdd_to_peak,
        gdd_at_window_end: gdd_window_end,
        days_to_maturity,
        days_to_peak,
        status,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phenology::PhenologyRegistry;
    use approx::assert_relative_eq;
    use chrono::Datelike;

    fn navel_profile() -> CropPhenologyProfile {
        PhenologyRegistry::curated()
            .profile("navel_orange", "indian_river")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_days_to_target_signs() {
        assert_relative_eq!(days_to_target(5100.0, 0.0, 22.0), 231.8, epsilon = 0.05);
        // Past the target: negative
        assert!(days_to_target(5100.0, 6000.0, 22.0) < 0.0);
        // No accumulation: unreachable, not a panic
        assert_eq!(days_to_target(5100.0, 0.0, 0.0), f64::INFINITY);
    }

    #[test]
    fn test_navel_projection_from_bloom() {
        // From bloom (0 GDD) at 22 GDD/day: maturity ~232 days, peak ~277,
        // window close ~391 days out
        let profile = navel_profile();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = predict_window(&profile, "indian_river", 0.0, 22.0, bloom, 1.0);

        assert_relative_eq!(window.days_to_maturity, 231.8, epsilon = 0.05);
        assert_relative_eq!(window.days_to_peak, 277.3, epsilon = 0.05);

        assert_eq!(window.window_start, bloom + Duration::days(232));
        assert_eq!(window.peak_date, bloom + Duration::days(277));
        assert_eq!(window.window_end, bloom + Duration::days(391));

        // Consistent with the known Oct-May availability window
        assert_eq!(window.window_start.month(), 11);
        assert_eq!(window.window_end.month(), 4);
        assert_eq!(window.status, HarvestStatus::PreSeason);
    }

    #[test]
    fn test_optimal_band_trims_quarter_each_end() {
        let profile = navel_profile();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = predict_window(&profile, "indian_river", 0.0, 22.0, bloom, 1.0);

        // gdd window is 3500: optimal runs [maturity+875, maturity+2625]
        let optimal_days = window
            .optimal_end
            .signed_duration_since(window.optimal_start)
            .num_days() as f64;
        let full_days = window
            .window_end
            .signed_duration_since(window.window_start)
            .num_days() as f64;
        assert_relative_eq!(optimal_days / full_days, 0.5, epsilon = 0.02);
    }

    #[test]
    fn test_status_machine_walks_all_states() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let opt_start = NaiveDate::from_ymd_opt(2024, 12, 10).unwrap();
        let opt_end = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();

        let at = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

        assert_eq!(status_on(at(2024, 8, 1), start, opt_start, opt_end, end), HarvestStatus::PreSeason);
        assert_eq!(status_on(at(2024, 10, 15), start, opt_start, opt_end, end), HarvestStatus::Approaching);
        assert_eq!(status_on(at(2024, 11, 20), start, opt_start, opt_end, end), HarvestStatus::InSeason);
        assert_eq!(status_on(at(2025, 1, 10), start, opt_start, opt_end, end), HarvestStatus::AtPeak);
        assert_eq!(status_on(at(2025, 3, 15), start, opt_start, opt_end, end), HarvestStatus::PastPeak);
        assert_eq!(status_on(at(2025, 5, 1), start, opt_start, opt_end, end), HarvestStatus::Ended);
    }

    #[test]
    fn test_status_boundaries_are_inclusive() {
        let at = |y: i32, m: u32, d: u32| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let start = at(2024, 11, 1);
        let opt_start = at(2024, 12, 10);
        let opt_end = at(2025, 2, 20);
        let end = at(2025, 4, 10);

        // Window open on its first and last day
        assert_eq!(status_on(start, start, opt_start, opt_end, end), HarvestStatus::InSeason);
        assert_eq!(status_on(end, start, opt_start, opt_end, end), HarvestStatus::PastPeak);
        // Optimal band inclusive on both ends
        assert_eq!(status_on(opt_start, start, opt_start, opt_end, end), HarvestStatus::AtPeak);
        assert_eq!(status_on(opt_end, start, opt_start, opt_end, end), HarvestStatus::AtPeak);
        // Exactly 30 days out is Approaching, 31 is PreSeason
        assert_eq!(status_on(at(2024, 10, 2), start, opt_start, opt_end, end), HarvestStatus::Approaching);
        assert_eq!(status_on(at(2024, 10, 1), start, opt_start, opt_end, end), HarvestStatus::PreSeason);
    }

    #[test]
    fn test_status_is_recomputed_idempotently() {
        let profile = navel_profile();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let first = predict_window(&profile, "indian_river", 5500.0, 22.0, bloom, 1.0);
        let second = predict_window(&profile, "indian_river", 5500.0, 22.0, bloom, 1.0);
        assert_eq!(first.status, second.status);
        assert_eq!(first.window_start, second.window_start);
    }

    #[test]
    fn test_confidence_decays_with_horizon_and_floors() {
        let profile = navel_profile();
        let bloom = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        // Long horizon (232 days out) sits below a short one
        let far = predict_window(&profile, "indian_river", 0.0, 22.0, bloom, 1.0);
        let near = predict_window(&profile, "indian_river", 5000.0, 22.0, bloom, 1.0);
        assert!(far.confidence < near.confidence);
        assert!(far.confidence >= 0.5);

        // Accumulation uncertainty caps the window confidence
        let shaky = predict_window(&profile, "indian_river", 5000.0, 22.0, bloom, 0.55);
        assert_relative_eq!(shaky.confidence, 0.55, epsilon = 1e-12);
    }
}
