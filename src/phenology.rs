//! Phenology Registry
//!
//! Per-crop/region thermal constants: base and cap temperatures, typical bloom
//! dates, and the GDD thresholds that anchor every downstream prediction.
//! Profiles are immutable reference data, curated against farm ground truth,
//! and consumed read-only by the accumulator and window predictor.

use chrono::{Datelike, NaiveDate};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Thermal-time profile for one crop in one growing region.
///
/// Thresholds are cumulative GDD from bloom:
/// - `gdd_to_maturity`: harvest-ready (legal maturity)
/// - `gdd_to_peak`: peak internal quality
/// - `gdd_window`: GDD span over which quality holds after maturity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropPhenologyProfile {
    pub crop_id: String,
    pub region: String,
    /// Base temperature (F) below which no heat units accumulate
    pub base_temp: f64,
    /// Upper developmental threshold (F). Days above it accrue as if at the cap.
    pub max_temp: Option<f64>,
    pub bloom_month: u32,
    pub bloom_day: u32,
    pub gdd_to_maturity: f64,
    pub gdd_to_peak: f64,
    pub gdd_window: f64,
    /// Winter chill requirement (hours below 45F), where the crop has one
    pub chill_hours_required: Option<f64>,
}

impl CropPhenologyProfile {
    /// Validate the threshold ordering invariant:
    /// `gdd_to_maturity < gdd_to_peak < gdd_to_maturity + gdd_window`.
    pub fn validate(&self) -> Result<(), EngineError> {
        let ordered = self.gdd_to_maturity < self.gdd_to_peak
            && self.gdd_to_peak < self.gdd_to_maturity + self.gdd_window;
        if !ordered || self.gdd_to_maturity < 0.0 {
            return Err(EngineError::InvalidThresholds {
                crop: self.crop_id.clone(),
                maturity: self.gdd_to_maturity,
                peak: self.gdd_to_peak,
                window: self.gdd_window,
            });
        }
        Ok(())
    }

    /// Bloom date for a given calendar year. None for impossible month/day
    /// combinations (bad curation rather than a runtime condition).
    pub fn bloom_date(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.bloom_month, self.bloom_day)
    }

    /// Season year a dated observation belongs to.
    ///
    /// Long-window crops (citrus) harvest across the calendar boundary, so a
    /// January measurement belongs to the previous year's bloom.
    pub fn season_for(&self, date: NaiveDate) -> i32 {
        if (date.month(), date.day()) >= (self.bloom_month, self.bloom_day) {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// Whether a region's winter satisfies this crop's chill requirement.
    /// None when either side is uncurated.
    pub fn chill_satisfied(&self, region: &GrowingRegion) -> Option<bool> {
        let required = self.chill_hours_required?;
        let available = region.chill_hours?;
        Some(available >= required)
    }
}

/// A growing region with its climatology.
///
/// `monthly_gdd_rates` is the average daily GDD for each calendar month
/// (index 0 = January), used when observed weather is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowingRegion {
    pub id: String,
    pub name: String,
    pub state: String,
    pub monthly_gdd_rates: [f64; 12],
    pub chill_hours: Option<f64>,
    /// Average last spring frost, day of year
    pub last_frost_doy: Option<u32>,
    /// Average first fall frost, day of year
    pub first_frost_doy: Option<u32>,
}

impl GrowingRegion {
    /// Average daily GDD for a calendar month (1-12).
    pub fn daily_rate_for_month(&self, month: u32) -> f64 {
        let idx = (month.clamp(1, 12) - 1) as usize;
        self.monthly_gdd_rates[idx]
    }

    /// Annualized average daily GDD across all twelve months.
    pub fn avg_daily_rate(&self) -> f64 {
        self.monthly_gdd_rates.iter().sum::<f64>() / 12.0
    }
}

/// Registry of phenology profiles and growing regions.
///
/// Keys are (crop_id, region_id); lookups for absent keys are caller contract
/// violations and surface as errors rather than defaults.
pub struct PhenologyRegistry {
    profiles: FxHashMap<(String, String), CropPhenologyProfile>,
    regions: FxHashMap<String, GrowingRegion>,
}

impl PhenologyRegistry {
    pub fn new() -> Self {
        PhenologyRegistry {
            profiles: FxHashMap::default(),
            regions: FxHashMap::default(),
        }
    }

    /// Registry seeded with the curated crop/region set.
    pub fn curated() -> Self {
        let mut registry = Self::new();
        for region in curated_regions() {
            registry.insert_region(region);
        }
        for profile in curated_profiles() {
            // Curated rows satisfy the ordering invariant by construction
            registry.insert_profile(profile);
        }
        registry
    }

    pub fn insert_profile(&mut self, profile: CropPhenologyProfile) {
        let key = (profile.crop_id.clone(), profile.region.clone());
        self.profiles.insert(key, profile);
    }

    pub fn insert_region(&mut self, region: GrowingRegion) {
        self.regions.insert(region.id.clone(), region);
    }

    pub fn profile(&self, crop_id: &str, region_id: &str) -> Result<&CropPhenologyProfile, EngineError> {
        self.profiles
            .get(&(crop_id.to_string(), region_id.to_string()))
            .ok_or_else(|| EngineError::MissingPhenology {
                crop: crop_id.to_string(),
                region: region_id.to_string(),
            })
    }

    pub fn region(&self, region_id: &str) -> Result<&GrowingRegion, EngineError> {
        self.regions
            .get(region_id)
            .ok_or_else(|| EngineError::UnknownRegion(region_id.to_string()))
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl Default for PhenologyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Monthly average daily GDD by state, Jan..Dec.
fn state_monthly_rates(state: &str) -> [f64; 12] {
    match state {
        "FL" => [15.0, 17.0, 20.0, 23.0, 25.0, 26.0, 26.0, 26.0, 25.0, 22.0, 18.0, 15.0],
        "CA" => [10.0, 12.0, 15.0, 18.0, 22.0, 25.0, 28.0, 27.0, 24.0, 19.0, 13.0, 10.0],
        "TX" => [12.0, 14.0, 18.0, 22.0, 26.0, 28.0, 30.0, 30.0, 27.0, 22.0, 16.0, 12.0],
        "GA" => [8.0, 10.0, 15.0, 20.0, 24.0, 27.0, 28.0, 28.0, 25.0, 18.0, 12.0, 8.0],
        "WA" | "OR" => [2.0, 4.0, 8.0, 12.0, 16.0, 20.0, 24.0, 23.0, 18.0, 11.0, 5.0, 2.0],
        "MI" | "NY" => [0.0, 2.0, 6.0, 12.0, 18.0, 22.0, 25.0, 24.0, 18.0, 10.0, 4.0, 0.0],
        "NJ" => [2.0, 4.0, 8.0, 14.0, 20.0, 24.0, 26.0, 25.0, 20.0, 12.0, 6.0, 2.0],
        _ => [5.0, 7.0, 12.0, 16.0, 20.0, 24.0, 26.0, 25.0, 20.0, 14.0, 8.0, 5.0],
    }
}

fn region(id: &str, name: &str, state: &str, chill: f64, last_frost: u32, first_frost: u32) -> GrowingRegion {
    GrowingRegion {
        id: id.to_string(),
        name: name.to_string(),
        state: state.to_string(),
        monthly_gdd_rates: state_monthly_rates(state),
        chill_hours: Some(chill),
        last_frost_doy: Some(last_frost),
        first_frost_doy: Some(first_frost),
    }
}

/// Curated US growing regions for the core crop set.
pub fn curated_regions() -> Vec<GrowingRegion> {
    vec![
        region("indian_river", "Indian River District", "FL", 150.0, 45, 350),
        region("central_florida", "Central Florida", "FL", 200.0, 52, 340),
        region("texas_rgv", "Texas Rio Grande Valley", "TX", 200.0, 35, 355),
        region("georgia_piedmont", "Georgia Piedmont (Peach Belt)", "GA", 700.0, 90, 310),
        region("california_central_valley", "California Central Valley", "CA", 600.0, 60, 335),
        region("pacific_nw_yakima", "Washington Yakima Valley", "WA", 1200.0, 120, 290),
        region("michigan_west", "West Michigan", "MI", 1400.0, 135, 275),
        region("new_jersey_pine_barrens", "New Jersey Pine Barrens", "NJ", 1000.0, 115, 290),
    ]
}

fn profile(
    crop_id: &str,
    region_id: &str,
    base: f64,
    cap: Option<f64>,
    bloom: (u32, u32),
    maturity: f64,
    peak: f64,
    window: f64,
    chill: Option<f64>,
) -> CropPhenologyProfile {
    CropPhenologyProfile {
        crop_id: crop_id.to_string(),
        region: region_id.to_string(),
        base_temp: base,
        max_temp: cap,
        bloom_month: bloom.0,
        bloom_day: bloom.1,
        gdd_to_maturity: maturity,
        gdd_to_peak: peak,
        gdd_window: window,
        chill_hours_required: chill,
    }
}

/// Curated crop phenology, calibrated against farm-reported harvest timing.
pub fn curated_profiles() -> Vec<CropPhenologyProfile> {
    vec![
        profile("navel_orange", "indian_river", 55.0, None, (3, 15), 5100.0, 6100.0, 3500.0, Some(100.0)),
        profile("navel_orange", "central_florida", 55.0, None, (3, 15), 5100.0, 6100.0, 3500.0, Some(100.0)),
        profile("grapefruit", "indian_river", 55.0, None, (3, 1), 5500.0, 7100.0, 4400.0, Some(100.0)),
        profile("grapefruit", "texas_rgv", 55.0, None, (3, 1), 5500.0, 7100.0, 4400.0, Some(100.0)),
        profile("tangerine", "indian_river", 55.0, None, (3, 20), 4800.0, 5700.0, 1800.0, Some(100.0)),
        profile("strawberry", "central_florida", 50.0, None, (10, 1), 700.0, 1300.0, 1700.0, None),
        profile("tomato", "central_florida", 50.0, Some(86.0), (9, 1), 2400.0, 2600.0, 2400.0, None),
        profile("peach", "georgia_piedmont", 45.0, None, (3, 15), 1600.0, 2000.0, 1200.0, Some(650.0)),
        profile("apple", "pacific_nw_yakima", 43.0, None, (4, 20), 1800.0, 2400.0, 1400.0, Some(900.0)),
        profile("apple", "michigan_west", 43.0, None, (5, 1), 2000.0, 2400.0, 800.0, Some(900.0)),
        profile("cherry", "pacific_nw_yakima", 40.0, None, (4, 10), 1100.0, 1400.0, 600.0, Some(1000.0)),
        profile("cherry", "michigan_west", 40.0, None, (5, 1), 900.0, 1200.0, 500.0, Some(1000.0)),
        profile("blueberry", "michigan_west", 45.0, None, (5, 15), 900.0, 1200.0, 700.0, Some(800.0)),
        profile("blueberry", "new_jersey_pine_barrens", 45.0, None, (5, 1), 850.0, 1100.0, 600.0, Some(800.0)),
        profile("pear", "pacific_nw_yakima", 40.0, None, (4, 5), 2200.0, 2700.0, 1000.0, Some(900.0)),
    ]
}
