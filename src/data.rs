//! Data Loading and Management
//!
//! The single I/O boundary of the crate: loads the reference tables
//! (phenology, cultivars, rootstocks) from CSV and harvested measurements
//! from Parquet using Polars, then hands everything downstream as owned,
//! typed rows. All loads are synchronous; the prediction and calibration
//! modules never touch the filesystem themselves.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;

use crate::catalog::{Cultivar, CultivarCatalog, MaturityProfile, RootstockModifier};
use crate::lifecycle::Lifecycle;
use crate::phenology::{CropPhenologyProfile, GrowingRegion, PhenologyRegistry};

/// One harvested measurement from the measurement store.
///
/// Append-only upstream; this crate only ever reads them, and only the
/// calibration engine consumes them.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub cultivar_id: String,
    pub region_id: String,
    pub date: NaiveDate,
    pub actual_brix: f64,
    pub actual_acid: Option<f64>,
}

/// All engine inputs, loaded once per batch run.
pub struct EngineData {
    pub registry: PhenologyRegistry,
    pub catalog: CultivarCatalog,
    pub measurements: Vec<Measurement>,
}

impl EngineData {
    /// Load every table from a data directory:
    ///
    /// - `phenology.csv`: crop_id, region_id, base_temp, max_temp,
    ///   bloom_month, bloom_day, gdd_to_maturity, gdd_to_peak, gdd_window,
    ///   chill_hours
    /// - `regions.csv`: id, name, state, chill_hours, last_frost_doy,
    ///   first_frost_doy, jan..dec (daily GDD rates)
    /// - `cultivars.csv`: id, name, crop_id, lifecycle, base_brix,
    ///   years_to_first_bearing, prime_age_min, prime_age_max
    /// - `rootstocks.csv`: id, name, brix_delta, compatible_crops
    ///   (pipe-separated)
    /// - `measurements.parquet`: cultivar_id, region_id, date (ISO-8601
    ///   string), actual_brix, actual_acid
    pub fn load(data_dir: &Path) -> Result<Self> {
        println!("Loading engine datasets from {:?}...", data_dir);

        let mut registry = PhenologyRegistry::new();
        for region in Self::load_regions(&data_dir.join("regions.csv"))? {
            registry.insert_region(region);
        }
        for profile in Self::load_phenology(&data_dir.join("phenology.csv"))? {
            profile.validate().with_context(|| {
                format!("phenology row {}:{} fails threshold ordering", profile.crop_id, profile.region)
            })?;
            registry.insert_profile(profile);
        }

        let mut catalog = CultivarCatalog::new();
        for cultivar in Self::load_cultivars(&data_dir.join("cultivars.csv"))? {
            catalog.insert_cultivar(cultivar);
        }
        for rootstock in Self::load_rootstocks(&data_dir.join("rootstocks.csv"))? {
            catalog.insert_rootstock(rootstock);
        }

        let measurements = Self::load_measurements(&data_dir.join("measurements.parquet"))?;

        println!("  Phenology profiles: {}", registry.profile_count());
        println!("  Regions: {}", registry.region_count());
        println!("  Cultivars: {}", catalog.cultivar_count());
        println!("  Rootstocks: {}", catalog.rootstock_count());
        println!("  Measurements: {}", measurements.len());

        Ok(EngineData { registry, catalog, measurements })
    }

    fn read_csv(path: &PathBuf) -> Result<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.clone()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load CSV: {:?}", path))
    }

    fn f64_col(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let cast = df
            .column(name)
            .with_context(|| format!("Column '{}' not found", name))?
            .cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' is not numeric", name))?;
        Ok(cast.f64()?.into_iter().collect())
    }

    fn str_col(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let col = df
            .column(name)
            .with_context(|| format!("Column '{}' not found", name))?
            .str()
            .with_context(|| format!("Column '{}' is not string type", name))?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(col)
    }

    fn load_phenology(path: &PathBuf) -> Result<Vec<CropPhenologyProfile>> {
        let df = Self::read_csv(path)?;

        let crop_ids = Self::str_col(&df, "crop_id")?;
        let region_ids = Self::str_col(&df, "region_id")?;
        let base = Self::f64_col(&df, "base_temp")?;
        let cap = Self::f64_col(&df, "max_temp")?;
        let bloom_month = Self::f64_col(&df, "bloom_month")?;
        let bloom_day = Self::f64_col(&df, "bloom_day")?;
        let maturity = Self::f64_col(&df, "gdd_to_maturity")?;
        let peak = Self::f64_col(&df, "gdd_to_peak")?;
        let window = Self::f64_col(&df, "gdd_window")?;
        let chill = Self::f64_col(&df, "chill_hours")?;

        let mut profiles = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let (Some(crop_id), Some(region)) = (crop_ids[i].clone(), region_ids[i].clone()) else {
                anyhow::bail!("phenology row {} missing crop_id/region_id", i);
            };
            profiles.push(CropPhenologyProfile {
                crop_id,
                region,
                base_temp: base[i].context("base_temp missing")?,
                max_temp: cap[i],
                bloom_month: bloom_month[i].context("bloom_month missing")? as u32,
                bloom_day: bloom_day[i].context("bloom_day missing")? as u32,
                gdd_to_maturity: maturity[i].context("gdd_to_maturity missing")?,
                gdd_to_peak: peak[i].context("gdd_to_peak missing")?,
                gdd_window: window[i].context("gdd_window missing")?,
                chill_hours_required: chill[i],
            });
        }
        Ok(profiles)
    }

    fn load_regions(path: &PathBuf) -> Result<Vec<GrowingRegion>> {
        const MONTH_COLS: [&str; 12] = [
            "jan", "feb", "mar", "apr", "may", "jun",
            "jul", "aug", "sep", "oct", "nov", "dec",
        ];

        let df = Self::read_csv(path)?;

        let ids = Self::str_col(&df, "id")?;
        let names = Self::str_col(&df, "name")?;
        let states = Self::str_col(&df, "state")?;
        let chill = Self::f64_col(&df, "chill_hours")?;
        let last_frost = Self::f64_col(&df, "last_frost_doy")?;
        let first_frost = Self::f64_col(&df, "first_frost_doy")?;
        let months: Vec<Vec<Option<f64>>> = MONTH_COLS
            .iter()
            .map(|m| Self::f64_col(&df, m))
            .collect::<Result<_>>()?;

        let mut regions = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(id) = ids[i].clone() else {
                anyhow::bail!("region row {} missing id", i);
            };
            let mut rates = [0.0; 12];
            for (m, col) in months.iter().enumerate() {
                rates[m] = col[i].with_context(|| format!("region {} missing rate for month {}", id, m + 1))?;
            }
            regions.push(GrowingRegion {
                id,
                name: names[i].clone().unwrap_or_default(),
                state: states[i].clone().unwrap_or_default(),
                monthly_gdd_rates: rates,
                chill_hours: chill[i],
                last_frost_doy: last_frost[i].map(|v| v as u32),
                first_frost_doy: first_frost[i].map(|v| v as u32),
            });
        }
        Ok(regions)
    }

    fn load_cultivars(path: &PathBuf) -> Result<Vec<Cultivar>> {
        let df = Self::read_csv(path)?;

        let ids = Self::str_col(&df, "id")?;
        let names = Self::str_col(&df, "name")?;
        let crop_ids = Self::str_col(&df, "crop_id")?;
        let lifecycles = Self::str_col(&df, "lifecycle")?;
        let base_brix = Self::f64_col(&df, "base_brix")?;
        let first_bearing = Self::f64_col(&df, "years_to_first_bearing")?;
        let prime_min = Self::f64_col(&df, "prime_age_min")?;
        let prime_max = Self::f64_col(&df, "prime_age_max")?;

        let mut cultivars = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let (Some(id), Some(crop_id)) = (ids[i].clone(), crop_ids[i].clone()) else {
                anyhow::bail!("cultivar row {} missing id/crop_id", i);
            };
            // Lifecycle resolves to the closed union here, once. Rows with an
            // unrecognized label keep None and predict at reduced confidence.
            let lifecycle = lifecycles[i].as_deref().and_then(Lifecycle::from_label);
            let prime = match (prime_min[i], prime_max[i]) {
                (Some(lo), Some(hi)) => Some((lo as u32, hi as u32)),
                _ => None,
            };
            cultivars.push(Cultivar {
                id,
                name: names[i].clone().unwrap_or_default(),
                crop_id,
                lifecycle,
                base_brix: base_brix[i].context("base_brix missing")?,
                maturity: MaturityProfile {
                    prime_age_range_years: prime,
                    years_to_first_bearing: first_bearing[i].map(|v| v as u32),
                    age_curve: lifecycle.and_then(|l| l.age_curve()),
                },
            });
        }
        Ok(cultivars)
    }

    fn load_rootstocks(path: &PathBuf) -> Result<Vec<RootstockModifier>> {
        let df = Self::read_csv(path)?;

        let ids = Self::str_col(&df, "id")?;
        let names = Self::str_col(&df, "name")?;
        let deltas = Self::f64_col(&df, "brix_delta")?;
        let compatible = Self::str_col(&df, "compatible_crops")?;

        let mut rootstocks = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(id) = ids[i].clone() else {
                anyhow::bail!("rootstock row {} missing id", i);
            };
            let crops: Vec<String> = compatible[i]
                .as_deref()
                .unwrap_or("")
                .split('|')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
            rootstocks.push(RootstockModifier {
                id,
                name: names[i].clone().unwrap_or_default(),
                brix_delta: deltas[i].context("brix_delta missing")?,
                compatible_crops: crops,
            });
        }
        Ok(rootstocks)
    }

    /// Load measurements with column projection; only the five contract
    /// columns are materialized.
    fn load_measurements(path: &PathBuf) -> Result<Vec<Measurement>> {
        let df = LazyFrame::scan_parquet(path.clone(), Default::default())
            .with_context(|| format!("Failed to scan parquet: {:?}", path))?
            .select(&[
                col("cultivar_id"),
                col("region_id"),
                col("date").cast(DataType::String),
                col("actual_brix").cast(DataType::Float64),
                col("actual_acid").cast(DataType::Float64),
            ])
            .collect()
            .with_context(|| "Failed to load measurements parquet")?;

        let cultivar_ids = Self::str_col(&df, "cultivar_id")?;
        let region_ids = Self::str_col(&df, "region_id")?;
        let dates = Self::str_col(&df, "date")?;
        let brix = Self::f64_col(&df, "actual_brix")?;
        let acid = Self::f64_col(&df, "actual_acid")?;

        let mut measurements = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            // A row missing a required field is malformed store output, not a
            // degradable input
            let (Some(cultivar_id), Some(region_id), Some(date_str), Some(actual_brix)) =
                (cultivar_ids[i].clone(), region_ids[i].clone(), dates[i].clone(), brix[i])
            else {
                anyhow::bail!("measurement row {} missing a required field", i);
            };
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .with_context(|| format!("measurement row {} has bad date '{}'", i, date_str))?;
            measurements.push(Measurement {
                cultivar_id,
                region_id,
                date,
                actual_brix,
                actual_acid: acid[i],
            });
        }
        Ok(measurements)
    }
}
