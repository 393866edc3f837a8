//! Harvest Predictor Rust Implementation
//!
//! GDD-driven harvest window and fruit quality prediction with empirical
//! calibration. The crate is a pure computation library:
//! - `phenology`: per-crop/region thermal constants and growing regions
//! - `gdd`: daily temperature extremes -> cumulative heat units
//! - `harvest`: GDD thresholds -> calendar windows and season status
//! - `quality`: logistic sugar / exponential acid curves and flavor indices
//! - `lifecycle`: age-stage Brix modifiers for perennial growth habits
//! - `predictor`: modifier composition into point Brix estimates
//! - `calibration`: prediction-vs-measurement offset statistics
//! - `data`: Polars loading of reference tables and measurements
//!
//! Every prediction function is stateless over explicit inputs, so
//! independent (cultivar, region, season) tuples parallelize freely.

pub mod calibration;
pub mod catalog;
pub mod data;
pub mod gdd;
pub mod harvest;
pub mod lifecycle;
pub mod phenology;
pub mod predictor;
pub mod quality;
pub mod utils;

// Re-export commonly used types
pub use calibration::{accuracy_report, calibrate, AccuracyReport, CalibrationRecord, ObservationPair};
pub use catalog::{Cultivar, CultivarCatalog, RootstockModifier};
pub use data::{EngineData, Measurement};
pub use gdd::{accumulate, daily_gdd, DailyTemps, GddAccumulation, GddSource};
pub use harvest::{HarvestStatus, HarvestWindow};
pub use lifecycle::{age_modifier, AgeModifierResult, AgeStage, DecliningParadox, Lifecycle};
pub use phenology::{CropPhenologyProfile, GrowingRegion, PhenologyRegistry};
pub use predictor::{timing_modifier, BrixPrediction, HarvestPredictor, PlantingContext, TimingParams};
pub use quality::{estimate_quality, QualityCurveParams, QualityEstimate};

/// Fatal domain errors: caller contract violations that must surface
/// immediately rather than degrade into defaults. Everything recoverable
/// (missing age, missing weather, thin samples) is absorbed as reduced
/// confidence instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown cultivar: {0}")]
    UnknownCultivar(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("no phenology profile for crop '{crop}' in region '{region}'")]
    MissingPhenology { crop: String, region: String },

    #[error(
        "invalid phenology thresholds for crop '{crop}': maturity {maturity}, peak {peak}, window {window}"
    )]
    InvalidThresholds {
        crop: String,
        maturity: f64,
        peak: f64,
        window: f64,
    },
}
