//! Calibration Engine
//!
//! Reconciles predictions against empirical measurements: per-(cultivar,
//! region, season) offset statistics plus aggregate accuracy diagnostics.

pub mod accuracy;
pub mod engine;

// Re-export the calibration surface
pub use accuracy::{accuracy_report, AccuracyReport};
pub use engine::{calibrate, CalibrationRecord, ObservationPair, MIN_SAMPLES_PER_TUPLE};
