//! Utility modules for harvest prediction
//!
//! Contains shared functionality used across multiple components:
//! - Stats: mean / population stddev / min-max for calibration offsets

pub mod stats;

// Re-export commonly used helpers
pub use stats::{mean, min_max, population_stddev};
