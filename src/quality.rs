//! Quality Curve Model
//!
//! Internal quality as a function of accumulated heat: sugar (SSC/Brix) rises
//! along a logistic curve while titratable acidity decays exponentially. Both
//! are pure functions of GDD and fixed per-cultivar constants, so any number
//! of cultivars can be evaluated concurrently.

use serde::{Deserialize, Serialize};

/// Constants for one crop's sugar/acid development curves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCurveParams {
    /// Early-season Brix floor
    pub ssc_min: f64,
    /// Genetic ceiling (cultivar-dependent; override with `with_ceiling`)
    pub ssc_max: f64,
    /// GDD at 50% sugar development
    pub dd50: f64,
    /// Steepness of the logistic rise (GDD units)
    pub steepness: f64,
    /// Acid percentage at bloom
    pub ta0: f64,
    /// Exponential acid decay rate per GDD
    pub acid_decay: f64,
}

impl QualityCurveParams {
    /// Citrus, calibrated for Florida accumulation (~22 GDD/day, base 55F).
    pub fn citrus() -> Self {
        QualityCurveParams {
            ssc_min: 6.0,
            ssc_max: 12.0,
            dd50: 5500.0,
            steepness: 900.0,
            ta0: 3.0,
            acid_decay: 0.00025,
        }
    }

    /// Stone fruit: steeper rise, faster acid loss than citrus.
    pub fn peach() -> Self {
        QualityCurveParams {
            ssc_min: 8.0,
            ssc_max: 14.0,
            dd50: 1900.0,
            steepness: 200.0,
            ta0: 1.0,
            acid_decay: 0.0008,
        }
    }

    /// Sweet cherry: rapid sugar gain in the final weeks before harvest.
    pub fn cherry() -> Self {
        QualityCurveParams {
            ssc_min: 10.0,
            ssc_max: 20.0,
            dd50: 1400.0,
            steepness: 80.0,
            ta0: 0.8,
            acid_decay: 0.0006,
        }
    }

    pub fn apple() -> Self {
        QualityCurveParams {
            ssc_min: 10.0,
            ssc_max: 15.0,
            dd50: 2300.0,
            steepness: 300.0,
            ta0: 0.8,
            acid_decay: 0.0003,
        }
    }

    pub fn pear() -> Self {
        QualityCurveParams {
            ssc_min: 10.0,
            ssc_max: 14.0,
            dd50: 1900.0,
            steepness: 250.0,
            ta0: 0.5,
            acid_decay: 0.0004,
        }
    }

    pub fn blueberry() -> Self {
        QualityCurveParams {
            ssc_min: 8.0,
            ssc_max: 14.0,
            dd50: 1300.0,
            steepness: 150.0,
            ta0: 0.5,
            acid_decay: 0.0006,
        }
    }

    pub fn tomato() -> Self {
        QualityCurveParams {
            ssc_min: 3.5,
            ssc_max: 8.0,
            dd50: 1200.0,
            steepness: 200.0,
            ta0: 0.8,
            acid_decay: 0.0006,
        }
    }

    /// Curve preset for a crop id; citrus behavior is the default for
    /// non-climacteric fruit without a dedicated preset.
    pub fn for_crop(crop_id: &str) -> Self {
        match crop_id {
            "peach" => Self::peach(),
            "cherry" | "sweet_cherry" | "tart_cherry" => Self::cherry(),
            "apple" => Self::apple(),
            "pear" => Self::pear(),
            "blueberry" => Self::blueberry(),
            "tomato" => Self::tomato(),
            _ => Self::citrus(),
        }
    }

    /// Same curve with the sugar ceiling replaced by a cultivar's genetic
    /// ceiling.
    pub fn with_ceiling(mut self, ceiling_brix: f64) -> Self {
        self.ssc_max = ceiling_brix;
        self
    }
}

/// Point-in-time quality estimate at a given GDD.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityEstimate {
    /// Soluble solids content (degrees Brix)
    pub ssc: f64,
    /// Titratable acidity (%)
    pub ta: f64,
    /// SSC:TA ratio; 0.0 when acid has fully decayed
    pub ratio: f64,
    /// BrimA flavor index (SSC - 4*TA)
    pub brim_a: f64,
}

/// Sugar at a given GDD: logistic rise from `ssc_min` toward `ssc_max`.
pub fn ssc_at(gdd: f64, params: &QualityCurveParams) -> f64 {
    params.ssc_min
        + (params.ssc_max - params.ssc_min)
            / (1.0 + (-(gdd - params.dd50) / params.steepness).exp())
}

/// Acid at a given GDD: exponential decay from `ta0`.
pub fn ta_at(gdd: f64, params: &QualityCurveParams) -> f64 {
    params.ta0 * (-params.acid_decay * gdd).exp()
}

/// Full quality estimate at a given GDD.
///
/// The ratio is guarded: fully decayed acid yields 0.0 rather than a
/// division blowing up downstream.
pub fn estimate_quality(gdd: f64, params: &QualityCurveParams) -> QualityEstimate {
    let ssc = ssc_at(gdd, params);
    let ta = ta_at(gdd, params);
    let ratio = if ta > 0.0 { ssc / ta } else { 0.0 };
    let brim_a = ssc - 4.0 * ta;

    QualityEstimate { ssc, ta, ratio, brim_a }
}
