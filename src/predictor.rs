//! Modifier Compositor
//!
//! Composes the cultivar's genetic baseline with the rootstock, age, and
//! timing modifiers into one point Brix estimate with confidence. The
//! composite confidence is derived from the weakest component, never assumed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::CultivarCatalog;
use crate::gdd::GddAccumulation;
use crate::harvest::{predict_window, HarvestWindow};
use crate::lifecycle::{age_modifier, AgeStage, DecliningParadox, Lifecycle};
use crate::phenology::PhenologyRegistry;
use crate::quality::{estimate_quality, QualityCurveParams, QualityEstimate};
use crate::EngineError;

/// Tuning for the parabolic timing penalty.
///
/// The half-width and the phenology `gdd_window` are deliberately independent
/// knobs: the window describes how long fruit stays marketable, the
/// half-width how sharply flavor falls off around peak. `from_window` couples
/// them for callers who want a single source of truth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingParams {
    /// Half-width of the peak quality window in GDD units
    pub gdd_halfwidth: f64,
    /// Penalty (Brix) at the edge of the window
    pub max_penalty: f64,
}

impl Default for TimingParams {
    fn default() -> Self {
        TimingParams { gdd_halfwidth: 150.0, max_penalty: 1.0 }
    }
}

impl TimingParams {
    /// Derive the half-width from a profile's quality window: a quarter of
    /// the window span, so the zero-penalty core matches the optimal band's
    /// center.
    pub fn from_window(gdd_window: f64) -> Self {
        TimingParams { gdd_halfwidth: (gdd_window / 4.0).max(1.0), max_penalty: 1.0 }
    }
}

/// Brix penalty for harvesting away from peak.
///
/// Zero inside the inner half of the half-width, parabolic outside it,
/// capped at 1.5x the max penalty. Symmetric in the GDD distance by
/// construction.
pub fn timing_modifier(current_gdd: f64, peak_gdd: f64, params: &TimingParams) -> f64 {
    let d = (current_gdd - peak_gdd).abs();
    let h = params.gdd_halfwidth;

    if d <= h / 2.0 {
        return 0.0;
    }

    let penalty = params.max_penalty * (d / h).powi(2);
    -penalty.min(params.max_penalty * 1.5)
}

/// A point Brix prediction with its full component breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrixPrediction {
    pub cultivar_id: String,
    pub predicted_brix: f64,
    pub cultivar_base: f64,
    pub rootstock_modifier: f64,
    pub age_modifier: f64,
    pub timing_modifier: f64,
    pub age_stage: Option<AgeStage>,
    pub declining_note: Option<DecliningParadox>,
    pub confidence: f64,
}

/// Inputs describing one planting at one moment.
#[derive(Debug, Clone, Default)]
pub struct PlantingContext<'a> {
    pub rootstock_id: Option<&'a str>,
    pub age_years: Option<u32>,
    /// Overrides the cataloged lifecycle when the caller knows better
    pub lifecycle_override: Option<Lifecycle>,
    /// Confidence of the GDD figure itself (1.0 = fully observed weather)
    pub gdd_confidence: Option<f64>,
}

/// Main prediction coordinator.
///
/// Owns the reference data and wires the pure component functions together.
/// Every method takes its time-varying inputs explicitly, so a single
/// predictor can serve any number of concurrent callers.
pub struct HarvestPredictor {
    registry: PhenologyRegistry,
    catalog: CultivarCatalog,
    timing: TimingParams,
}

impl HarvestPredictor {
    pub fn new(registry: PhenologyRegistry, catalog: CultivarCatalog, timing: TimingParams) -> Self {
        HarvestPredictor { registry, catalog, timing }
    }

    /// Predictor over the curated reference set with default timing.
    pub fn curated() -> Self {
        Self::new(PhenologyRegistry::curated(), CultivarCatalog::curated(), TimingParams::default())
    }

    pub fn registry(&self) -> &PhenologyRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &CultivarCatalog {
        &self.catalog
    }

    /// Predict Brix for a planting at its current GDD position.
    ///
    /// `peak_gdd` normally comes from the crop's phenology profile. Unknown
    /// cultivar ids error immediately; every degradable input (rootstock,
    /// age, lifecycle) shows up as reduced confidence instead.
    pub fn predict_brix(
        &self,
        cultivar_id: &str,
        current_gdd: f64,
        peak_gdd: f64,
        ctx: &PlantingContext,
    ) -> Result<BrixPrediction, EngineError> {
        let cultivar = self.catalog.cultivar(cultivar_id)?;

        let (rootstock_mod, rootstock_conf) = self.catalog.rootstock_delta(ctx.rootstock_id);

        let lifecycle = ctx.lifecycle_override.or(cultivar.lifecycle);
        let age = age_modifier(lifecycle, ctx.age_years);

        let timing_mod = timing_modifier(current_gdd, peak_gdd, &self.timing);

        let predicted = cultivar.base_brix + rootstock_mod + age.modifier + timing_mod;

        let gdd_conf = ctx.gdd_confidence.unwrap_or(1.0);
        let confidence = rootstock_conf.min(age.confidence).min(gdd_conf);

        Ok(BrixPrediction {
            cultivar_id: cultivar.id.clone(),
            predicted_brix: predicted,
            cultivar_base: cultivar.base_brix,
            rootstock_modifier: rootstock_mod,
            age_modifier: age.modifier,
            timing_modifier: timing_mod,
            age_stage: age.stage,
            declining_note: age.note,
            confidence,
        })
    }

    /// Project the harvest window for a crop/region from an accumulation.
    pub fn predict_window(
        &self,
        crop_id: &str,
        region_id: &str,
        accumulation: &GddAccumulation,
        today: NaiveDate,
    ) -> Result<HarvestWindow, EngineError> {
        // Region must exist even though only the profile drives the math:
        // an unknown region key is a contract violation, not a default.
        self.registry.region(region_id)?;
        let profile = self.registry.profile(crop_id, region_id)?;

        let rate = if accumulation.avg_daily_gdd > 0.0 {
            accumulation.avg_daily_gdd
        } else {
            self.registry.region(region_id)?.avg_daily_rate()
        };

        Ok(predict_window(
            profile,
            region_id,
            accumulation.cumulative_gdd,
            rate,
            today,
            accumulation.confidence,
        ))
    }

    /// Sugar/acid estimate for a cultivar at a GDD position, using the crop's
    /// curve preset with the cultivar's ceiling.
    pub fn estimate_quality(
        &self,
        cultivar_id: &str,
        current_gdd: f64,
    ) -> Result<QualityEstimate, EngineError> {
        let cultivar = self.catalog.cultivar(cultivar_id)?;
        let params = QualityCurveParams::for_crop(&cultivar.crop_id).with_ceiling(cultivar.base_brix);
        Ok(estimate_quality(current_gdd, &params))
    }
}
