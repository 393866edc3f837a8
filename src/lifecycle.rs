//! Lifecycle Age Modifier
//!
//! Perennials shift energy allocation from vegetative growth to reproduction
//! as they age, which shows up directly in fruit Brix. Each growth habit gets
//! a named stage curve mapping planting age to a bounded Brix offset; annuals
//! carry no age effect at all (their quality variation is timing-only).
//!
//! Lifecycle is a closed tagged union resolved once when the catalog loads.
//! The legacy crop-name keyword heuristic survives only as a data-quality
//! lint (`keyword_lint`) and is never consulted at prediction time.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Growth habit of a cultivar. Closed set: prediction code matches
/// exhaustively and new habits are a deliberate schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    TreePerennial,
    BushPerennial,
    VinePerennial,
    /// Direct-seeded annual row crop
    AnnualRow,
    /// Annual replanted each cycle from transplants
    AnnualReplanted,
}

impl Lifecycle {
    /// Parse a catalog label. Unknown labels are None, not an error: a
    /// missing lifecycle degrades confidence downstream instead of failing.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "tree_perennial" | "tree" => Some(Lifecycle::TreePerennial),
            "bush_perennial" | "bush" | "shrub" => Some(Lifecycle::BushPerennial),
            "vine_perennial" | "vine" => Some(Lifecycle::VinePerennial),
            "annual_row" | "annual" => Some(Lifecycle::AnnualRow),
            "annual_replanted" => Some(Lifecycle::AnnualReplanted),
            _ => None,
        }
    }

    pub fn is_perennial(&self) -> bool {
        matches!(
            self,
            Lifecycle::TreePerennial | Lifecycle::BushPerennial | Lifecycle::VinePerennial
        )
    }

    /// The age curve this habit follows, where one applies.
    pub fn age_curve(&self) -> Option<AgeCurveKind> {
        match self {
            Lifecycle::TreePerennial => Some(AgeCurveKind::TreeStandard),
            Lifecycle::BushPerennial => Some(AgeCurveKind::BushStandard),
            Lifecycle::VinePerennial => Some(AgeCurveKind::VineStandard),
            Lifecycle::AnnualRow | Lifecycle::AnnualReplanted => None,
        }
    }
}

/// Named age-to-modifier curves, one per perennial habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeCurveKind {
    TreeStandard,
    BushStandard,
    VineStandard,
}

/// Developmental stage within an age curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeStage {
    PreBearing,
    Juvenile,
    Developing,
    Prime,
    Mature,
    Declining,
}

/// One stage span of an age curve: a closed inclusive interval of whole
/// planting years and the Brix offset that applies inside it.
#[derive(Debug, Clone, Copy)]
struct StageSpan {
    stage: AgeStage,
    min_age: u32,
    /// Inclusive upper bound; None for the open-ended final stage
    max_age: Option<u32>,
    modifier: f64,
}

fn curve_spans(kind: AgeCurveKind) -> SmallVec<[StageSpan; 6]> {
    use AgeStage::*;
    match kind {
        AgeCurveKind::TreeStandard => SmallVec::from_slice(&[
            StageSpan { stage: PreBearing, min_age: 0, max_age: Some(2), modifier: -0.8 },
            StageSpan { stage: Juvenile, min_age: 3, max_age: Some(4), modifier: -0.5 },
            StageSpan { stage: Developing, min_age: 5, max_age: Some(7), modifier: -0.2 },
            StageSpan { stage: Prime, min_age: 8, max_age: Some(18), modifier: 0.0 },
            StageSpan { stage: Mature, min_age: 19, max_age: Some(25), modifier: -0.2 },
            StageSpan { stage: Declining, min_age: 26, max_age: None, modifier: -0.3 },
        ]),
        AgeCurveKind::BushStandard => SmallVec::from_slice(&[
            StageSpan { stage: PreBearing, min_age: 0, max_age: Some(0), modifier: -0.8 },
            StageSpan { stage: Juvenile, min_age: 1, max_age: Some(2), modifier: -0.5 },
            StageSpan { stage: Prime, min_age: 3, max_age: Some(5), modifier: 0.0 },
            StageSpan { stage: Mature, min_age: 6, max_age: Some(10), modifier: -0.1 },
            StageSpan { stage: Declining, min_age: 11, max_age: None, modifier: -0.3 },
        ]),
        AgeCurveKind::VineStandard => SmallVec::from_slice(&[
            StageSpan { stage: PreBearing, min_age: 0, max_age: Some(2), modifier: -0.8 },
            StageSpan { stage: Juvenile, min_age: 3, max_age: Some(4), modifier: -0.4 },
            StageSpan { stage: Prime, min_age: 5, max_age: Some(10), modifier: 0.0 },
            StageSpan { stage: Mature, min_age: 11, max_age: Some(25), modifier: -0.1 },
            StageSpan { stage: Declining, min_age: 26, max_age: None, modifier: -0.2 },
        ]),
    }
}

/// Note attached when a planting is in its declining stage.
///
/// The numeric modifier says quality drops, but old declining plantings are
/// widely observed to concentrate flavor at reduced yield. Carrying the
/// tension as structured data means callers must decide what to do with it
/// instead of silently dropping it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecliningParadox {
    pub age_years: u32,
    pub curve: AgeCurveKind,
}

/// Result of an age-modifier evaluation.
///
/// `modifier` is always within [-0.8, 0.0]; `confidence` within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeModifierResult {
    pub modifier: f64,
    pub stage: Option<AgeStage>,
    pub note: Option<DecliningParadox>,
    pub confidence: f64,
}

impl AgeModifierResult {
    fn neutral(confidence: f64) -> Self {
        AgeModifierResult { modifier: 0.0, stage: None, note: None, confidence }
    }
}

/// Brix offset for a planting of known lifecycle and age.
///
/// Missing inputs are the common case and never an error: an unknown
/// lifecycle or unknown age yields the neutral modifier at half confidence.
/// Annuals yield the neutral modifier at full confidence (there is no age
/// effect to be uncertain about).
pub fn age_modifier(lifecycle: Option<Lifecycle>, age_years: Option<u32>) -> AgeModifierResult {
    let Some(lifecycle) = lifecycle else {
        return AgeModifierResult::neutral(0.5);
    };

    let Some(curve) = lifecycle.age_curve() else {
        // Annual habit: timing-only quality variation
        return AgeModifierResult::neutral(1.0);
    };

    let Some(age) = age_years else {
        return AgeModifierResult::neutral(0.5);
    };

    let spans = curve_spans(curve);
    for span in &spans {
        let in_span = age >= span.min_age && span.max_age.map_or(true, |max| age <= max);
        if in_span {
            let note = (span.stage == AgeStage::Declining)
                .then_some(DecliningParadox { age_years: age, curve });
            return AgeModifierResult {
                modifier: span.modifier,
                stage: Some(span.stage),
                note,
                confidence: 0.9,
            };
        }
    }

    // Unreachable for well-formed curves (spans cover all of 0..), but a
    // neutral fallback keeps the contract of never erroring.
    AgeModifierResult::neutral(0.5)
}

/// Mismatch found by the offline lifecycle lint.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleLintFinding {
    pub crop_name: String,
    pub cataloged: Option<Lifecycle>,
    pub inferred: Option<Lifecycle>,
}

/// Infer a lifecycle from crop-name keywords. Lint-only: the weakest signal
/// in the old resolution chain, kept to flag catalog rows worth a second look.
fn infer_from_name(crop_name: &str) -> Option<Lifecycle> {
    let name = crop_name.to_lowercase();
    const TREE: &[&str] = &[
        "orange", "grapefruit", "tangerine", "citrus", "apple", "pear", "peach",
        "cherry", "mango", "pecan", "plum", "apricot",
    ];
    const BUSH: &[&str] = &["blueberry", "raspberry", "blackberry", "currant"];
    const VINE: &[&str] = &["grape", "kiwi", "passion"];
    const ANNUAL: &[&str] = &["tomato", "strawberry", "pepper", "melon", "squash", "lettuce"];

    if TREE.iter().any(|k| name.contains(k)) {
        Some(Lifecycle::TreePerennial)
    } else if BUSH.iter().any(|k| name.contains(k)) {
        Some(Lifecycle::BushPerennial)
    } else if VINE.iter().any(|k| name.contains(k)) {
        Some(Lifecycle::VinePerennial)
    } else if ANNUAL.iter().any(|k| name.contains(k)) {
        Some(Lifecycle::AnnualRow)
    } else {
        None
    }
}

/// Offline data-quality lint: compare each cataloged lifecycle against the
/// keyword inference and report disagreements. Run at curation time, never
/// during prediction.
pub fn keyword_lint<'a>(
    rows: impl IntoIterator<Item = (&'a str, Option<Lifecycle>)>,
) -> Vec<LifecycleLintFinding> {
    let mut findings = Vec::new();
    for (crop_name, cataloged) in rows {
        let inferred = infer_from_name(crop_name);
        let disagrees = match (cataloged, inferred) {
            (Some(a), Some(b)) => a != b,
            (None, Some(_)) => true, // inferable but uncataloged
            _ => false,
        };
        if disagrees {
            findings.push(LifecycleLintFinding {
                crop_name: crop_name.to_string(),
                cataloged,
                inferred,
            });
        }
    }
    findings
}
