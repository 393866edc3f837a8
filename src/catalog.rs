//! Cultivar and Rootstock Catalog
//!
//! Genetic reference data: each cultivar carries its lifecycle (resolved to
//! the closed tagged union at load time), its Brix baseline, and a maturity
//! profile; rootstocks carry an additive Brix delta. Consumed read-only by
//! the compositor.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::lifecycle::{AgeCurveKind, Lifecycle};
use crate::EngineError;

/// Perennial maturity characteristics of a cultivar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaturityProfile {
    /// Inclusive age range (years) where genetic potential is realized
    pub prime_age_range_years: Option<(u32, u32)>,
    pub years_to_first_bearing: Option<u32>,
    /// Explicit curve override; defaults to the lifecycle's standard curve
    pub age_curve: Option<AgeCurveKind>,
}

impl MaturityProfile {
    pub fn annual() -> Self {
        MaturityProfile {
            prime_age_range_years: None,
            years_to_first_bearing: None,
            age_curve: None,
        }
    }
}

/// A specific variety of a crop. The cultivar sets the genetic ceiling for
/// quality; everything else in the prediction modifies this baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cultivar {
    pub id: String,
    pub name: String,
    pub crop_id: String,
    /// None when the catalog row had no recognizable lifecycle; downstream
    /// this degrades confidence rather than erroring
    pub lifecycle: Option<Lifecycle>,
    /// Peak Brix under ideal conditions (genetic potential)
    pub base_brix: f64,
    pub maturity: MaturityProfile,
}

/// Rootstock quality modifier for grafted tree crops, additive on Brix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootstockModifier {
    pub id: String,
    pub name: String,
    pub brix_delta: f64,
    /// Crop ids this stock is grafted under
    pub compatible_crops: Vec<String>,
}

/// In-memory catalog keyed by cultivar and rootstock id.
pub struct CultivarCatalog {
    cultivars: FxHashMap<String, Cultivar>,
    rootstocks: FxHashMap<String, RootstockModifier>,
}

impl CultivarCatalog {
    pub fn new() -> Self {
        CultivarCatalog {
            cultivars: FxHashMap::default(),
            rootstocks: FxHashMap::default(),
        }
    }

    /// Catalog seeded with the curated cultivar set and citrus rootstocks.
    pub fn curated() -> Self {
        let mut catalog = Self::new();
        for cultivar in curated_cultivars() {
            catalog.insert_cultivar(cultivar);
        }
        for rootstock in curated_rootstocks() {
            catalog.insert_rootstock(rootstock);
        }
        catalog
    }

    pub fn insert_cultivar(&mut self, cultivar: Cultivar) {
        self.cultivars.insert(cultivar.id.clone(), cultivar);
    }

    pub fn insert_rootstock(&mut self, rootstock: RootstockModifier) {
        self.rootstocks.insert(rootstock.id.clone(), rootstock);
    }

    /// A missing cultivar key is a caller contract violation, not a
    /// degradable input.
    pub fn cultivar(&self, id: &str) -> Result<&Cultivar, EngineError> {
        self.cultivars
            .get(id)
            .ok_or_else(|| EngineError::UnknownCultivar(id.to_string()))
    }

    pub fn rootstock(&self, id: &str) -> Option<&RootstockModifier> {
        self.rootstocks.get(id)
    }

    /// Additive Brix delta and confidence for an optional rootstock choice.
    ///
    /// No rootstock (own-rooted or ungrafted) is fully known: delta 0 at
    /// confidence 1.0. A named but unrecognized stock degrades to a neutral
    /// delta at reduced confidence.
    pub fn rootstock_delta(&self, rootstock_id: Option<&str>) -> (f64, f64) {
        match rootstock_id {
            None => (0.0, 1.0),
            Some(id) => match self.rootstocks.get(id) {
                Some(stock) => (stock.brix_delta, 1.0),
                None => (0.0, 0.6),
            },
        }
    }

    pub fn cultivar_count(&self) -> usize {
        self.cultivars.len()
    }

    pub fn rootstock_count(&self) -> usize {
        self.rootstocks.len()
    }

    /// Iterate cultivars (for lint passes and bulk pipelines).
    pub fn cultivars(&self) -> impl Iterator<Item = &Cultivar> {
        self.cultivars.values()
    }
}

impl Default for CultivarCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn perennial(
    id: &str,
    name: &str,
    crop_id: &str,
    lifecycle: Lifecycle,
    base_brix: f64,
    first_bearing: u32,
    prime: (u32, u32),
) -> Cultivar {
    Cultivar {
        id: id.to_string(),
        name: name.to_string(),
        crop_id: crop_id.to_string(),
        lifecycle: Some(lifecycle),
        base_brix,
        maturity: MaturityProfile {
            prime_age_range_years: Some(prime),
            years_to_first_bearing: Some(first_bearing),
            age_curve: lifecycle.age_curve(),
        },
    }
}

fn annual(id: &str, name: &str, crop_id: &str, base_brix: f64) -> Cultivar {
    Cultivar {
        id: id.to_string(),
        name: name.to_string(),
        crop_id: crop_id.to_string(),
        lifecycle: Some(Lifecycle::AnnualRow),
        base_brix,
        maturity: MaturityProfile::annual(),
    }
}

/// Curated cultivar baselines for the core crop set.
pub fn curated_cultivars() -> Vec<Cultivar> {
    use Lifecycle::*;
    vec![
        perennial("washington_navel", "Washington Navel", "navel_orange", TreePerennial, 12.0, 3, (8, 18)),
        perennial("cara_cara", "Cara Cara Navel", "navel_orange", TreePerennial, 12.5, 3, (8, 18)),
        perennial("ruby_red", "Ruby Red Grapefruit", "grapefruit", TreePerennial, 10.0, 4, (8, 18)),
        perennial("elberta", "Elberta Peach", "peach", TreePerennial, 12.5, 3, (8, 18)),
        perennial("bing", "Bing Cherry", "cherry", TreePerennial, 18.0, 4, (8, 18)),
        perennial("honeycrisp", "Honeycrisp Apple", "apple", TreePerennial, 14.0, 4, (8, 18)),
        perennial("bartlett", "Bartlett Pear", "pear", TreePerennial, 12.0, 4, (8, 18)),
        perennial("bluecrop", "Bluecrop Blueberry", "blueberry", BushPerennial, 12.0, 2, (3, 5)),
        perennial("duke", "Duke Blueberry", "blueberry", BushPerennial, 11.5, 2, (3, 5)),
        annual("florida_radiance", "Florida Radiance Strawberry", "strawberry", 8.5),
        annual("brandywine", "Brandywine Tomato", "tomato", 6.5),
    ]
}

fn citrus_stock(id: &str, name: &str, delta: f64) -> RootstockModifier {
    RootstockModifier {
        id: id.to_string(),
        name: name.to_string(),
        brix_delta: delta,
        compatible_crops: vec![
            "navel_orange".to_string(),
            "grapefruit".to_string(),
            "tangerine".to_string(),
        ],
    }
}

/// Curated citrus rootstocks with their internal-quality deltas.
///
/// Quality stocks (Carrizo, Sour Orange) lift SSC; vigorous stocks (Rough
/// Lemon, Macrophylla) dilute it.
pub fn curated_rootstocks() -> Vec<RootstockModifier> {
    vec![
        citrus_stock("carrizo", "Carrizo Citrange", 0.6),
        citrus_stock("c35", "C-35 Citrange", 0.6),
        citrus_stock("sour_orange", "Sour Orange", 0.5),
        citrus_stock("trifoliate", "Trifoliate Orange", 0.5),
        citrus_stock("cleopatra", "Cleopatra Mandarin", 0.2),
        citrus_stock("swingle", "Swingle Citrumelo", -0.5),
        citrus_stock("rough_lemon", "Rough Lemon", -0.7),
        citrus_stock("volkamer", "Volkamer Lemon", -0.7),
        citrus_stock("macrophylla", "Macrophylla", -0.8),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_cultivar_is_a_contract_violation() {
        let catalog = CultivarCatalog::curated();
        let err = catalog.cultivar("nonexistent").unwrap_err();
        assert!(matches!(err, EngineError::UnknownCultivar(_)));
    }

    #[test]
    fn test_rootstock_delta_resolution() {
        let catalog = CultivarCatalog::curated();

        // Own-rooted: neutral at full confidence
        assert_eq!(catalog.rootstock_delta(None), (0.0, 1.0));

        // Known stock: its delta at full confidence
        assert_eq!(catalog.rootstock_delta(Some("carrizo")), (0.6, 1.0));
        assert_eq!(catalog.rootstock_delta(Some("macrophylla")), (-0.8, 1.0));

        // Unknown stock: neutral at reduced confidence, never an error
        let (delta, confidence) = catalog.rootstock_delta(Some("mystery_stock"));
        assert_eq!(delta, 0.0);
        assert!(confidence < 1.0 && confidence > 0.0);
    }

    #[test]
    fn test_lifecycle_resolved_at_load() {
        let catalog = CultivarCatalog::curated();
        let navel = catalog.cultivar("washington_navel").unwrap();
        assert_eq!(navel.lifecycle, Some(Lifecycle::TreePerennial));
        assert_eq!(navel.maturity.age_curve, Some(AgeCurveKind::TreeStandard));

        let strawberry = catalog.cultivar("florida_radiance").unwrap();
        assert_eq!(strawberry.lifecycle, Some(Lifecycle::AnnualRow));
        assert!(strawberry.maturity.age_curve.is_none());
    }
}
