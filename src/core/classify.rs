//! Product classification by keyword
//!
//! Product names coming out of the management system carry their category
//! as a leading word ("HERBICIDA ROUNDUP ORIGINAL"). The classifier walks an
//! ordered rule table and returns the first category whose keyword occurs in
//! the name. More specific rules sit above generic ones.

use serde::{Deserialize, Serialize};

use crate::core::text::fold_upper;

/// Product category
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Herbicides,
    Fungicides,
    Insecticides,
    Nematicides,
    FoliarFertilizers,
    ChemicalFertilizers,
    CorrectiveFertilizers,
    Oils,
    Seeds,
    Adjuvants,
    /// Store-floor category, only assigned from a sales report group
    Lubricants,
    /// Store-floor category, only assigned from a sales report group
    SafetyEquipment,
    /// Store-floor category, only assigned from a sales report group
    FarmAccessories,
    #[default]
    Other,
}

impl Category {
    /// Stable key used in storage and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Herbicides => "herbicides",
            Category::Fungicides => "fungicides",
            Category::Insecticides => "insecticides",
            Category::Nematicides => "nematicides",
            Category::FoliarFertilizers => "foliar_fertilizers",
            Category::ChemicalFertilizers => "chemical_fertilizers",
            Category::CorrectiveFertilizers => "corrective_fertilizers",
            Category::Oils => "oils",
            Category::Seeds => "seeds",
            Category::Adjuvants => "adjuvants",
            Category::Lubricants => "lubricants",
            Category::SafetyEquipment => "safety_equipment",
            Category::FarmAccessories => "farm_accessories",
            Category::Other => "other",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Herbicides => "Herbicides",
            Category::Fungicides => "Fungicides",
            Category::Insecticides => "Insecticides",
            Category::Nematicides => "Nematicides",
            Category::FoliarFertilizers => "Foliar Fertilizers",
            Category::ChemicalFertilizers => "Chemical Fertilizers",
            Category::CorrectiveFertilizers => "Corrective Fertilizers",
            Category::Oils => "Oils",
            Category::Seeds => "Seeds",
            Category::Adjuvants => "Adjuvants",
            Category::Lubricants => "Lubricants",
            Category::SafetyEquipment => "Safety Equipment",
            Category::FarmAccessories => "Farm Accessories",
            Category::Other => "Other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Herbicides,
            Category::Fungicides,
            Category::Insecticides,
            Category::Nematicides,
            Category::FoliarFertilizers,
            Category::ChemicalFertilizers,
            Category::CorrectiveFertilizers,
            Category::Oils,
            Category::Seeds,
            Category::Adjuvants,
            Category::Lubricants,
            Category::SafetyEquipment,
            Category::FarmAccessories,
            Category::Other,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Ordered classification rules. Keywords are uppercase with accents folded.
const RULES: &[(Category, &[&str])] = &[
    (Category::Herbicides, &["HERBICIDA"]),
    (Category::Fungicides, &["FUNGICIDA"]),
    (Category::Insecticides, &["INSETICIDA"]),
    (Category::Nematicides, &["NEMATICIDA"]),
    (Category::FoliarFertilizers, &["ADUBO FOLIAR"]),
    (Category::ChemicalFertilizers, &["ADUBO Q"]),
    (Category::CorrectiveFertilizers, &["ADUBO CORRETIVO", "CALCARIO"]),
    (Category::Oils, &["OLEO"]),
    (Category::Seeds, &["SEMENTE"]),
    (Category::Adjuvants, &["ADJUVANTE", "ESPALHANTE"]),
];

/// Classify a product by its display name
pub fn classify(product_name: &str) -> Category {
    let name = fold_upper(product_name);
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| name.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Category words stripped from the front of a name for compact display
const DISPLAY_PREFIXES: &[&str] = &[
    "HERBICIDA ",
    "FUNGICIDA ",
    "INSETICIDA ",
    "NEMATICIDA ",
    "ADUBO FOLIAR ",
    "ADUBO Q.",
    "OLEO VEGETAL ",
    "OLEO MINERAL ",
    "ÓLEO VEGETAL ",
    "ÓLEO MINERAL ",
    "ADJUVANTE ",
    "SEMENTE ",
];

/// Strip a known category prefix from a product name
///
/// Returns the input unchanged when no prefix matches.
pub fn short_display_name(product_name: &str) -> &str {
    for prefix in DISPLAY_PREFIXES {
        let len = prefix.len();
        let Some(head) = product_name.get(..len) else {
            continue;
        };
        if head.to_uppercase() == *prefix {
            return product_name[len..].trim();
        }
    }
    product_name
}

/// Map a sales report "product group" label onto a category
///
/// `None` means the group carries no usable category and the product should
/// be classified by name instead.
pub fn normalize_group(group: &str) -> Option<Category> {
    match fold_upper(group.trim()).as_str() {
        "HERBICIDAS" => Some(Category::Herbicides),
        "FUNGICIDAS" => Some(Category::Fungicides),
        "INSETICIDAS" => Some(Category::Insecticides),
        "NEMATICIDAS" => Some(Category::Nematicides),
        "ADUBOS FOLIARES" => Some(Category::FoliarFertilizers),
        "ADUBOS QUIMICOS" => Some(Category::ChemicalFertilizers),
        "ADUBOS CORRETIVOS" => Some(Category::CorrectiveFertilizers),
        "OLEO MINERAL E VEGETAL" | "OLEOS" => Some(Category::Oils),
        "SEMENTES" => Some(Category::Seeds),
        "ADJUVANTES" => Some(Category::Adjuvants),
        "LUBRIFICANTES" => Some(Category::Lubricants),
        "EPI" => Some(Category::SafetyEquipment),
        "ACESSORIOS DE FAZENDA" => Some(Category::FarmAccessories),
        _ => None,
    }
}
