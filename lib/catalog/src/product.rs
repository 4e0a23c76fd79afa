use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical chocolate base type.
///
/// Catalog labels are often qualified ("Dark Premium", "Milk 33%"); only the
/// first whitespace-separated token carries the base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BaseType {
    Dark,
    Milk,
    White,
    Ruby,
}

impl BaseType {
    pub const ALL: [BaseType; 4] = [BaseType::Dark, BaseType::Milk, BaseType::White, BaseType::Ruby];

    /// Parse the canonical base type from a (possibly qualified) label
    pub fn from_label(label: &str) -> Option<Self> {
        let token = label.split_whitespace().next()?;
        Self::ALL
            .into_iter()
            .find(|base| token.eq_ignore_ascii_case(base.as_str()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Dark => "Dark",
            BaseType::Milk => "Milk",
            BaseType::White => "White",
            BaseType::Ruby => "Ruby",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product line (Standard / Premium / Sugar-Free)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductType {
    Standard,
    Premium,
    #[serde(rename = "Sugar-Free")]
    SugarFree,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [ProductType::Standard, ProductType::Premium, ProductType::SugarFree];

    pub fn from_label(label: &str) -> Option<Self> {
        let key = squash(label);
        if key.contains("sugarfree") {
            Some(ProductType::SugarFree)
        } else if key.contains("premium") {
            Some(ProductType::Premium)
        } else if key.contains("standard") {
            Some(ProductType::Standard)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Standard => "Standard",
            ProductType::Premium => "Premium",
            ProductType::SugarFree => "Sugar-Free",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical delivery format (the classification table's moulding type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryFormat {
    Drops,
    Block,
    Callets,
    Easymelt,
}

impl DeliveryFormat {
    pub const ALL: [DeliveryFormat; 4] = [
        DeliveryFormat::Drops,
        DeliveryFormat::Block,
        DeliveryFormat::Callets,
        DeliveryFormat::Easymelt,
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        let key = squash(label);
        Self::ALL
            .into_iter()
            .find(|format| key.contains(&format.as_str().to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryFormat::Drops => "Drops",
            DeliveryFormat::Block => "Block",
            DeliveryFormat::Callets => "Callets",
            DeliveryFormat::Easymelt => "Easymelt",
        }
    }
}

impl fmt::Display for DeliveryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric technical attributes that requirements may target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalAttribute {
    Viscosity,
    Ph,
    Fineness,
    ShelfLife,
}

impl TechnicalAttribute {
    pub const ALL: [TechnicalAttribute; 4] = [
        TechnicalAttribute::Viscosity,
        TechnicalAttribute::Ph,
        TechnicalAttribute::Fineness,
        TechnicalAttribute::ShelfLife,
    ];

    /// Accepts column-style ("Shelf_Life", "pH") and key-style ("shelf_life") names
    pub fn parse(name: &str) -> Option<Self> {
        match squash(name).as_str() {
            "viscosity" => Some(TechnicalAttribute::Viscosity),
            "ph" => Some(TechnicalAttribute::Ph),
            "fineness" => Some(TechnicalAttribute::Fineness),
            "shelflife" => Some(TechnicalAttribute::ShelfLife),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicalAttribute::Viscosity => "viscosity",
            TechnicalAttribute::Ph => "ph",
            TechnicalAttribute::Fineness => "fineness",
            TechnicalAttribute::ShelfLife => "shelf_life",
        }
    }
}

impl fmt::Display for TechnicalAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase and drop everything that is not alphanumeric
fn squash(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A row of the classification table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub material_code: String,
    pub description: String,
    pub category: String,
    pub region: String,
    pub base_type: String,
    pub product_type: String,
    pub moulding_type: String,
    pub viscosity: Option<f64>,
    pub ph: Option<f64>,
    pub fineness: Option<i64>,
    pub shelf_life: Option<i64>,
    #[serde(default)]
    pub kosher: bool,
    #[serde(default)]
    pub country_claim: Option<String>,
    #[serde(default)]
    pub customer_dedicated: Option<String>,
    #[serde(default)]
    pub project_phase: Option<String>,
}

impl ProductRecord {
    /// Production-region code: the first two characters of the material code
    pub fn region_code(&self) -> &str {
        self.material_code.get(..2).unwrap_or(&self.material_code)
    }

    pub fn base_type_kind(&self) -> Option<BaseType> {
        BaseType::from_label(&self.base_type)
    }

    pub fn product_type_kind(&self) -> Option<ProductType> {
        ProductType::from_label(&self.product_type)
    }

    pub fn delivery_format(&self) -> Option<DeliveryFormat> {
        DeliveryFormat::from_label(&self.moulding_type)
    }

    pub fn technical(&self, attribute: TechnicalAttribute) -> Option<f64> {
        match attribute {
            TechnicalAttribute::Viscosity => self.viscosity,
            TechnicalAttribute::Ph => self.ph,
            TechnicalAttribute::Fineness => self.fineness.map(|v| v as f64),
            TechnicalAttribute::ShelfLife => self.shelf_life.map(|v| v as f64),
        }
    }
}

/// A row of the nutrition table (per 100 g)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NutritionRecord {
    pub material_code: String,
    pub energy_kcal: Option<f64>,
    pub energy_kj: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbohydrates_g: Option<f64>,
    pub sugars_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub saturated_fat_g: Option<f64>,
    pub trans_fat_g: Option<f64>,
    pub fibre_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub region: Option<String>,
}

/// A row of the allergen table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllergenRecord {
    pub material_code: String,
    pub contains_milk: bool,
    pub contains_soya: bool,
    pub contains_nuts: bool,
    pub contains_gluten: bool,
    pub suitable_for_vegans: bool,
    pub suitable_for_vegetarians: bool,
}

/// Viscosity window for one production technique in one segment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechniqueParameters {
    pub technique: String,
    pub segment: String,
    pub min_viscosity: Option<f64>,
    pub max_viscosity: Option<f64>,
}

/// A product joined with its nutrition and allergen rows
#[derive(Debug, Clone, Copy)]
pub struct ProductView<'a> {
    pub row: usize,
    pub product: &'a ProductRecord,
    pub nutrition: Option<&'a NutritionRecord>,
    pub allergens: Option<&'a AllergenRecord>,
}

impl<'a> ProductView<'a> {
    pub fn material_code(&self) -> &'a str {
        &self.product.material_code
    }

    pub fn protein_g(&self) -> Option<f64> {
        self.nutrition.and_then(|n| n.protein_g)
    }

    /// Denormalized copy for result payloads
    pub fn details(&self) -> ProductDetails {
        let p = self.product;
        ProductDetails {
            base_type: p.base_type.clone(),
            product_type: p.product_type.clone(),
            moulding_type: p.moulding_type.clone(),
            category: p.category.clone(),
            region: p.region.clone(),
            region_code: p.region_code().to_string(),
            viscosity: p.viscosity,
            ph: p.ph,
            fineness: p.fineness,
            shelf_life: p.shelf_life,
            kosher: p.kosher,
            country_claim: p.country_claim.clone(),
            customer_dedicated: p.customer_dedicated.clone(),
            project_phase: p.project_phase.clone(),
            protein_g: self.protein_g(),
            nutrition: self.nutrition.cloned(),
            allergens: self.allergens.cloned(),
        }
    }
}

/// Denormalized product/nutrition/allergen view attached to every result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDetails {
    pub base_type: String,
    pub product_type: String,
    pub moulding_type: String,
    pub category: String,
    pub region: String,
    pub region_code: String,
    pub viscosity: Option<f64>,
    pub ph: Option<f64>,
    pub fineness: Option<i64>,
    pub shelf_life: Option<i64>,
    pub kosher: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_claim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_dedicated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_phase: Option<String>,
    pub protein_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergens: Option<AllergenRecord>,
}
