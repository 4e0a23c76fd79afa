use crate::error::{Error, Result};
use crate::loader::{CatalogPaths, ReferenceTables};
use crate::product::{
    AllergenRecord, NutritionRecord, ProductRecord, ProductView, TechnicalAttribute,
    TechniqueParameters,
};
use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// The immutable reference catalog.
///
/// Products keep their file order (row order is the tie-breaker for every
/// ranking); nutrition and allergen rows are joined by material code.
/// Nothing mutates a catalog after construction, so one instance can be
/// shared behind an `Arc` by any number of concurrent searches.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<ProductRecord>,
    index: AHashMap<String, usize>,
    nutrition: AHashMap<String, NutritionRecord>,
    allergens: AHashMap<String, AllergenRecord>,
    techniques: Vec<TechniqueParameters>,
    ranges: AHashMap<TechnicalAttribute, (f64, f64)>,
    protein_range: Option<(f64, f64)>,
}

impl Catalog {
    /// Read and index the reference tables
    pub fn load(paths: &CatalogPaths) -> Result<Self> {
        let catalog = Self::from_tables(ReferenceTables::read(paths)?)?;
        info!(
            products = catalog.len(),
            nutrition = catalog.nutrition.len(),
            allergens = catalog.allergens.len(),
            techniques = catalog.techniques.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Index already-parsed tables
    pub fn from_tables(tables: ReferenceTables) -> Result<Self> {
        let ReferenceTables { products, techniques, nutrition, allergens } = tables;

        if products.is_empty() {
            return Err(Error::EmptyTable("classification"));
        }
        if techniques.is_empty() {
            return Err(Error::EmptyTable("technical_parameters"));
        }
        if nutrition.is_empty() {
            return Err(Error::EmptyTable("nutrition"));
        }
        if allergens.is_empty() {
            return Err(Error::EmptyTable("allergens"));
        }

        let mut index = AHashMap::with_capacity(products.len());
        for (row, product) in products.iter().enumerate() {
            if index.insert(product.material_code.clone(), row).is_some() {
                return Err(Error::DuplicateKey {
                    table: "classification",
                    code: product.material_code.clone(),
                });
            }
        }

        let nutrition = keyed("nutrition", nutrition, |n| &n.material_code)?;
        let allergens = keyed("allergens", allergens, |a| &a.material_code)?;

        let orphans = nutrition.keys().filter(|code| !index.contains_key(*code)).count()
            + allergens.keys().filter(|code| !index.contains_key(*code)).count();
        if orphans > 0 {
            debug!(orphans, "joined rows without a classification entry");
        }

        let mut ranges = AHashMap::new();
        for attribute in TechnicalAttribute::ALL {
            if let Some(range) = observed_range(products.iter().filter_map(|p| p.technical(attribute))) {
                ranges.insert(attribute, range);
            }
        }
        let protein_range = observed_range(
            products
                .iter()
                .filter_map(|p| nutrition.get(&p.material_code))
                .filter_map(|n| n.protein_g),
        );

        Ok(Self { products, index, nutrition, allergens, techniques, ranges, protein_range })
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// All products in catalog row order
    pub fn all_products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn product(&self, material_code: &str) -> Option<&ProductRecord> {
        self.row_index(material_code).map(|row| &self.products[row])
    }

    pub fn row_index(&self, material_code: &str) -> Option<usize> {
        self.index.get(material_code).copied()
    }

    pub fn nutrition_for(&self, material_code: &str) -> Option<&NutritionRecord> {
        self.nutrition.get(material_code)
    }

    pub fn allergens_for(&self, material_code: &str) -> Option<&AllergenRecord> {
        self.allergens.get(material_code)
    }

    /// Joined view of the product at `row`
    pub fn view(&self, row: usize) -> Option<ProductView<'_>> {
        let product = self.products.get(row)?;
        Some(ProductView {
            row,
            product,
            nutrition: self.nutrition.get(&product.material_code),
            allergens: self.allergens.get(&product.material_code),
        })
    }

    pub fn view_of(&self, material_code: &str) -> Option<ProductView<'_>> {
        self.row_index(material_code).and_then(|row| self.view(row))
    }

    /// Joined views of every product, in row order
    pub fn views(&self) -> impl Iterator<Item = ProductView<'_>> + '_ {
        (0..self.products.len()).filter_map(move |row| self.view(row))
    }

    /// Observed (min, max) of a technical attribute across the catalog
    pub fn technical_range(&self, attribute: TechnicalAttribute) -> Option<(f64, f64)> {
        self.ranges.get(&attribute).copied()
    }

    /// Observed (min, max) protein across products with a nutrition row
    pub fn protein_range(&self) -> Option<(f64, f64)> {
        self.protein_range
    }

    pub fn techniques(&self) -> &[TechniqueParameters] {
        &self.techniques
    }

    /// Union of the viscosity windows of every technique in `segment`
    pub fn viscosity_window(&self, segment: &str) -> Option<(f64, f64)> {
        let rows = self
            .techniques
            .iter()
            .filter(|t| t.segment.trim().eq_ignore_ascii_case(segment.trim()));
        let mut window: Option<(f64, f64)> = None;
        for row in rows {
            let (Some(lo), Some(hi)) = (row.min_viscosity, row.max_viscosity) else {
                continue;
            };
            window = Some(match window {
                Some((min, max)) => (min.min(lo), max.max(hi)),
                None => (lo, hi),
            });
        }
        window
    }

    pub fn summary(&self) -> CatalogSummary {
        let technical_ranges = self
            .ranges
            .iter()
            .map(|(attribute, range)| (attribute.as_str().to_string(), *range))
            .collect();

        let mut segments: Vec<&str> = self.techniques.iter().map(|t| t.segment.as_str()).collect();
        segments.sort_unstable();
        segments.dedup();
        let viscosity_windows = segments
            .into_iter()
            .filter_map(|s| self.viscosity_window(s).map(|w| (s.to_string(), w)))
            .collect();

        CatalogSummary {
            products: self.products.len(),
            nutrition_rows: self.nutrition.len(),
            allergen_rows: self.allergens.len(),
            techniques: self.techniques.len(),
            technical_ranges,
            protein_range: self.protein_range,
            viscosity_windows,
        }
    }
}

/// Table sizes and precomputed ranges, for diagnostics
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogSummary {
    pub products: usize,
    pub nutrition_rows: usize,
    pub allergen_rows: usize,
    pub techniques: usize,
    pub technical_ranges: BTreeMap<String, (f64, f64)>,
    pub protein_range: Option<(f64, f64)>,
    pub viscosity_windows: BTreeMap<String, (f64, f64)>,
}

fn keyed<T>(
    table: &'static str,
    rows: Vec<T>,
    key: impl Fn(&T) -> &String,
) -> Result<AHashMap<String, T>> {
    let mut map = AHashMap::with_capacity(rows.len());
    for row in rows {
        let code = key(&row).clone();
        if map.contains_key(&code) {
            return Err(Error::DuplicateKey { table, code });
        }
        map.insert(code, row);
    }
    Ok(map)
}

fn observed_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}
