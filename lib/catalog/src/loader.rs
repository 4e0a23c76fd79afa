//! CSV loading for the four reference tables
//!
//! Header names are matched loosely (case and punctuation are ignored), so
//! `Material_Code`, `material code` and `MATERIAL-CODE` all resolve to the
//! join key. Numeric cells that cannot be parsed are kept as absent values
//! and reported once through `tracing`.

use crate::error::{Error, Result};
use crate::product::{AllergenRecord, NutritionRecord, ProductRecord, TechniqueParameters};
use ahash::AHashMap;
use csv::StringRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CLASSIFICATION_FILE: &str = "01_Classification_New.csv";
pub const TECHNICAL_PARAMETERS_FILE: &str = "01_Technical_parameters_per_Production_Technique.csv";
pub const NUTRITION_FILE: &str = "03_Nutrition.csv";
pub const ALLERGENS_FILE: &str = "04_Allergens.csv";

const CLASSIFICATION: &str = "classification";
const TECHNICAL_PARAMETERS: &str = "technical_parameters";
const NUTRITION: &str = "nutrition";
const ALLERGENS: &str = "allergens";

/// Locations of the reference tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    pub classification: PathBuf,
    pub technical_parameters: PathBuf,
    pub nutrition: PathBuf,
    pub allergens: PathBuf,
}

impl CatalogPaths {
    /// Standard file names under one directory
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            classification: dir.join(CLASSIFICATION_FILE),
            technical_parameters: dir.join(TECHNICAL_PARAMETERS_FILE),
            nutrition: dir.join(NUTRITION_FILE),
            allergens: dir.join(ALLERGENS_FILE),
        }
    }
}

/// Parsed, not yet indexed, reference tables
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub products: Vec<ProductRecord>,
    pub techniques: Vec<TechniqueParameters>,
    pub nutrition: Vec<NutritionRecord>,
    pub allergens: Vec<AllergenRecord>,
}

impl ReferenceTables {
    pub fn read(paths: &CatalogPaths) -> Result<Self> {
        let products = read_classification(&paths.classification)?;
        let techniques = read_techniques(&paths.technical_parameters)?;
        let nutrition = read_nutrition(&paths.nutrition)?;
        let allergens = read_allergens(&paths.allergens)?;

        debug!(
            products = products.len(),
            techniques = techniques.len(),
            nutrition = nutrition.len(),
            allergens = allergens.len(),
            "reference tables parsed"
        );

        Ok(Self { products, techniques, nutrition, allergens })
    }
}

/// Parse a numeric cell the way requirement values and catalog cells are
/// written in practice: surrounding whitespace, a trailing `%` and a decimal
/// comma are all accepted.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().trim_end_matches('%').trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "true" | "x"
    )
}

fn header_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Header lookup for one table
struct Columns {
    table: &'static str,
    index: AHashMap<String, usize>,
}

impl Columns {
    fn new(table: &'static str, headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (header_key(name), i))
            .collect();
        Self { table, index }
    }

    fn get(&self, column: &str) -> Option<usize> {
        self.index.get(&header_key(column)).copied()
    }

    fn join_key(&self) -> Result<usize> {
        self.get("Material_Code").ok_or(Error::MissingJoinKey(self.table))
    }

    fn require(&self, column: &'static str) -> Result<usize> {
        self.get(column).ok_or(Error::MissingColumn { table: self.table, column })
    }
}

/// One data row with its position, for diagnostics
struct Row<'a> {
    table: &'static str,
    line: usize,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    fn text(&self, col: Option<usize>) -> String {
        col.and_then(|i| self.record.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    fn opt_text(&self, col: Option<usize>) -> Option<String> {
        let text = self.text(col);
        if text.is_empty() { None } else { Some(text) }
    }

    fn key(&self, col: usize) -> Result<String> {
        let code = self.text(Some(col));
        if code.is_empty() {
            return Err(Error::MalformedRow {
                table: self.table,
                row: self.line,
                message: "empty Material_Code".to_string(),
            });
        }
        Ok(code)
    }

    fn number(&self, col: Option<usize>, column: &str) -> Option<f64> {
        let raw = col.and_then(|i| self.record.get(i))?.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = parse_number(raw);
        if parsed.is_none() {
            warn!(
                table = self.table,
                row = self.line,
                column,
                value = raw,
                "non-numeric cell treated as missing"
            );
        }
        parsed
    }

    fn integer(&self, col: Option<usize>, column: &str) -> Option<i64> {
        self.number(col, column).map(|v| v.round() as i64)
    }

    fn flag(&self, col: Option<usize>) -> bool {
        col.and_then(|i| self.record.get(i)).map(parse_flag).unwrap_or(false)
    }
}

fn read_table(path: &Path, table: &'static str) -> Result<(Columns, Vec<StringRecord>)> {
    if !path.is_file() {
        return Err(Error::MissingTable { table, path: path.to_path_buf() });
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let columns = Columns::new(table, reader.headers()?);
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(Error::EmptyTable(table));
    }
    Ok((columns, records))
}

fn read_classification(path: &Path) -> Result<Vec<ProductRecord>> {
    let (cols, records) = read_table(path, CLASSIFICATION)?;
    let code = cols.join_key()?;
    let description = cols.require("Material_Description")?;
    let base_type = cols.require("Base_Type")?;
    let moulding_type = cols.require("Moulding_Type")?;
    let product_type = cols.require("Product_Type")?;
    let category = cols.get("Category");
    let region = cols.get("Region");
    let viscosity = cols.get("Viscosity");
    let ph = cols.get("pH");
    let fineness = cols.get("Fineness");
    let shelf_life = cols.get("Shelf_Life");
    let kosher = cols.get("Kosher_Certificate");
    let country_claim = cols.get("Country_Claim");
    let customer_dedicated = cols.get("Customer_Dedicated");
    let project_phase = cols.get("Proj_Phase");

    records
        .iter()
        .enumerate()
        .map(|(i, record)| -> Result<ProductRecord> {
            let row = Row { table: CLASSIFICATION, line: i + 2, record };
            Ok(ProductRecord {
                material_code: row.key(code)?,
                description: row.text(Some(description)),
                category: row.text(category),
                region: row.text(region),
                base_type: row.text(Some(base_type)),
                product_type: row.text(Some(product_type)),
                moulding_type: row.text(Some(moulding_type)),
                viscosity: row.number(viscosity, "Viscosity"),
                ph: row.number(ph, "pH"),
                fineness: row.integer(fineness, "Fineness"),
                shelf_life: row.integer(shelf_life, "Shelf_Life"),
                kosher: row.flag(kosher),
                country_claim: row.opt_text(country_claim),
                customer_dedicated: row.opt_text(customer_dedicated),
                project_phase: row.opt_text(project_phase),
            })
        })
        .collect()
}

fn read_techniques(path: &Path) -> Result<Vec<TechniqueParameters>> {
    let (cols, records) = read_table(path, TECHNICAL_PARAMETERS)?;
    let technique = cols.require("Technique")?;
    let segment = cols.require("Segment")?;
    let min_viscosity = cols.get("Min_Viscosity");
    let max_viscosity = cols.get("Max_Viscosity");

    Ok(records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let row = Row { table: TECHNICAL_PARAMETERS, line: i + 2, record };
            TechniqueParameters {
                technique: row.text(Some(technique)),
                segment: row.text(Some(segment)),
                min_viscosity: row.number(min_viscosity, "Min_Viscosity"),
                max_viscosity: row.number(max_viscosity, "Max_Viscosity"),
            }
        })
        .collect())
}

fn read_nutrition(path: &Path) -> Result<Vec<NutritionRecord>> {
    let (cols, records) = read_table(path, NUTRITION)?;
    let code = cols.join_key()?;
    let protein = cols.require("Protein_g")?;
    let energy_kcal = cols.get("Energy_Value_kCal");
    let energy_kj = cols.get("Energy_Value_kJ");
    let carbohydrates = cols.get("Total_Carbohydrates_g");
    let sugars = cols.get("Sugars_g");
    let fat = cols.get("Total_Fat_g");
    let saturated = cols.get("Saturated_Fatty_Acid_g");
    let trans = cols.get("Trans_Fatty_Acid_Tfa_g");
    let fibre = cols.get("Fibre_g");
    let sodium = cols.get("Sodium_mg");
    let region = cols.get("Region");

    records
        .iter()
        .enumerate()
        .map(|(i, record)| -> Result<NutritionRecord> {
            let row = Row { table: NUTRITION, line: i + 2, record };
            Ok(NutritionRecord {
                material_code: row.key(code)?,
                energy_kcal: row.number(energy_kcal, "Energy_Value_kCal"),
                energy_kj: row.number(energy_kj, "Energy_Value_kJ"),
                protein_g: row.number(Some(protein), "Protein_g"),
                carbohydrates_g: row.number(carbohydrates, "Total_Carbohydrates_g"),
                sugars_g: row.number(sugars, "Sugars_g"),
                fat_g: row.number(fat, "Total_Fat_g"),
                saturated_fat_g: row.number(saturated, "Saturated_Fatty_Acid_g"),
                trans_fat_g: row.number(trans, "Trans_Fatty_Acid_Tfa_g"),
                fibre_g: row.number(fibre, "Fibre_g"),
                sodium_mg: row.number(sodium, "Sodium_mg"),
                region: row.opt_text(region),
            })
        })
        .collect()
}

fn read_allergens(path: &Path) -> Result<Vec<AllergenRecord>> {
    let (cols, records) = read_table(path, ALLERGENS)?;
    let code = cols.join_key()?;
    let milk = cols.get("Contains_Milk");
    let soya = cols.get("Contains_Soya");
    let nuts = cols.get("Contains_Nuts");
    let gluten = cols.get("Contains_Gluten");
    let vegans = cols.get("Suitable_For_Vegans");
    let vegetarians = cols.get("Suitable_For_Vegetarians");

    records
        .iter()
        .enumerate()
        .map(|(i, record)| -> Result<AllergenRecord> {
            let row = Row { table: ALLERGENS, line: i + 2, record };
            Ok(AllergenRecord {
                material_code: row.key(code)?,
                contains_milk: row.flag(milk),
                contains_soya: row.flag(soya),
                contains_nuts: row.flag(nuts),
                contains_gluten: row.flag(gluten),
                suitable_for_vegans: row.flag(vegans),
                suitable_for_vegetarians: row.flag(vegetarians),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("8"), Some(8.0));
        assert_eq!(parse_number(" 7,5 "), Some(7.5));
        assert_eq!(parse_number("12%"), Some(12.0));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_read_classification_with_loose_headers() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            CLASSIFICATION_FILE,
            "material code,Material_Description,BASE_TYPE,Moulding_Type,Product_Type,Viscosity,pH,Fineness,Kosher_Certificate\n\
             BE1001,Dark drops,Dark,Drops,Standard,2.4,abc,18.0,Yes\n",
        );
        let products = read_classification(&dir.path().join(CLASSIFICATION_FILE)).unwrap();
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.material_code, "BE1001");
        assert_eq!(p.viscosity, Some(2.4));
        assert_eq!(p.ph, None);
        assert_eq!(p.fineness, Some(18));
        assert!(p.kosher);
        assert_eq!(p.region, "");
    }

    #[test]
    fn test_missing_join_key() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), NUTRITION_FILE, "Code,Protein_g\nBE1001,7\n");
        let err = read_nutrition(&dir.path().join(NUTRITION_FILE)).unwrap_err();
        assert!(matches!(err, Error::MissingJoinKey("nutrition")));
    }

    #[test]
    fn test_empty_and_missing_tables() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ALLERGENS_FILE, "Material_Code,Contains_Milk\n");
        assert!(matches!(
            read_allergens(&dir.path().join(ALLERGENS_FILE)),
            Err(Error::EmptyTable("allergens"))
        ));
        assert!(matches!(
            read_techniques(&dir.path().join(TECHNICAL_PARAMETERS_FILE)),
            Err(Error::MissingTable { table: "technical_parameters", .. })
        ));
    }

    #[test]
    fn test_empty_material_code_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ALLERGENS_FILE, "Material_Code,Contains_Milk\nBE1,yes\n,no\n");
        let err = read_allergens(&dir.path().join(ALLERGENS_FILE)).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { row: 3, .. }));
    }
}
