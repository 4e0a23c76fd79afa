// In-memory catalog fixtures for unit tests
use cacao_catalog::{
    AllergenRecord, Catalog, NutritionRecord, ProductRecord, ReferenceTables, TechniqueParameters,
};

pub(crate) struct ProductSpec {
    record: ProductRecord,
    protein: Option<f64>,
    nutrition: bool,
}

impl ProductSpec {
    pub fn new(code: &str, base_type: &str, moulding_type: &str) -> Self {
        Self {
            record: ProductRecord {
                material_code: code.to_string(),
                description: format!("{} {} {}", base_type, moulding_type, code),
                category: "Tablets".to_string(),
                region: "EU".to_string(),
                base_type: base_type.to_string(),
                product_type: "Standard".to_string(),
                moulding_type: moulding_type.to_string(),
                viscosity: None,
                ph: None,
                fineness: None,
                shelf_life: None,
                kosher: false,
                country_claim: None,
                customer_dedicated: None,
                project_phase: None,
            },
            protein: None,
            nutrition: true,
        }
    }

    pub fn product_type(mut self, product_type: &str) -> Self {
        self.record.product_type = product_type.to_string();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.record.category = category.to_string();
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.record.region = region.to_string();
        self
    }

    pub fn viscosity(mut self, viscosity: f64) -> Self {
        self.record.viscosity = Some(viscosity);
        self
    }

    pub fn ph(mut self, ph: f64) -> Self {
        self.record.ph = Some(ph);
        self
    }

    pub fn protein(mut self, protein: f64) -> Self {
        self.protein = Some(protein);
        self
    }

    /// Leave the product out of the nutrition table
    pub fn no_nutrition(mut self) -> Self {
        self.nutrition = false;
        self
    }
}

pub(crate) fn product(code: &str, base_type: &str, product_type: &str, moulding_type: &str) -> ProductSpec {
    ProductSpec::new(code, base_type, moulding_type).product_type(product_type)
}

pub(crate) fn catalog(specs: Vec<ProductSpec>) -> Catalog {
    let mut tables = ReferenceTables {
        products: Vec::new(),
        techniques: vec![TechniqueParameters {
            technique: "Moulding".to_string(),
            segment: "Confectionery".to_string(),
            min_viscosity: Some(2.0),
            max_viscosity: Some(8.0),
        }],
        nutrition: Vec::new(),
        allergens: Vec::new(),
    };

    for spec in specs {
        let code = spec.record.material_code.clone();
        if spec.nutrition {
            tables.nutrition.push(NutritionRecord {
                material_code: code.clone(),
                protein_g: spec.protein,
                ..Default::default()
            });
        }
        tables.allergens.push(AllergenRecord { material_code: code, ..Default::default() });
        tables.products.push(spec.record);
    }

    // The nutrition table may not be empty
    if tables.nutrition.is_empty() {
        tables.nutrition.push(NutritionRecord { material_code: "ZZ0000".to_string(), ..Default::default() });
    }

    Catalog::from_tables(tables).expect("fixture catalog")
}
