// Region matching shared by filters, scoring and relaxation details
use cacao_catalog::{FilterCondition, ProductField, ProductRecord};
use cacao_similarity::{is_region_group, region_group};

/// How a product's origin relates to a requested region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionAffinity {
    /// Same region label or code, or a code inside a requested group
    Exact,
    /// Same region group only
    Group,
    Outside,
}

impl RegionAffinity {
    pub fn of(requested: &str, product: &ProductRecord) -> Self {
        let requested = requested.trim();
        let code = product.region_code();
        if product.region.trim().eq_ignore_ascii_case(requested) || code.eq_ignore_ascii_case(requested) {
            return RegionAffinity::Exact;
        }

        let members = region_group(requested).map(|(_, codes)| codes).unwrap_or_default();
        let in_group = members.iter().any(|c| c.eq_ignore_ascii_case(code));
        match (in_group, is_region_group(requested)) {
            (true, true) => RegionAffinity::Exact,
            (true, false) => RegionAffinity::Group,
            _ => RegionAffinity::Outside,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            RegionAffinity::Exact => 1.0,
            RegionAffinity::Group => 0.5,
            RegionAffinity::Outside => 0.0,
        }
    }
}

/// Predicate admitting exactly the `RegionAffinity::Exact` products
pub fn exact_region_condition(requested: &str) -> FilterCondition {
    let mut alternatives = vec![
        FilterCondition::equals(ProductField::Region, requested.trim()),
        FilterCondition::equals(ProductField::RegionCode, requested.trim()),
    ];
    if is_region_group(requested) {
        if let Some((_, codes)) = region_group(requested) {
            alternatives.push(FilterCondition::one_of(ProductField::RegionCode, codes.iter()));
        }
    }
    FilterCondition::Or(alternatives)
}

/// Predicate admitting anything in the requested region's group.
/// `None` when the region belongs to no known group.
pub fn region_group_condition(requested: &str) -> Option<FilterCondition> {
    let (_, codes) = region_group(requested)?;
    Some(FilterCondition::Or(vec![
        exact_region_condition(requested),
        FilterCondition::one_of(ProductField::RegionCode, codes.iter()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacao_catalog::{Filter, ProductView};

    fn product(code: &str, region: &str) -> ProductRecord {
        ProductRecord {
            material_code: code.to_string(),
            description: String::new(),
            category: "Tablets".to_string(),
            region: region.to_string(),
            base_type: "Milk".to_string(),
            product_type: "Standard".to_string(),
            moulding_type: "Callets".to_string(),
            viscosity: None,
            ph: None,
            fineness: None,
            shelf_life: None,
            kosher: false,
            country_claim: None,
            customer_dedicated: None,
            project_phase: None,
        }
    }

    #[test]
    fn test_affinity() {
        let be = product("BE1001", "EMEA");
        assert_eq!(RegionAffinity::of("be", &be), RegionAffinity::Exact);
        assert_eq!(RegionAffinity::of("EMEA", &be), RegionAffinity::Exact);
        assert_eq!(RegionAffinity::of("EU", &be), RegionAffinity::Exact);
        assert_eq!(RegionAffinity::of("NL", &be), RegionAffinity::Group);
        assert_eq!(RegionAffinity::of("US", &be), RegionAffinity::Outside);
        assert_eq!(RegionAffinity::of("LATAM", &be), RegionAffinity::Outside);
        assert_eq!(RegionAffinity::Group.score(), 0.5);
    }

    #[test]
    fn test_conditions_agree_with_affinity() {
        let products = [
            product("BE1001", "EMEA"),
            product("NL2002", "EMEA"),
            product("US3003", "NAM"),
            product("JP4004", "APAC"),
        ];

        for requested in ["BE", "EU", "NAM", "NL", "JP", "LATAM"] {
            let exact = exact_region_condition(requested);
            let group = region_group_condition(requested);
            for p in &products {
                let view = ProductView { row: 0, product: p, nutrition: None, allergens: None };
                let affinity = RegionAffinity::of(requested, p);
                assert_eq!(exact.matches(&view), affinity == RegionAffinity::Exact, "{requested} {}", p.material_code);
                if let Some(group) = &group {
                    assert_eq!(group.matches(&view), affinity != RegionAffinity::Outside);
                }
            }
        }
        assert!(region_group_condition("LATAM").is_none());
    }
}
