//! Static lookup tables
//!
//! Domain knowledge that does not depend on a catalog instance: how close two
//! base types are, how well they pair, which delivery formats substitute for
//! each other, which applications belong to a market segment and which
//! production-region codes form a region group.

use cacao_catalog::{BaseType, DeliveryFormat, ProductType};

fn base_index(base: BaseType) -> usize {
    match base {
        BaseType::Dark => 0,
        BaseType::Milk => 1,
        BaseType::White => 2,
        BaseType::Ruby => 3,
    }
}

fn product_type_index(product_type: ProductType) -> usize {
    match product_type {
        ProductType::Standard => 0,
        ProductType::Premium => 1,
        ProductType::SugarFree => 2,
    }
}

// Rows: requested type. Columns: candidate type. Order: Dark, Milk, White, Ruby.
const BASE_TYPE_SIMILARITY: [[f64; 4]; 4] = [
    [1.0, 0.3, 0.1, 0.2],
    [0.3, 1.0, 0.6, 0.5],
    [0.1, 0.6, 1.0, 0.4],
    [0.2, 0.5, 0.4, 1.0],
];

// Pairing value of two base types: contrast scores high, same type low.
const BASE_TYPE_COMPLEMENTARITY: [[f64; 4]; 4] = [
    [0.2, 0.9, 0.8, 0.7],
    [0.9, 0.2, 0.7, 0.6],
    [0.8, 0.7, 0.2, 0.6],
    [0.7, 0.6, 0.6, 0.1],
];

// Order: Standard, Premium, Sugar-Free. Downgrading from Premium costs more
// than upgrading from Standard.
const PRODUCT_TYPE_SIMILARITY: [[f64; 3]; 3] = [
    [1.0, 0.6, 0.4],
    [0.5, 1.0, 0.3],
    [0.4, 0.3, 1.0],
];

/// Closeness of a candidate base type to the requested one
pub fn base_type_similarity(requested: BaseType, candidate: BaseType) -> f64 {
    BASE_TYPE_SIMILARITY[base_index(requested)][base_index(candidate)]
}

/// Pairing value of two base types, used only for cross-sell
pub fn base_type_complementarity(anchor: BaseType, candidate: BaseType) -> f64 {
    BASE_TYPE_COMPLEMENTARITY[base_index(anchor)][base_index(candidate)]
}

pub fn product_type_similarity(requested: ProductType, candidate: ProductType) -> f64 {
    PRODUCT_TYPE_SIMILARITY[product_type_index(requested)][product_type_index(candidate)]
}

/// Formats accepted in place of `format` when a search is relaxed
pub fn delivery_format_alternatives(format: DeliveryFormat) -> &'static [DeliveryFormat] {
    use DeliveryFormat::*;
    match format {
        Drops => &[Block, Callets, Easymelt],
        Block => &[Drops, Callets, Easymelt],
        Callets => &[Drops, Block, Easymelt],
        Easymelt => &[Drops, Block, Callets],
    }
}

pub fn are_alternative_formats(a: DeliveryFormat, b: DeliveryFormat) -> bool {
    a != b && delivery_format_alternatives(a).contains(&b)
}

/// Market segments and the applications (catalog categories) they cover
pub const MARKET_SEGMENTS: &[(&str, &[&str])] = &[
    ("Confectionery", &["Tablets", "Pralines", "Countlines", "Protein Bars"]),
    ("Bakery", &["Butter cakes", "Celebration cakes", "Laminated pastries"]),
    ("Ice Cream", &["Ice cream bars", "Ice cream cones", "Ice cream sandwiches"]),
    ("Desserts", &["Frozen desserts", "Spoonable desserts", "Yogurt applications"]),
];

/// Canonical segment name and its applications
pub fn segment_applications(segment: &str) -> Option<(&'static str, &'static [&'static str])> {
    MARKET_SEGMENTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(segment.trim()))
        .copied()
}

/// The segment an application belongs to
pub fn segment_of_application(application: &str) -> Option<&'static str> {
    MARKET_SEGMENTS
        .iter()
        .find(|(_, apps)| apps.iter().any(|a| a.eq_ignore_ascii_case(application.trim())))
        .map(|(name, _)| *name)
}

/// Region groups and their production-region codes
pub const REGION_GROUPS: &[(&str, &[&str])] = &[
    ("EU", &["BE", "NL", "PL", "TR"]),
    ("NAM", &["US", "CA"]),
    ("APAC", &["SG", "JP", "AU"]),
];

const REGION_ALIASES: &[(&str, &str)] = &[("EMEA", "EU"), ("EUROPE", "EU"), ("NA", "NAM")];

/// Resolve a group name (or alias) or a member region code to its group
pub fn region_group(region: &str) -> Option<(&'static str, &'static [&'static str])> {
    let key = region.trim().to_ascii_uppercase();
    let key = REGION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, group)| group.to_string())
        .unwrap_or(key);

    REGION_GROUPS
        .iter()
        .find(|(name, codes)| *name == key || codes.contains(&key.as_str()))
        .copied()
}

/// Whether `region` names a group rather than a single region code
pub fn is_region_group(region: &str) -> bool {
    region_group(region).is_some_and(|(_, codes)| {
        !codes.iter().any(|c| c.eq_ignore_ascii_case(region.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_similarity_is_full() {
        for base in BaseType::ALL {
            assert_eq!(base_type_similarity(base, base), 1.0);
        }
        for pt in ProductType::ALL {
            assert_eq!(product_type_similarity(pt, pt), 1.0);
        }
    }

    #[test]
    fn test_domain_closeness() {
        assert!(
            base_type_similarity(BaseType::Milk, BaseType::White)
                > base_type_similarity(BaseType::Dark, BaseType::White)
        );
    }

    #[test]
    fn test_complementarity_rewards_difference() {
        for base in BaseType::ALL {
            let same = base_type_complementarity(base, base);
            for other in BaseType::ALL.into_iter().filter(|b| *b != base) {
                assert!(base_type_complementarity(base, other) > same);
            }
        }
        assert!(base_type_complementarity(BaseType::Dark, BaseType::Milk) >= 0.9);
    }

    #[test]
    fn test_format_alternatives_are_symmetric() {
        for a in DeliveryFormat::ALL {
            assert!(!delivery_format_alternatives(a).contains(&a));
            for b in delivery_format_alternatives(a) {
                assert!(delivery_format_alternatives(*b).contains(&a));
            }
        }
        assert!(are_alternative_formats(DeliveryFormat::Drops, DeliveryFormat::Block));
        assert!(!are_alternative_formats(DeliveryFormat::Drops, DeliveryFormat::Drops));
    }

    #[test]
    fn test_segments() {
        let (name, apps) = segment_applications("bakery").unwrap();
        assert_eq!(name, "Bakery");
        assert_eq!(apps.len(), 3);
        assert_eq!(segment_of_application("protein bars"), Some("Confectionery"));
        assert!(segment_applications("Beverages").is_none());
    }

    #[test]
    fn test_region_groups() {
        assert_eq!(region_group("emea").map(|(g, _)| g), Some("EU"));
        assert_eq!(region_group("nl").map(|(g, _)| g), Some("EU"));
        assert_eq!(region_group("CA").map(|(g, _)| g), Some("NAM"));
        assert!(region_group("LATAM").is_none());
        assert!(is_region_group("APAC"));
        assert!(!is_region_group("JP"));
    }
}
