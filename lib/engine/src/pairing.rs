//! Pairing suggestion rules
//!
//! Rules are keyed by the unordered base-type pair, plus rules on the two
//! product types. When nothing matches, a generic layering suggestion is
//! returned so every recommendation carries at least one idea.

use cacao_catalog::{BaseType, ProductRecord, ProductType};

// Unordered base-type pairs; lookup tries both orders.
const BASE_PAIR_RULES: &[(BaseType, BaseType, &str)] = &[
    (BaseType::Dark, BaseType::Milk, "Layer dark and milk chocolate for a balanced bittersweet bite"),
    (BaseType::Dark, BaseType::White, "Marble dark and white chocolate for a high-contrast finish"),
    (BaseType::Dark, BaseType::Ruby, "Pair a dark shell with a ruby filling for a fruity contrast"),
    (BaseType::Milk, BaseType::White, "Combine milk and white chocolate in a creamy two-tone praline"),
    (BaseType::Milk, BaseType::Ruby, "Use ruby chocolate as a decoration on a milk chocolate base"),
    (BaseType::White, BaseType::Ruby, "Swirl white and ruby chocolate for a pastel marble effect"),
];

/// All suggestions for pairing `anchor` with `candidate`
pub fn pairing_suggestions(anchor: &ProductRecord, candidate: &ProductRecord) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let (Some(a), Some(b)) = (anchor.base_type_kind(), candidate.base_type_kind()) {
        if let Some(rule) = base_pair_rule(a, b) {
            suggestions.push(rule.to_string());
        }
    }

    let types = (anchor.product_type_kind(), candidate.product_type_kind());
    match types {
        (Some(ProductType::Premium), Some(ProductType::Premium)) => {
            suggestions.push("Build a luxury gift assortment from both premium lines".to_string());
        }
        (Some(ProductType::Premium), Some(ProductType::Standard))
        | (Some(ProductType::Standard), Some(ProductType::Premium)) => {
            suggestions.push("Offer a tiered range with a standard entry product and a premium upgrade".to_string());
        }
        _ => {}
    }
    if types.0 == Some(ProductType::SugarFree) || types.1 == Some(ProductType::SugarFree) {
        suggestions.push("Position the pair as a reduced-sugar range".to_string());
    }

    if suggestions.is_empty() {
        suggestions.push(generic_suggestion(anchor, candidate));
    }
    suggestions
}

fn base_pair_rule(a: BaseType, b: BaseType) -> Option<&'static str> {
    BASE_PAIR_RULES
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, rule)| *rule)
}

fn generic_suggestion(anchor: &ProductRecord, candidate: &ProductRecord) -> String {
    let first_token = |label: &str| label.split_whitespace().next().unwrap_or("").to_lowercase();
    format!(
        "Create a layered effect by combining {} and {} chocolate",
        first_token(&anchor.base_type),
        first_token(&candidate.base_type)
    )
}
