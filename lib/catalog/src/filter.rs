// Row predicates over the joined product view
use crate::product::{ProductView, TechnicalAttribute};

pub trait Filter {
    fn matches(&self, view: &ProductView<'_>) -> bool;
}

/// Columns a predicate can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Category,
    Region,
    RegionCode,
    BaseType,
    ProductType,
    MouldingType,
    Technical(TechnicalAttribute),
    /// Joined from the nutrition table
    Protein,
}

/// Text comparisons are case-insensitive. A missing cell never matches,
/// except under `Not`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Contains { field: ProductField, value: String },
    Equals { field: ProductField, value: String },
    OneOf { field: ProductField, values: Vec<String> },
    Between { field: ProductField, min: f64, max: f64 },
    AtLeast { field: ProductField, min: f64 },
    And(Vec<FilterCondition>),
    Or(Vec<FilterCondition>),
    Not(Box<FilterCondition>),
}

impl FilterCondition {
    pub fn contains(field: ProductField, value: &str) -> Self {
        FilterCondition::Contains { field, value: value.to_lowercase() }
    }

    pub fn equals(field: ProductField, value: &str) -> Self {
        FilterCondition::Equals { field, value: value.to_lowercase() }
    }

    pub fn one_of<I, S>(field: ProductField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FilterCondition::OneOf {
            field,
            values: values.into_iter().map(|v| v.as_ref().to_lowercase()).collect(),
        }
    }

    fn text<'a>(view: &ProductView<'a>, field: ProductField) -> Option<&'a str> {
        let p = view.product;
        match field {
            ProductField::Category => Some(&p.category),
            ProductField::Region => Some(&p.region),
            ProductField::RegionCode => Some(p.region_code()),
            ProductField::BaseType => Some(&p.base_type),
            ProductField::ProductType => Some(&p.product_type),
            ProductField::MouldingType => Some(&p.moulding_type),
            ProductField::Technical(_) | ProductField::Protein => None,
        }
    }

    fn number(view: &ProductView<'_>, field: ProductField) -> Option<f64> {
        match field {
            ProductField::Technical(attribute) => view.product.technical(attribute),
            ProductField::Protein => view.protein_g(),
            _ => None,
        }
    }

    fn matches_condition(condition: &FilterCondition, view: &ProductView<'_>) -> bool {
        match condition {
            FilterCondition::Contains { field, value } => Self::text(view, *field)
                .map(|v| v.to_lowercase().contains(value.as_str()))
                .unwrap_or(false),
            FilterCondition::Equals { field, value } => Self::text(view, *field)
                .map(|v| v.trim().to_lowercase() == *value)
                .unwrap_or(false),
            FilterCondition::OneOf { field, values } => Self::text(view, *field)
                .map(|v| {
                    let v = v.trim().to_lowercase();
                    values.iter().any(|candidate| *candidate == v)
                })
                .unwrap_or(false),
            FilterCondition::Between { field, min, max } => Self::number(view, *field)
                .map(|v| v >= *min && v <= *max)
                .unwrap_or(false),
            FilterCondition::AtLeast { field, min } => Self::number(view, *field)
                .map(|v| v >= *min)
                .unwrap_or(false),
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::matches_condition(c, view))
            }
            FilterCondition::Or(conditions) => {
                conditions.iter().any(|c| Self::matches_condition(c, view))
            }
            FilterCondition::Not(condition) => !Self::matches_condition(condition, view),
        }
    }
}

impl Filter for FilterCondition {
    fn matches(&self, view: &ProductView<'_>) -> bool {
        Self::matches_condition(self, view)
    }
}
