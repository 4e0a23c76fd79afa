//! Requirement profiles
//!
//! Upstream extraction hands over loosely typed JSON: numbers arrive as
//! strings ("8%", "7,5"), keys may be missing or unknown, technical specs use
//! column-style names. [`RawRequirementProfile`] accepts all of that and
//! [`RequirementProfile`] is what the searches see. Malformed values are
//! dropped with a warning; they never fail a search.

use cacao_catalog::{parse_number, TechnicalAttribute};
use cacao_similarity::AttributeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// A validated, all-optional requirement. Absent means "no preference".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequirementProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_format: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub technical_specs: BTreeMap<TechnicalAttribute, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_protein_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
}

impl RequirementProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON requirement
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let raw: RawRequirementProfile = serde_json::from_str(json)?;
        Ok(raw.validate())
    }

    pub fn with_base_type(mut self, base_type: &str) -> Self {
        self.base_type = Some(base_type.to_string());
        self
    }

    pub fn with_product_type(mut self, product_type: &str) -> Self {
        self.product_type = Some(product_type.to_string());
        self
    }

    pub fn with_delivery_format(mut self, format: &str) -> Self {
        self.delivery_format = Some(format.to_string());
        self
    }

    pub fn with_technical(mut self, attribute: TechnicalAttribute, target: f64) -> Self {
        self.technical_specs.insert(attribute, target);
        self
    }

    pub fn with_min_protein(mut self, min: f64) -> Self {
        self.min_protein_percentage = Some(min);
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn with_market_segment(mut self, segment: &str) -> Self {
        self.market_segment = Some(segment.to_string());
        self
    }

    pub fn with_application(mut self, application: &str) -> Self {
        self.application = Some(application.to_string());
        self
    }

    /// True when nothing was requested
    pub fn is_empty(&self) -> bool {
        self.base_type.is_none()
            && self.product_type.is_none()
            && self.delivery_format.is_none()
            && self.technical_specs.is_empty()
            && self.min_protein_percentage.is_none()
            && self.region.is_none()
            && self.market_segment.is_none()
            && self.application.is_none()
    }
}

/// Requirement as received from extraction. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRequirementProfile {
    pub base_type: Option<Value>,
    pub product_type: Option<Value>,
    pub delivery_format: Option<Value>,
    pub technical_specs: Option<Value>,
    #[serde(alias = "min_protein", alias = "protein_content")]
    pub min_protein_percentage: Option<Value>,
    pub region: Option<Value>,
    #[serde(alias = "segment")]
    pub market_segment: Option<Value>,
    pub application: Option<Value>,
}

impl RawRequirementProfile {
    pub fn validate(self) -> RequirementProfile {
        RequirementProfile {
            base_type: text("base_type", self.base_type),
            product_type: text("product_type", self.product_type),
            delivery_format: text("delivery_format", self.delivery_format),
            technical_specs: technical_specs(self.technical_specs),
            min_protein_percentage: number("min_protein_percentage", self.min_protein_percentage),
            region: text("region", self.region),
            market_segment: text("market_segment", self.market_segment),
            application: text("application", self.application),
        }
    }
}

impl From<RawRequirementProfile> for RequirementProfile {
    fn from(raw: RawRequirementProfile) -> Self {
        raw.validate()
    }
}

fn text(field: &str, value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        other => {
            warn!(field, value = %other, "ignoring non-text requirement value");
            None
        }
    }
}

fn number(field: &str, value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Null => None,
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => {
            let parsed = parse_number(&s);
            if parsed.is_none() {
                let err = AttributeError::NonNumeric { attribute: field.to_string(), raw: s };
                warn!(error = %err, "dropping requirement value");
            }
            parsed
        }
        other => {
            let err = AttributeError::NonNumeric { attribute: field.to_string(), raw: other.to_string() };
            warn!(error = %err, "dropping requirement value");
            None
        }
    }
}

fn technical_specs(value: Option<Value>) -> BTreeMap<TechnicalAttribute, f64> {
    let mut specs = BTreeMap::new();
    let entries = match value {
        None | Some(Value::Null) => return specs,
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            warn!(value = %other, "technical_specs is not an object");
            return specs;
        }
    };

    for (name, raw) in entries {
        let Some(attribute) = TechnicalAttribute::parse(&name) else {
            warn!(error = %AttributeError::UnknownAttribute(name), "dropping technical spec");
            continue;
        };
        if let Some(target) = number(attribute.as_str(), Some(raw)) {
            specs.insert(attribute, target);
        }
    }
    specs
}
