//! Per-attribute normalized distances
//!
//! All score functions return a value in [0.0, 1.0] where 1.0 means the
//! candidate sits exactly on the target.

use crate::schema::Tolerance;

/// Scores closer than this to an exact hit are treated as equal
const EPSILON: f64 = 1e-9;

/// `max(0, 1 - |value - target| / range)`
///
/// A zero or non-finite range only accepts an exact hit.
pub fn normalized_distance_score(value: f64, target: f64, range: f64) -> f64 {
    let diff = (value - target).abs();
    if !range.is_finite() || range <= 0.0 {
        return if diff < EPSILON { 1.0 } else { 0.0 };
    }
    clamp_unit(1.0 - diff / range)
}

/// The normalization range for one comparison
///
/// `TargetFraction` scales with the requirement; `CatalogRange` uses the
/// observed spread of the attribute and is `None` when nothing was observed.
pub fn tolerance_range(target: f64, tolerance: Tolerance, observed: Option<(f64, f64)>) -> Option<f64> {
    match tolerance {
        Tolerance::TargetFraction(fraction) => Some(target.abs() * fraction),
        Tolerance::CatalogRange => observed.map(|(min, max)| max - min),
    }
}

/// Closeness of `value` to `target` under a tolerance model
pub fn attribute_score(
    value: f64,
    target: f64,
    tolerance: Tolerance,
    observed: Option<(f64, f64)>,
) -> Option<f64> {
    tolerance_range(target, tolerance, observed)
        .map(|range| normalized_distance_score(value, target, range))
}

/// Minimum-threshold score: full credit at or above `minimum`, then the
/// shortfall decays over `range`
pub fn shortfall_score(value: f64, minimum: f64, range: f64) -> f64 {
    if value >= minimum {
        1.0
    } else {
        normalized_distance_score(value, minimum, range)
    }
}

/// `|accepted - original| / |original|` as a percentage
pub fn deviation_pct(original: f64, accepted: f64) -> f64 {
    if original.abs() < EPSILON {
        return if (accepted - original).abs() < EPSILON { 0.0 } else { 100.0 };
    }
    ((accepted - original) / original).abs() * 100.0
}

/// Whether `value` lies within `fraction` of `target` on either side
pub fn within_fraction(value: f64, target: f64, fraction: f64) -> bool {
    let lo = target * (1.0 - fraction);
    let hi = target * (1.0 + fraction);
    value >= lo.min(hi) && value <= lo.max(hi)
}

/// Clamp to [0, 1]; NaN becomes 0
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Case-insensitive substring test
pub fn label_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_distance() {
        assert_eq!(normalized_distance_score(10.0, 10.0, 1.0), 1.0);
        assert!((normalized_distance_score(10.25, 10.0, 0.5) - 0.5).abs() < 1e-9);
        assert_eq!(normalized_distance_score(12.0, 10.0, 0.5), 0.0);
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(normalized_distance_score(3.0, 3.0, 0.0), 1.0);
        assert_eq!(normalized_distance_score(3.1, 3.0, 0.0), 0.0);
        assert_eq!(normalized_distance_score(3.1, 3.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_tolerance_models() {
        // 5% of 40 is 2, so 41 is halfway out
        let strict = attribute_score(41.0, 40.0, Tolerance::TargetFraction(0.05), None).unwrap();
        assert!((strict - 0.5).abs() < 1e-9);

        // Catalog spread of 10 makes the same miss cheap
        let catalog = attribute_score(41.0, 40.0, Tolerance::CatalogRange, Some((30.0, 40.0))).unwrap();
        assert!((catalog - 0.9).abs() < 1e-9);

        assert!(attribute_score(41.0, 40.0, Tolerance::CatalogRange, None).is_none());
    }

    #[test]
    fn test_shortfall() {
        assert_eq!(shortfall_score(9.0, 8.0, 1.6), 1.0);
        assert!((shortfall_score(7.0, 8.0, 1.6) - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_deviation_pct() {
        assert!((deviation_pct(8.0, 7.0) - 12.5).abs() < 1e-9);
        assert!((deviation_pct(40.0, 46.0) - 15.0).abs() < 1e-9);
        assert_eq!(deviation_pct(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_within_fraction() {
        assert!(within_fraction(41.9, 40.0, 0.05));
        assert!(!within_fraction(42.1, 40.0, 0.05));
        assert!(within_fraction(-5.1, -5.0, 0.05));
    }

    #[test]
    fn test_clamp_and_contains() {
        assert_eq!(clamp_unit(1.2), 1.0);
        assert_eq!(clamp_unit(-0.1), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert!(label_contains("Dark Premium", "dark"));
        assert!(!label_contains("Milk", "dark"));
    }
}
