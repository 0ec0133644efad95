//! Context Rule Engine: fixed cross-keyword adjustments applied once per scan.
//!
//! Order matters and is not iterated to a fixed point:
//! 1. Suppression: a context-dependent class whose companion is absent is forced to
//!    not-found and its confidence scaled by `SUPPRESSION_FACTOR`.
//! 2. Co-occurrence boost: when a boost rule's trigger and dependent are both found,
//!    the dependent's confidence is multiplied by the rule factor, capped at 1.0.

use std::collections::BTreeMap;

use tracing::debug;

use crate::keywords::registry::KeywordRegistry;
use crate::keywords::scanner::DetectionRecord;

pub const SUPPRESSION_FACTOR: f64 = 0.1;

pub fn apply(registry: &KeywordRegistry, detections: &mut BTreeMap<String, DetectionRecord>) {
    apply_suppression(registry, detections);
    apply_boosts(registry, detections);
}

fn is_found(detections: &BTreeMap<String, DetectionRecord>, id: &str) -> bool {
    detections.get(id).map(|d| d.found).unwrap_or(false)
}

fn apply_suppression(registry: &KeywordRegistry, detections: &mut BTreeMap<String, DetectionRecord>) {
    for class in registry.classes().iter().filter(|c| c.context_required) {
        let Some(companion) = class.companion.as_deref() else {
            continue;
        };
        if is_found(detections, companion) {
            continue;
        }
        let companion_label = registry
            .get(companion)
            .map(|c| c.label.as_str())
            .unwrap_or(companion);

        if let Some(record) = detections.get_mut(&class.id) {
            if !record.found {
                continue;
            }
            record.found = false;
            record.confidence *= SUPPRESSION_FACTOR;
            record.context_note = Some(format!(
                "'{}' only counts alongside '{}', which was not found",
                class.label, companion_label
            ));
            debug!("Suppressed '{}' (companion '{}' absent)", class.id, companion);
        }
    }
}

fn apply_boosts(registry: &KeywordRegistry, detections: &mut BTreeMap<String, DetectionRecord>) {
    for rule in registry.boosts() {
        if !is_found(detections, &rule.trigger) {
            continue;
        }
        if let Some(record) = detections.get_mut(&rule.dependent) {
            if !record.found {
                continue;
            }
            record.confidence = (record.confidence * rule.factor).min(1.0);
            record.context_note = Some(format!(
                "Confidence boosted by co-occurrence with '{}'",
                rule.trigger
            ));
            debug!("Boosted '{}' via '{}'", rule.dependent, rule.trigger);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::keywords::registry::KeywordRegistry;
    use crate::keywords::scanner::{confidence_for, KeywordScanner};

    fn registry() -> KeywordRegistry {
        KeywordRegistry::builtin().unwrap()
    }

    #[test]
    fn test_liquid_without_platform_is_suppressed() {
        let registry = registry();
        let result = KeywordScanner::new(&registry).scan("Chemist working with liquid samples");
        let liquid = &result.detections["liquid"];
        assert!(!liquid.found);
        assert!(liquid.match_count > 0);
        let raw = confidence_for(liquid.match_count, registry.get("liquid").unwrap().weight);
        assert!(liquid.confidence <= raw * 0.1 + 1e-12);
        assert!(liquid.context_note.as_deref().unwrap().contains("Shopify"));
        assert_eq!(result.summary.total_detected, 0);
    }

    #[test]
    fn test_liquid_with_platform_counts() {
        let registry = registry();
        let result =
            KeywordScanner::new(&registry).scan("Built Shopify themes with Liquid templates");
        let liquid = &result.detections["liquid"];
        assert!(liquid.found);
        assert!(liquid.context_note.is_none());
    }

    #[test]
    fn test_hydrogen_without_platform_is_suppressed() {
        let registry = registry();
        let result = KeywordScanner::new(&registry).scan("Hydrogen fuel cell researcher");
        let hydrogen = &result.detections["hydrogen"];
        assert!(!hydrogen.found);
        assert_eq!(hydrogen.match_count, 1);
        let raw = confidence_for(1, registry.get("hydrogen").unwrap().weight);
        assert!((hydrogen.confidence - raw * 0.1).abs() < 1e-12);
        assert!(hydrogen.context_note.as_deref().unwrap().contains("Shopify"));
    }

    #[test]
    fn test_hydrogen_with_platform_counts() {
        let registry = registry();
        let result = KeywordScanner::new(&registry).scan("Built Hydrogen storefronts on Shopify");
        assert!(result.is_found("hydrogen"));
        assert!(result.detections["hydrogen"].context_note.is_none());
    }

    #[test]
    fn test_unmatched_context_keyword_gets_no_note() {
        let registry = registry();
        let result = KeywordScanner::new(&registry).scan("Data engineer");
        assert!(result.detections["hydrogen"].context_note.is_none());
    }

    #[test]
    fn test_ecommerce_boosted_with_platform() {
        let registry = registry();
        let scanner = KeywordScanner::new(&registry);
        let alone = scanner.scan("5 years ecommerce");
        let together = scanner.scan("Senior Shopify Plus developer, 5 years ecommerce");

        let before = alone.confidence("ecommerce");
        let after = together.confidence("ecommerce");
        assert!(after > before);
        assert!((after - (before * 1.5).min(1.0)).abs() < 1e-12);
        assert!(together.detections["ecommerce"].context_note.is_some());
    }

    #[test]
    fn test_boost_is_capped_at_one() {
        let registry = registry();
        let text = format!("Shopify {}", "ecommerce ".repeat(30));
        let result = KeywordScanner::new(&registry).scan(&text);
        assert!(result.confidence("ecommerce") <= 1.0);
        assert!((result.confidence("ecommerce") - 1.0).abs() < 1e-12);
    }
}
