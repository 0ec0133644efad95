//! Text Enhancer: prepends preservation markers for found critical keywords so the
//! generative extraction step keeps them.
//!
//! Markers are prepended one at a time in registry order, so the last critical keyword
//! processed ends up closest to the start. The original text is never modified.

use crate::keywords::registry::{KeywordClass, KeywordRegistry};
use crate::keywords::scanner::ScanResult;

pub fn enhance_text(registry: &KeywordRegistry, text: &str, scan: &ScanResult) -> String {
    let mut enhanced = text.to_string();
    for class in registry.classes().iter().filter(|c| c.critical) {
        if scan.is_found(&class.id) {
            enhanced.insert_str(0, &preservation_marker(class));
        }
    }
    enhanced
}

pub fn preservation_marker(class: &KeywordClass) -> String {
    format!(
        "[PRESERVE KEYWORD: {label}]\n\
        The term \"{label}\" is business-critical. Keep it verbatim in work experience and skills.\n\
        [/PRESERVE KEYWORD]\n\n",
        label = class.label
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::scanner::KeywordScanner;

    const TWO_CRITICAL: &str = r#"
        version = "test"

        [[keywords]]
        id = "shopify"
        label = "Shopify"
        priority = 1
        weight = 1.0
        critical = true
        variations = ["shopify"]
        patterns = ['\bshopify\s+plus\b']

        [[keywords]]
        id = "bigcommerce"
        label = "BigCommerce"
        priority = 2
        weight = 1.0
        critical = true
        variations = ["bigcommerce"]
        patterns = ['\bbig\s+commerce\b']
    "#;

    #[test]
    fn test_no_markers_without_critical_keywords() {
        let registry = KeywordRegistry::builtin().unwrap();
        let text = "Ecommerce analyst";
        let scan = KeywordScanner::new(&registry).scan(text);
        assert_eq!(enhance_text(&registry, text, &scan), text);
    }

    #[test]
    fn test_original_text_is_suffix() {
        let registry = KeywordRegistry::builtin().unwrap();
        let text = "Senior “Shopify” developer — Liquid & Hydrogen";
        let scan = KeywordScanner::new(&registry).scan(text);
        let enhanced = enhance_text(&registry, text, &scan);
        assert!(enhanced.ends_with(text));
        assert!(enhanced.starts_with("[PRESERVE KEYWORD: Shopify]"));
    }

    #[test]
    fn test_markers_accumulate_in_reverse_registry_order() {
        let registry = KeywordRegistry::from_toml_str(TWO_CRITICAL).unwrap();
        let text = "Migrated stores from BigCommerce to Shopify";
        let scan = KeywordScanner::new(&registry).scan(text);
        let enhanced = enhance_text(&registry, text, &scan);

        let expected = format!(
            "{}{}{}",
            preservation_marker(registry.get("bigcommerce").unwrap()),
            preservation_marker(registry.get("shopify").unwrap()),
            text
        );
        assert_eq!(enhanced, expected);
    }

    #[test]
    fn test_enhancing_never_loses_a_found_keyword() {
        let registry = KeywordRegistry::builtin().unwrap();
        let scanner = KeywordScanner::new(&registry);
        let text = "Shopify Plus merchant, Liquid sections, ecommerce growth";
        let before = scanner.scan(text);
        let after = scanner.scan(&enhance_text(&registry, text, &before));
        for (id, record) in &before.detections {
            if record.found {
                assert!(after.is_found(id), "'{id}' lost after enhancement");
            }
        }
    }
}
