//! Extraction Validator: reconciles critical keywords between the original document and
//! the model's structured output.
//!
//! Lost critical keywords make the extraction invalid. The topic placement check only
//! ever produces warnings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::keywords::normalize::normalize;
use crate::keywords::registry::{KeywordRegistry, StructureCheck};
use crate::keywords::scanner::{KeywordScanner, ScanResult, ScanSummary};
use crate::keywords::structure::StructuredValue;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywordComparison {
    pub found_in_original: bool,
    pub found_in_extraction: bool,
    pub preserved: bool,
}

/// Outcome of the topic placement check. `valid` here never affects the overall result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub keyword_comparison: BTreeMap<String, KeywordComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_check: Option<StructureValidation>,
    pub post_scan_summary: ScanSummary,
}

/// Compares `pre_scan` (the original document) against a fresh scan of the flattened
/// `extracted` structure.
pub fn validate_extraction(
    registry: &KeywordRegistry,
    pre_scan: &ScanResult,
    extracted: &StructuredValue,
) -> ValidationResult {
    let flattened = extracted.flatten();
    let post_scan = KeywordScanner::new(registry).scan(&flattened);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut keyword_comparison = BTreeMap::new();

    if pre_scan.detections.is_empty() {
        warnings.push(format!(
            "Original document could not be scanned: {}",
            pre_scan.message
        ));
    }

    for class in registry.classes() {
        let found_in_original = pre_scan.is_found(&class.id);
        let found_in_extraction = post_scan.is_found(&class.id);
        keyword_comparison.insert(
            class.id.clone(),
            KeywordComparison {
                found_in_original,
                found_in_extraction,
                preserved: found_in_original == found_in_extraction,
            },
        );

        if class.critical && found_in_original && !found_in_extraction {
            warn!("Critical keyword '{}' lost during extraction", class.id);
            errors.push(format!(
                "Critical keyword '{}' was found in the original document but is missing from the extracted data",
                class.label
            ));
        }
    }

    let structure_check = registry
        .structure_check()
        .filter(|check| pre_scan.is_found(&check.topic))
        .map(|check| {
            let label = registry
                .get(&check.topic)
                .map(|c| c.label.as_str())
                .unwrap_or(check.topic.as_str());
            check_topic_placement(check, label, extracted)
        });
    if let Some(check) = &structure_check {
        warnings.extend(check.warnings.iter().cloned());
    }

    let valid = errors.is_empty();
    info!(
        "Extraction validation: valid={}, {} errors, {} warnings",
        valid,
        errors.len(),
        warnings.len()
    );

    ValidationResult {
        valid,
        errors,
        warnings,
        keyword_comparison,
        structure_check,
        post_scan_summary: post_scan.summary,
    }
}

/// Looks for the topic (or a synonym) in the serialized work experience and in the
/// combined skill lists.
pub fn check_topic_placement(
    check: &StructureCheck,
    label: &str,
    extracted: &StructuredValue,
) -> StructureValidation {
    let experience = extracted
        .get(&check.experience_key)
        .map(|entries| normalize(&serde_json::to_string(entries).unwrap_or_default()))
        .unwrap_or_default();

    let skills = extracted
        .get(&check.skills_key)
        .map(|skills| {
            let combined: Vec<String> = check
                .skill_lists
                .iter()
                .filter_map(|list| skills.get(list))
                .map(StructuredValue::flatten)
                .collect();
            normalize(&combined.join(" "))
        })
        .unwrap_or_default();

    let mentions = |haystack: &str| check.terms.iter().any(|term| haystack.contains(term.as_str()));
    let in_experience = mentions(&experience);
    let in_skills = mentions(&skills);

    if in_experience || in_skills {
        return StructureValidation {
            valid: true,
            warnings: vec![],
        };
    }

    StructureValidation {
        valid: false,
        warnings: vec![format!(
            "{label} was detected in the original document but is not reflected in work experience or skills"
        )],
    }
}
