//! Keyword Registry: declarative definition of every keyword class the scanner evaluates.
//!
//! The registry is loaded from TOML (embedded `keywords.toml` by default, or a file named
//! by `KEYWORD_REGISTRY_PATH`) and validated once at load time. All variations and
//! patterns are compiled here so scans never build a regex.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::keywords::normalize::normalize;

/// Registry shipped with the binary.
pub const BUILTIN_REGISTRY: &str = include_str!("keywords.toml");

pub const DEFAULT_BOOST_FACTOR: f64 = 1.5;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read keyword registry at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed keyword registry: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Keyword registry declares no keyword classes")]
    Empty,

    #[error("Duplicate keyword id '{0}'")]
    DuplicateId(String),

    #[error("Keyword '{id}' has weight {weight}, expected a value in [0, 1]")]
    InvalidWeight { id: String, weight: f64 },

    #[error("Keyword '{0}' declares no variations")]
    NoVariations(String),

    #[error("Keyword '{0}' declares no patterns")]
    NoPatterns(String),

    #[error("Keyword '{0}' has a variation that is blank after normalization")]
    BlankVariation(String),

    #[error("Keyword '{id}' has pattern `{pattern}` which matches empty text")]
    EmptyMatch { id: String, pattern: String },

    #[error("Keyword '{id}' has an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        id: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Keyword '{0}' requires context but names no companion")]
    MissingCompanion(String),

    #[error("{context} references unknown keyword '{id}'")]
    UnknownReference { context: String, id: String },

    #[error("Boost factor for '{dependent}' must be a finite value >= 1.0, got {factor}")]
    InvalidBoostFactor { dependent: String, factor: f64 },

    #[error("Structure check topic '{0}' must be a critical keyword")]
    TopicNotCritical(String),

    #[error("Structure check declares no search terms")]
    NoTopicTerms,
}

// ────────────────────────────────────────────────────────────────────────────
// Declarative definition (TOML shape)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryDefinition {
    version: String,
    keywords: Vec<KeywordDefinition>,
    #[serde(default)]
    context_rules: ContextRulesDefinition,
    structure_check: Option<StructureCheckDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeywordDefinition {
    id: String,
    label: Option<String>,
    priority: u32,
    weight: f64,
    #[serde(default)]
    critical: bool,
    #[serde(default)]
    context_required: bool,
    companion: Option<String>,
    variations: Vec<String>,
    patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContextRulesDefinition {
    #[serde(default)]
    boost: Vec<BoostDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoostDefinition {
    trigger: String,
    dependent: String,
    #[serde(default = "default_boost_factor")]
    factor: f64,
}

fn default_boost_factor() -> f64 {
    DEFAULT_BOOST_FACTOR
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructureCheckDefinition {
    topic: String,
    terms: Vec<String>,
    #[serde(default = "default_experience_key")]
    experience_key: String,
    #[serde(default = "default_skills_key")]
    skills_key: String,
    #[serde(default = "default_skill_lists")]
    skill_lists: Vec<String>,
}

fn default_experience_key() -> String {
    "workExperience".to_string()
}

fn default_skills_key() -> String {
    "skills".to_string()
}

fn default_skill_lists() -> Vec<String> {
    vec![
        "technical".to_string(),
        "frameworks".to_string(),
        "tools".to_string(),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Compiled registry
// ────────────────────────────────────────────────────────────────────────────

/// A literal phrase alternative, compiled as a whole-word case-insensitive matcher.
#[derive(Debug, Clone)]
pub struct Variation {
    pub phrase: String,
    pub matcher: Regex,
}

/// One keyword class. Immutable once the registry is built.
#[derive(Debug, Clone)]
pub struct KeywordClass {
    pub id: String,
    pub label: String,
    /// Lower is more important.
    pub priority: u32,
    pub variations: Vec<Variation>,
    pub patterns: Vec<Regex>,
    pub weight: f64,
    pub critical: bool,
    pub context_required: bool,
    /// Class that must also be found when `context_required` is set.
    pub companion: Option<String>,
}

/// Co-occurrence rule: when `trigger` and `dependent` are both found, the dependent's
/// confidence is multiplied by `factor` (capped at 1.0).
#[derive(Debug, Clone, Serialize)]
pub struct BoostRule {
    pub trigger: String,
    pub dependent: String,
    pub factor: f64,
}

/// Placement check for the primary critical topic inside the structured resume.
#[derive(Debug, Clone, Serialize)]
pub struct StructureCheck {
    pub topic: String,
    pub terms: Vec<String>,
    pub experience_key: String,
    pub skills_key: String,
    pub skill_lists: Vec<String>,
}

/// Public, serialisable view of a keyword class.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordClassSummary {
    pub id: String,
    pub label: String,
    pub priority: u32,
    pub weight: f64,
    pub critical: bool,
    pub context_required: bool,
    pub companion: Option<String>,
    pub variations: Vec<String>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordRegistry {
    version: String,
    /// Sorted by ascending priority; ties keep declaration order.
    classes: Vec<KeywordClass>,
    boosts: Vec<BoostRule>,
    structure_check: Option<StructureCheck>,
}

impl KeywordRegistry {
    /// Loads the registry from `path`, or the embedded definition when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, RegistryError> {
        let registry = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_toml_str(&content)?
            }
            None => Self::builtin()?,
        };

        info!(
            "Keyword registry v{} loaded ({} classes, {} critical)",
            registry.version,
            registry.classes.len(),
            registry.classes.iter().filter(|c| c.critical).count()
        );
        Ok(registry)
    }

    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, RegistryError> {
        let definition: RegistryDefinition = toml::from_str(toml_str)?;
        Self::from_definition(definition)
    }

    fn from_definition(definition: RegistryDefinition) -> Result<Self, RegistryError> {
        if definition.keywords.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen: HashSet<String> = HashSet::new();
        for kw in &definition.keywords {
            if !seen.insert(kw.id.clone()) {
                return Err(RegistryError::DuplicateId(kw.id.clone()));
            }
        }

        let mut classes = definition
            .keywords
            .into_iter()
            .map(compile_class)
            .collect::<Result<Vec<_>, _>>()?;
        classes.sort_by_key(|c| c.priority);

        for class in &classes {
            match (&class.companion, class.context_required) {
                (None, true) => return Err(RegistryError::MissingCompanion(class.id.clone())),
                (Some(companion), _) if !seen.contains(companion) => {
                    return Err(RegistryError::UnknownReference {
                        context: format!("Companion of '{}'", class.id),
                        id: companion.clone(),
                    })
                }
                _ => {}
            }
        }

        let mut boosts = Vec::with_capacity(definition.context_rules.boost.len());
        for rule in definition.context_rules.boost {
            for id in [&rule.trigger, &rule.dependent] {
                if !seen.contains(id) {
                    return Err(RegistryError::UnknownReference {
                        context: "Boost rule".to_string(),
                        id: id.clone(),
                    });
                }
            }
            if !rule.factor.is_finite() || rule.factor < 1.0 {
                return Err(RegistryError::InvalidBoostFactor {
                    dependent: rule.dependent,
                    factor: rule.factor,
                });
            }
            boosts.push(BoostRule {
                trigger: rule.trigger,
                dependent: rule.dependent,
                factor: rule.factor,
            });
        }

        let structure_check = match definition.structure_check {
            Some(check) => {
                let topic = classes
                    .iter()
                    .find(|c| c.id == check.topic)
                    .ok_or_else(|| RegistryError::UnknownReference {
                        context: "Structure check".to_string(),
                        id: check.topic.clone(),
                    })?;
                if !topic.critical {
                    return Err(RegistryError::TopicNotCritical(check.topic));
                }
                let terms: Vec<String> = check
                    .terms
                    .iter()
                    .map(|t| normalize(t))
                    .filter(|t| !t.is_empty())
                    .collect();
                if terms.is_empty() {
                    return Err(RegistryError::NoTopicTerms);
                }
                Some(StructureCheck {
                    topic: check.topic,
                    terms,
                    experience_key: check.experience_key,
                    skills_key: check.skills_key,
                    skill_lists: check.skill_lists,
                })
            }
            None => None,
        };

        Ok(Self {
            version: definition.version,
            classes,
            boosts,
            structure_check,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classes(&self) -> &[KeywordClass] {
        &self.classes
    }

    pub fn get(&self, id: &str) -> Option<&KeywordClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn boosts(&self) -> &[BoostRule] {
        &self.boosts
    }

    pub fn structure_check(&self) -> Option<&StructureCheck> {
        self.structure_check.as_ref()
    }

    pub fn has_critical(&self) -> bool {
        self.classes.iter().any(|c| c.critical)
    }

    pub fn summaries(&self) -> Vec<KeywordClassSummary> {
        self.classes.iter().map(KeywordClass::summary).collect()
    }
}

impl KeywordClass {
    pub fn summary(&self) -> KeywordClassSummary {
        KeywordClassSummary {
            id: self.id.clone(),
            label: self.label.clone(),
            priority: self.priority,
            weight: self.weight,
            critical: self.critical,
            context_required: self.context_required,
            companion: self.companion.clone(),
            variations: self.variations.iter().map(|v| v.phrase.clone()).collect(),
            patterns: self.patterns.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}

fn compile_class(def: KeywordDefinition) -> Result<KeywordClass, RegistryError> {
    if !def.weight.is_finite() || !(0.0..=1.0).contains(&def.weight) {
        return Err(RegistryError::InvalidWeight {
            id: def.id,
            weight: def.weight,
        });
    }
    if def.variations.is_empty() {
        return Err(RegistryError::NoVariations(def.id));
    }
    if def.patterns.is_empty() {
        return Err(RegistryError::NoPatterns(def.id));
    }

    let mut variations = Vec::with_capacity(def.variations.len());
    for raw in &def.variations {
        let phrase = normalize(raw);
        if phrase.is_empty() {
            return Err(RegistryError::BlankVariation(def.id));
        }
        let source = format!(r"\b{}\b", regex::escape(&phrase));
        let matcher = compile(&def.id, &source)?;
        variations.push(Variation { phrase, matcher });
    }

    let patterns = def
        .patterns
        .iter()
        .map(|p| compile(&def.id, p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(KeywordClass {
        label: def.label.unwrap_or_else(|| def.id.clone()),
        id: def.id,
        priority: def.priority,
        variations,
        patterns,
        weight: def.weight,
        critical: def.critical,
        context_required: def.context_required,
        companion: def.companion,
    })
}

/// Compiles case-insensitively. A regex that matches "" would flag every text.
fn compile(id: &str, pattern: &str) -> Result<Regex, RegistryError> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RegistryError::InvalidPattern {
            id: id.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
    if regex.is_match("") {
        return Err(RegistryError::EmptyMatch {
            id: id.to_string(),
            pattern: pattern.to_string(),
        });
    }
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(keywords: &str) -> Result<KeywordRegistry, RegistryError> {
        KeywordRegistry::from_toml_str(&format!("version = \"test\"\n{keywords}"))
    }

    const PLATFORM: &str = r#"
        [[keywords]]
        id = "shopify"
        priority = 1
        weight = 1.0
        critical = true
        variations = ["shopify"]
        patterns = ['\bshopify\s+plus\b']
    "#;

    #[test]
    fn test_builtin_registry_loads() {
        let registry = KeywordRegistry::builtin().unwrap();
        assert!(registry.has_critical());
        assert!(registry.get("shopify").unwrap().critical);
        assert!(registry.get("liquid").unwrap().context_required);
        assert_eq!(registry.boosts().len(), 1);
        assert_eq!(registry.structure_check().unwrap().topic, "shopify");
    }

    #[test]
    fn test_builtin_classes_sorted_by_priority() {
        let registry = KeywordRegistry::builtin().unwrap();
        let priorities: Vec<u32> = registry.classes().iter().map(|c| c.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_variation_matcher_is_whole_word_case_insensitive() {
        let registry = registry_with(PLATFORM).unwrap();
        let matcher = &registry.get("shopify").unwrap().variations[0].matcher;
        assert!(matcher.is_match("Senior SHOPIFY dev"));
        assert!(!matcher.is_match("shopifyish tooling"));
    }

    #[test]
    fn test_label_defaults_to_id() {
        let registry = registry_with(PLATFORM).unwrap();
        assert_eq!(registry.get("shopify").unwrap().label, "shopify");
    }

    #[test]
    fn test_rejects_weight_out_of_range() {
        let err = registry_with(&PLATFORM.replace("weight = 1.0", "weight = 1.5")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidWeight { .. }));
    }

    #[test]
    fn test_rejects_empty_variations() {
        let err =
            registry_with(&PLATFORM.replace(r#"variations = ["shopify"]"#, "variations = []"))
                .unwrap_err();
        assert!(matches!(err, RegistryError::NoVariations(id) if id == "shopify"));
    }

    #[test]
    fn test_rejects_invalid_pattern() {
        let err = registry_with(&PLATFORM.replace(r"'\bshopify\s+plus\b'", "'(unclosed'"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPattern { .. }));
    }

    #[test]
    fn test_rejects_blank_variation() {
        let err = registry_with(&PLATFORM.replace(
            r#"variations = ["shopify"]"#,
            r#"variations = ["shopify", "  "]"#,
        ))
        .unwrap_err();
        assert!(matches!(err, RegistryError::BlankVariation(id) if id == "shopify"));
    }

    #[test]
    fn test_rejects_empty_matching_pattern() {
        let err = registry_with(&PLATFORM.replace(r"'\bshopify\s+plus\b'", "'x*'"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyMatch { pattern, .. } if pattern == "x*"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = registry_with(&format!("{PLATFORM}{PLATFORM}")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(_)));
    }

    #[test]
    fn test_rejects_unknown_companion() {
        let dependent = r#"
            [[keywords]]
            id = "liquid"
            priority = 2
            weight = 0.5
            context_required = true
            companion = "magento"
            variations = ["liquid"]
            patterns = ['\bliquid\b']
        "#;
        let err = registry_with(&format!("{PLATFORM}{dependent}")).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownReference { id, .. } if id == "magento"));
    }

    #[test]
    fn test_rejects_context_required_without_companion() {
        let dependent = r#"
            [[keywords]]
            id = "liquid"
            priority = 2
            weight = 0.5
            context_required = true
            variations = ["liquid"]
            patterns = ['\bliquid\b']
        "#;
        let err = registry_with(&format!("{PLATFORM}{dependent}")).unwrap_err();
        assert!(matches!(err, RegistryError::MissingCompanion(_)));
    }

    #[test]
    fn test_rejects_boost_factor_below_one() {
        let rules = r#"
            [[context_rules.boost]]
            trigger = "shopify"
            dependent = "shopify"
            factor = 0.5
        "#;
        let err = registry_with(&format!("{PLATFORM}{rules}")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBoostFactor { .. }));
    }

    #[test]
    fn test_rejects_non_critical_structure_topic() {
        let toml = format!(
            "{}\n[structure_check]\ntopic = \"shopify\"\nterms = [\"shopify\"]\n",
            PLATFORM.replace("critical = true", "critical = false")
        );
        let err = registry_with(&toml).unwrap_err();
        assert!(matches!(err, RegistryError::TopicNotCritical(_)));
    }

    #[test]
    fn test_rejects_empty_registry() {
        let err = KeywordRegistry::from_toml_str("version = \"x\"\nkeywords = []").unwrap_err();
        assert!(matches!(err, RegistryError::Empty));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = KeywordRegistry::load(Some(Path::new("/nonexistent/keywords.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/keywords.toml"));
    }
}
