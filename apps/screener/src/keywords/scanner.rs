//! Keyword Scanner: evaluates every registry class against normalized text.
//!
//! Algorithm, per class:
//! 1. Each variation matches as a whole word (case-insensitive); every hit counts.
//! 2. Each pattern matches against the normalized text; every hit counts.
//! 3. confidence = min(1, ln(count + 1) / ln(10)) × weight, or 0 when nothing matched.
//!
//! Missing critical classes are collected before the context rules run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keywords::context_rules;
use crate::keywords::normalize::normalize;
use crate::keywords::registry::{KeywordClass, KeywordRegistry};

/// Only the first N matches are kept on a record. Counting is unaffected.
pub const MAX_RECORDED_MATCHES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Variation,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub kind: MatchKind,
    pub text: String,
}

/// Detection outcome for one keyword class in one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub keyword_id: String,
    pub found: bool,
    pub match_count: usize,
    pub matches: Vec<KeywordMatch>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_detected: usize,
    pub critical_detected: usize,
    pub critical_missing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub detections: BTreeMap<String, DetectionRecord>,
    /// Critical classes not found, in registry order, as of before context rules.
    pub missing_critical: Vec<String>,
    pub summary: ScanSummary,
}

impl ScanResult {
    /// An unsuccessful result for input that cannot be scanned.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            timestamp: Utc::now(),
            detections: BTreeMap::new(),
            missing_critical: Vec::new(),
            summary: ScanSummary::default(),
        }
    }

    pub fn is_found(&self, keyword_id: &str) -> bool {
        self.detections
            .get(keyword_id)
            .map(|d| d.found)
            .unwrap_or(false)
    }

    #[allow(dead_code)]
    pub fn confidence(&self, keyword_id: &str) -> f64 {
        self.detections
            .get(keyword_id)
            .map(|d| d.confidence)
            .unwrap_or(0.0)
    }
}

/// Logarithmic confidence: repeated mentions give diminishing gains, scaled by weight.
pub fn confidence_for(match_count: usize, weight: f64) -> f64 {
    if match_count == 0 {
        return 0.0;
    }
    let scaled = ((match_count as f64 + 1.0).ln() / 10f64.ln()).min(1.0);
    (scaled * weight).clamp(0.0, 1.0)
}

pub struct KeywordScanner<'a> {
    registry: &'a KeywordRegistry,
}

impl<'a> KeywordScanner<'a> {
    pub fn new(registry: &'a KeywordRegistry) -> Self {
        Self { registry }
    }

    /// Scans `text`. Never fails: empty input yields an unsuccessful result.
    pub fn scan(&self, text: &str) -> ScanResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return ScanResult::rejected("Input text is empty; nothing to scan");
        }

        let mut detections = BTreeMap::new();
        let mut missing_critical = Vec::new();
        for class in self.registry.classes() {
            let record = detect(class, &normalized);
            if class.critical && !record.found {
                missing_critical.push(class.id.clone());
            }
            detections.insert(class.id.clone(), record);
        }

        context_rules::apply(self.registry, &mut detections);

        let critical_detected = self
            .registry
            .classes()
            .iter()
            .filter(|c| c.critical && detections.get(&c.id).map(|d| d.found).unwrap_or(false))
            .count();
        let summary = ScanSummary {
            total_detected: detections.values().filter(|d| d.found).count(),
            critical_detected,
            critical_missing: missing_critical.len(),
        };

        let success = critical_detected > 0 || !self.registry.has_critical();
        let message = if success {
            format!(
                "Detected {} keyword classes ({} critical) with registry v{}",
                summary.total_detected,
                summary.critical_detected,
                self.registry.version()
            )
        } else {
            format!(
                "No critical keywords detected; missing: {}",
                missing_critical.join(", ")
            )
        };

        debug!(
            "Keyword scan: {} chars, {} detected, {} critical missing",
            normalized.len(),
            summary.total_detected,
            summary.critical_missing
        );

        ScanResult {
            success,
            message,
            timestamp: Utc::now(),
            detections,
            missing_critical,
            summary,
        }
    }
}

/// Evaluates one class against already-normalized text.
fn detect(class: &KeywordClass, normalized: &str) -> DetectionRecord {
    let mut match_count = 0;
    let mut matches = Vec::new();

    let variation_hits = class
        .variations
        .iter()
        .flat_map(|v| v.matcher.find_iter(normalized))
        .map(|m| (MatchKind::Variation, m.as_str()));
    let pattern_hits = class
        .patterns
        .iter()
        .flat_map(|p| p.find_iter(normalized))
        .map(|m| (MatchKind::Pattern, m.as_str()));

    for (kind, text) in variation_hits.chain(pattern_hits) {
        match_count += 1;
        if matches.len() < MAX_RECORDED_MATCHES {
            matches.push(KeywordMatch {
                kind,
                text: text.to_string(),
            });
        }
    }

    DetectionRecord {
        keyword_id: class.id.clone(),
        found: match_count > 0,
        match_count,
        matches,
        confidence: confidence_for(match_count, class.weight),
        context_note: None,
    }
}
