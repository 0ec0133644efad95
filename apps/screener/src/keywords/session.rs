//! Screening Session: per-job context holding the cached pre-extraction scan and the
//! detection log. One session per document; nothing is shared between jobs except the
//! immutable registry.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::keywords::detection_log::{DetectionLog, LogEntry, Statistics};
use crate::keywords::enhancer::enhance_text;
use crate::keywords::registry::KeywordRegistry;
use crate::keywords::scanner::{KeywordScanner, ScanResult};
use crate::keywords::structure::StructuredValue;
use crate::keywords::validator::{validate_extraction, ValidationResult};

pub struct ScreeningSession {
    id: Uuid,
    registry: Arc<KeywordRegistry>,
    last_scan: Option<ScanResult>,
    log: DetectionLog,
}

impl ScreeningSession {
    pub fn new(registry: Arc<KeywordRegistry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            registry,
            last_scan: None,
            log: DetectionLog::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    #[allow(dead_code)]
    pub fn registry(&self) -> &KeywordRegistry {
        &self.registry
    }

    /// Scans the original document text, caching the result for `validate`.
    pub fn scan(&mut self, text: &str) -> ScanResult {
        let result = KeywordScanner::new(&self.registry).scan(text);
        self.remember(result)
    }

    /// Like `scan`, for input that may not be text at all (e.g. a non-string JSON field).
    pub fn scan_input(&mut self, input: Option<&str>) -> ScanResult {
        match input {
            Some(text) => self.scan(text),
            None => self.remember(ScanResult::rejected("Input must be a non-empty string")),
        }
    }

    fn remember(&mut self, result: ScanResult) -> ScanResult {
        self.log.record(LogEntry::from_scan(self.id, &result));
        self.last_scan = Some(result.clone());
        result
    }

    #[allow(dead_code)]
    pub fn last_scan(&self) -> Option<&ScanResult> {
        self.last_scan.as_ref()
    }

    /// Validates the structured output against the cached scan, scanning
    /// `original_text` first when this session has not scanned yet.
    pub fn validate(&mut self, extracted: &StructuredValue, original_text: &str) -> ValidationResult {
        let pre_scan = if let Some(scan) = self.last_scan.clone() {
            debug!("Session {} reusing cached pre-extraction scan", self.id);
            scan
        } else {
            self.scan(original_text)
        };

        let result = validate_extraction(&self.registry, &pre_scan, extracted);
        self.log.record(LogEntry::from_validation(self.id, &result));
        result
    }

    /// Prepends preservation markers for found critical keywords. Scans `text` when no
    /// scan result is supplied.
    pub fn enhance(&mut self, text: &str, scan: Option<&ScanResult>) -> String {
        match scan {
            Some(scan) => enhance_text(&self.registry, text, scan),
            None => {
                let scan = self.scan(text);
                enhance_text(&self.registry, text, &scan)
            }
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.log.statistics()
    }

    pub fn log(&self) -> &DetectionLog {
        &self.log
    }

    #[allow(dead_code)]
    /// Empties the log and forgets the cached scan.
    pub fn clear(&mut self) {
        self.log.clear();
        self.last_scan = None;
    }
}
