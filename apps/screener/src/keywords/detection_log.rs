//! Detection Log: bounded ring buffer of scan and validation outcomes.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keywords::scanner::{ScanResult, ScanSummary};
use crate::keywords::validator::ValidationResult;

pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreExtraction,
    PostExtraction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub session_id: Uuid,
    pub phase: Phase,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub summary: ScanSummary,
    pub error_count: usize,
    pub warning_count: usize,
}

impl LogEntry {
    pub fn from_scan(session_id: Uuid, scan: &ScanResult) -> Self {
        Self {
            session_id,
            phase: Phase::PreExtraction,
            timestamp: scan.timestamp,
            success: scan.success,
            summary: scan.summary.clone(),
            error_count: 0,
            warning_count: 0,
        }
    }

    pub fn from_validation(session_id: Uuid, validation: &ValidationResult) -> Self {
        Self {
            session_id,
            phase: Phase::PostExtraction,
            timestamp: Utc::now(),
            success: validation.valid,
            summary: validation.post_scan_summary.clone(),
            error_count: validation.errors.len(),
            warning_count: validation.warnings.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseStatistics {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl PhaseStatistics {
    fn count(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub pre_extraction: PhaseStatistics,
    pub post_extraction: PhaseStatistics,
}

#[derive(Debug, Clone)]
pub struct DetectionLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for DetectionLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl DetectionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest once the buffer is full.
    pub fn record(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn statistics(&self) -> Statistics {
        let mut all = PhaseStatistics::default();
        let mut pre_extraction = PhaseStatistics::default();
        let mut post_extraction = PhaseStatistics::default();

        for entry in &self.entries {
            all.count(entry.success);
            match entry.phase {
                Phase::PreExtraction => pre_extraction.count(entry.success),
                Phase::PostExtraction => post_extraction.count(entry.success),
            }
        }

        Statistics {
            total: all.total,
            succeeded: all.succeeded,
            failed: all.failed,
            pre_extraction,
            post_extraction,
        }
    }

    #[allow(dead_code)]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
