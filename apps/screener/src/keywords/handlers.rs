//! Axum route handlers for the keyword integrity API.
//!
//! Every request gets its own `ScreeningSession`, so concurrent jobs never see each
//! other's cached scans.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::keywords::detection_log::{LogEntry, Statistics};
use crate::keywords::registry::KeywordClassSummary;
use crate::keywords::scanner::ScanResult;
use crate::keywords::session::ScreeningSession;
use crate::keywords::structure::StructuredValue;
use crate::keywords::validator::ValidationResult;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

// Text fields are untyped so a non-string payload reaches the handler instead of
// failing in the extractor.

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub text: Value,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub text: Value,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub enhanced_text: String,
    pub scan: ScanResult,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub original_text: Value,
    #[serde(default)]
    pub extracted: StructuredValue,
}

#[derive(Debug, Serialize)]
pub struct RegistryResponse {
    pub version: String,
    pub keywords: Vec<KeywordClassSummary>,
}

#[derive(Debug, Serialize)]
pub struct ScreeningResponse {
    pub session_id: Uuid,
    pub scan: ScanResult,
    pub validation: ValidationResult,
    pub statistics: Statistics,
    pub log: Vec<LogEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/keywords/registry
pub async fn handle_get_registry(State(state): State<AppState>) -> Json<RegistryResponse> {
    Json(RegistryResponse {
        version: state.registry.version().to_string(),
        keywords: state.registry.summaries(),
    })
}

/// GET /api/v1/keywords/registry/:id
pub async fn handle_get_keyword(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<KeywordClassSummary>, AppError> {
    state
        .registry
        .get(&id)
        .map(|class| Json(class.summary()))
        .ok_or_else(|| AppError::NotFound(format!("Keyword '{id}' not found")))
}

/// POST /api/v1/keywords/scan
///
/// Always 200: invalid input is reported through `success = false`.
pub async fn handle_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Json<ScanResult> {
    let mut session = ScreeningSession::new(state.registry.clone());
    Json(session.scan_input(request.text.as_str()))
}

/// POST /api/v1/keywords/enhance
///
/// Returns the text with preservation markers, ready for the extraction prompt.
pub async fn handle_enhance(
    State(state): State<AppState>,
    Json(request): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    let Some(text) = request.text.as_str().filter(|t| !t.trim().is_empty()) else {
        return Err(AppError::Validation(
            "text must be a non-empty string".to_string(),
        ));
    };

    let mut session = ScreeningSession::new(state.registry.clone());
    let scan = session.scan(text);
    let enhanced_text = session.enhance(text, Some(&scan));

    Ok(Json(EnhanceResponse {
        enhanced_text,
        scan,
    }))
}

/// POST /api/v1/keywords/validate
///
/// A non-string `original_text` leaves an unsuccessful pre-scan, reported as a warning.
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidationResult> {
    let mut session = ScreeningSession::new(state.registry.clone());
    let original_text = request.original_text.as_str();
    session.scan_input(original_text);
    Json(session.validate(&request.extracted, original_text.unwrap_or_default()))
}

/// POST /api/v1/screenings
///
/// Full job in one session: pre-extraction scan, validation, then statistics.
pub async fn handle_screening(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Json<ScreeningResponse> {
    let mut session = ScreeningSession::new(state.registry.clone());
    let original_text = request.original_text.as_str();
    let scan = session.scan_input(original_text);
    let validation = session.validate(&request.extracted, original_text.unwrap_or_default());

    info!(
        "Screening {}: valid={}, critical missing in source={}",
        session.id(),
        validation.valid,
        scan.summary.critical_missing
    );

    Json(ScreeningResponse {
        session_id: session.id(),
        scan,
        validation,
        statistics: session.statistics(),
        log: session.log().entries().cloned().collect(),
    })
}
