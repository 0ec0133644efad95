use std::sync::Arc;

use crate::keywords::registry::KeywordRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Only immutable data lives here. Per-document state belongs to a `ScreeningSession`
/// created inside each handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<KeywordRegistry>,
}
