// Keyword integrity engine.
// Detects critical terms in raw document text, reconciles them against the model's
// structured resume output and decides whether the extraction can be trusted.

pub mod context_rules;
pub mod detection_log;
pub mod enhancer;
pub mod handlers;
pub mod normalize;
pub mod registry;
pub mod scanner;
pub mod session;
pub mod structure;
pub mod validator;
