use thiserror::Error;

/// Errors surfaced by the matching and analytics engine.
///
/// `Store` covers persistence and connectivity failures: fatal to the
/// single operation, retried only by the next scheduled tick. `Validation`
/// is scoped to one candidate inside a reconcile. `Notification` failures
/// are logged and swallowed at the call site and never abort an operation.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("store failure: {0}")]
    Store(String),

    #[error("notification failure: {0}")]
    Notification(String),
}
