use thiserror::Error;
use uuid::Uuid;

/// Fatal consolidation failures. Tail-step failures (validation, confidence)
/// never surface here from [`crate::Consolidator::consolidate`].
#[derive(Debug, Error)]
pub enum ConsolidationError {
    #[error("source analysis {0} not found")]
    SourceAnalysisNotFound(Uuid),

    #[error("master profile {0} not found")]
    ProfileNotFound(Uuid),

    /// The company name normalizes to nothing, so it cannot serve as a dedup key.
    #[error("company name '{0}' has no usable characters")]
    UnusableCompanyName(String),

    #[error("gave up on '{normalized_name}' after {attempts} conflicting write attempts")]
    ConflictRetriesExhausted {
        normalized_name: String,
        attempts: u32,
    },

    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ConsolidationError {
    pub(crate) fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }
}
