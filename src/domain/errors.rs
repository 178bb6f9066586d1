use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("Corrupted cart data: {0}")]
    Corrupted(String),
    #[error("Cart for user {0} was modified concurrently")]
    Conflict(String),
}

impl DomainError {
    /// Whether re-running the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Unavailable(_) | DomainError::Conflict(_))
    }

    /// Whether a collaborator (store, catalog) failed to answer. A conflict is
    /// transient but says nothing about collaborator health.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, DomainError::Unavailable(_))
    }
}
