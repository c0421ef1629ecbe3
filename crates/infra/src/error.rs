use thiserror::Error;

use clinic_core::DomainError;

pub type InfraResult<T> = Result<T, InfraError>;

/// Failures surfaced by stores and workflows.
#[derive(Debug, Error)]
pub enum InfraError {
    /// Deterministic business failure (validation, not found, stock, conflict).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store could not serve the request (e.g. a poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl InfraError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            InfraError::Domain(e) => Some(e),
            InfraError::Unavailable(_) => None,
        }
    }
}
