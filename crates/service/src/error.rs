use chaosboard_core::{FormActionError, FormErrors, TransitionError};
use chaosboard_storage::StorageError;

/// Errors returned by dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The targeted record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The record is not in a state the action starts from.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The submitted scenario form failed validation.
    #[error(transparent)]
    Validation(#[from] FormErrors),

    /// The storage backend rejected or failed the operation. Stale writes
    /// land here and are not retried.
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("export serialization failed: {0}")]
    Export(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<FormActionError> for ServiceError {
    fn from(err: FormActionError) -> Self {
        match err {
            FormActionError::Invalid(errors) => ServiceError::Validation(errors),
            FormActionError::Transition(err) => ServiceError::Transition(err),
        }
    }
}
