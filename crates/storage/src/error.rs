/// All errors that can be returned by a `DashboardStorage` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No record of this kind with the given id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Insert of an id that is already present.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    /// Optimistic concurrency conflict: the record changed since it was read.
    #[error("stale write on {kind} {id}: expected revision {expected}, found {actual}")]
    StaleWrite {
        kind: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
