use serde::{Deserialize, Serialize};

/// A stored record together with its revision.
///
/// Revisions start at 0 when a record is loaded or inserted and increase by
/// one on every successful replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub revision: u64,
    pub record: T,
}

impl<T> Versioned<T> {
    pub fn new(record: T) -> Self {
        Self {
            revision: 0,
            record,
        }
    }

    pub fn into_record(self) -> T {
        self.record
    }
}
