// Error taxonomy for the record store

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored value for `key` did not parse
    #[error("Corrupt data under '{key}': {reason}")]
    CorruptData { key: String, reason: String },

    /// User input rejected before any storage call
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No record with id '{id}' in {namespace}")]
    NotFound { namespace: &'static str, id: String },

    #[error("Record id '{id}' already exists in {namespace}")]
    DuplicateId { namespace: &'static str, id: String },
}

impl StoreError {
    pub fn corrupt(key: &str, reason: impl ToString) -> Self {
        StoreError::CorruptData {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_storage_unavailable() {
        let err: StoreError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, StoreError::StorageUnavailable(_)));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_corrupt_display() {
        let err = StoreError::corrupt("tasks", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "Corrupt data under 'tasks': expected value at line 1"
        );
    }
}
