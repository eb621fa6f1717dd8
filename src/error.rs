//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed argument
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced wallet or treasure absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Balance would go negative
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Duplicate (subject, action, action-entity-id) submission
    #[error("Already recorded: {0}")]
    AlreadyRecorded(String),

    /// Create of an entity that already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl Error {
    /// Dispatcher status code for this error.
    ///
    /// A repeated submission of an already-applied action is a conflict the
    /// caller may treat as success-once; everything else is a plain failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::AlreadyRecorded(_) => 409,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::AlreadyRecorded("x".into()).status_code(), 409);
        assert_eq!(Error::Validation("x".into()).status_code(), 500);
        assert_eq!(Error::NotFound("x".into()).status_code(), 500);
        assert_eq!(Error::InsufficientFunds("x".into()).status_code(), 500);
        assert_eq!(Error::Storage("x".into()).status_code(), 500);
    }
}
