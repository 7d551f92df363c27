//! Defines the crate level error type.

/// The errors that may occur in the ledger engine.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction record failed validation.
    ///
    /// The string names the offending field and value. Records are rejected
    /// at ingestion, the amount sign and type are never coerced.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// An empty string was used to create a purpose name.
    #[error("purpose name cannot be empty")]
    EmptyPurposeName,

    /// A purpose with the same name already exists.
    #[error("the purpose \"{0}\" already exists")]
    DuplicatePurposeName(String),

    /// The canonical timezone string did not match a known timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The requested resource was not found.
    ///
    /// Stores return this when an update or delete refers to an ID that does
    /// not exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The ledger store failed or rejected an operation.
    ///
    /// Covers transport, permission and policy failures. The string carries
    /// the underlying message and is never retried automatically.
    #[error("ledger store error: {0}")]
    Store(String),

    /// An internal invariant was violated, e.g. buckets that are not in
    /// ascending calendar order reached the balance accumulator.
    ///
    /// This indicates a bug in the caller rather than a recoverable condition.
    #[error("computation error: {0}")]
    Computation(String),

    /// Export rows could not be serialized.
    #[error("could not export transactions: {0}")]
    Export(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::Store(error.to_string())
            }
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::Export(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Export(value.to_string())
    }
}
