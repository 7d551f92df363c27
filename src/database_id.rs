//! Database ID type definitions.

/// Identifies a transaction in the ledger store.
pub type TransactionId = i64;

/// Identifies a purpose in the ledger store.
pub type PurposeId = i64;
