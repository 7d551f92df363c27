//! Defines the ledger store trait.

use crate::{
    Error,
    database_id::{PurposeId, TransactionId},
    purpose::{Purpose, PurposeName},
    transaction::{NewTransaction, TransactionChanges, TransactionRecord},
};

/// The authoritative source of transactions and purposes.
///
/// A store hands out raw records and accepts validated input. It never
/// computes derived views, the [Ledger](crate::Ledger) does that after every
/// refresh.
pub trait LedgerStore {
    /// Retrieve every transaction, newest first by date.
    fn fetch_all(&self) -> Result<Vec<TransactionRecord>, Error>;

    /// Retrieve every purpose.
    fn fetch_purposes(&self) -> Result<Vec<Purpose>, Error>;

    /// Create a new transaction in the store.
    fn create(&mut self, transaction: &NewTransaction) -> Result<TransactionRecord, Error>;

    /// Apply `changes` to the transaction `id`.
    ///
    /// Implementers should return [Error::NotFound] if `id` does not refer to
    /// a transaction.
    fn update(
        &mut self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<TransactionRecord, Error>;

    /// Delete the transaction `id`.
    ///
    /// Implementers should return [Error::NotFound] if `id` does not refer to
    /// a transaction.
    fn delete(&mut self, id: TransactionId) -> Result<(), Error>;

    /// Delete every transaction in `ids` and return how many were deleted.
    fn delete_many(&mut self, ids: &[TransactionId]) -> Result<usize, Error>;

    /// Create a new purpose in the store.
    ///
    /// Implementers should return [Error::DuplicatePurposeName] if the name is
    /// taken.
    fn create_purpose(&mut self, name: PurposeName) -> Result<Purpose, Error>;

    /// Rename the purpose `id`.
    fn rename_purpose(&mut self, id: PurposeId, name: PurposeName) -> Result<Purpose, Error>;

    /// Delete the purpose `id`. Its transactions are kept without a purpose.
    fn delete_purpose(&mut self, id: PurposeId) -> Result<(), Error>;
}
