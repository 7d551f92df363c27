//! Implements a SQLite backed ledger store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{PurposeId, TransactionId},
    purpose::{self, Purpose, PurposeName},
    stores::LedgerStore,
    transaction::{self, NewTransaction, TransactionChanges, TransactionRecord},
};

/// Stores transactions and purposes in a SQLite database.
///
/// The purpose and transaction tables must be set up in the database, see
/// [initialize](crate::db::initialize).
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire the database lock: {error}");
            Error::Store(format!("could not acquire the database lock: {error}"))
        })
    }
}

impl LedgerStore for SQLiteLedgerStore {
    fn fetch_all(&self) -> Result<Vec<TransactionRecord>, Error> {
        transaction::get_all_transactions(&*self.lock()?)
    }

    fn fetch_purposes(&self) -> Result<Vec<Purpose>, Error> {
        purpose::get_all_purposes(&*self.lock()?)
    }

    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Store] if `purpose_id` does not refer to a valid purpose,
    /// - or [Error::Store] if there is some other SQL error.
    fn create(&mut self, new_transaction: &NewTransaction) -> Result<TransactionRecord, Error> {
        transaction::insert_transaction(new_transaction, OffsetDateTime::now_utc(), &*self.lock()?)
    }

    fn update(
        &mut self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<TransactionRecord, Error> {
        transaction::update_transaction(id, changes, OffsetDateTime::now_utc(), &*self.lock()?)
    }

    fn delete(&mut self, id: TransactionId) -> Result<(), Error> {
        transaction::delete_transaction(id, &*self.lock()?)
    }

    /// Delete many transactions in a single SQL transaction.
    fn delete_many(&mut self, ids: &[TransactionId]) -> Result<usize, Error> {
        let connection = self.lock()?;
        let tx = connection.unchecked_transaction()?;
        let deleted = transaction::delete_transactions(ids, &tx)?;
        tx.commit()?;

        Ok(deleted)
    }

    fn create_purpose(&mut self, name: PurposeName) -> Result<Purpose, Error> {
        purpose::create_purpose(name, OffsetDateTime::now_utc(), &*self.lock()?)
    }

    fn rename_purpose(&mut self, id: PurposeId, name: PurposeName) -> Result<Purpose, Error> {
        purpose::rename_purpose(id, name, &*self.lock()?)
    }

    fn delete_purpose(&mut self, id: PurposeId) -> Result<(), Error> {
        purpose::delete_purpose(id, &*self.lock()?)
    }
}
