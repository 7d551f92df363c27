//! Contains the SQLite backend for the [LedgerStore](crate::stores::LedgerStore).

mod ledger;

pub use ledger::SQLiteLedgerStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// Creates a [SQLiteLedgerStore] for `db_connection`.
///
/// This function will modify the database by adding the tables for the ledger
/// to the database.
pub fn create_ledger_store(db_connection: Connection) -> Result<SQLiteLedgerStore, Error> {
    initialize(&db_connection)?;

    Ok(SQLiteLedgerStore::new(Arc::new(Mutex::new(db_connection))))
}
