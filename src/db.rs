//! Creates the schema of the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, purpose::create_purpose_table, transaction::create_transaction_table};

/// Create the tables used by the ledger if they do not exist yet.
///
/// Foreign key enforcement is switched on for `connection`, it is needed for
/// a deleted purpose to leave its transactions unresolved.
///
/// # Errors
///
/// Returns an [Error::Store] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_purpose_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
