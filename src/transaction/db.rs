//! Database operations for transactions.
//!
//! Rows are read back as raw [TransactionRecord]s. Validation happens when the
//! ledger ingests them, never here.

use rusqlite::{Connection, Row, params_from_iter, types::Value, types::ValueRef};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::{
    Error,
    database_id::{PurposeId, TransactionId},
    transaction::{NewTransaction, TransactionChanges, TransactionRecord},
};

const SELECT_RECORD: &str = "SELECT t.id, t.date, t.amount, t.type, t.description, t.purpose_id, p.name, t.created_at, t.updated_at
    FROM \"transaction\" t
    LEFT JOIN purpose p ON p.id = t.purpose_id";

/// Insert a transaction and return the stored record.
///
/// # Errors
///
/// Returns [Error::Store] if the purpose ID does not refer to a purpose.
pub fn insert_transaction(
    transaction: &NewTransaction,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<TransactionRecord, Error> {
    let now = format_timestamp(now)?;

    connection
        .execute(
            "INSERT INTO \"transaction\" (date, amount, type, description, purpose_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            (
                format_timestamp(transaction.date)?,
                transaction.amount.value(),
                transaction.kind.as_str(),
                &transaction.description,
                transaction.purpose_id,
                &now,
            ),
        )
        .map_err(|error| map_missing_purpose(error, transaction.purpose_id))?;

    get_transaction(connection.last_insert_rowid(), connection)
}

/// Retrieve a single transaction by ID.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<TransactionRecord, Error> {
    connection
        .prepare(&format!("{SELECT_RECORD} WHERE t.id = :id"))?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve every transaction, newest first by date.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<TransactionRecord>, Error> {
    connection
        .prepare(&format!("{SELECT_RECORD} ORDER BY t.date DESC, t.id ASC"))?
        .query_map([], map_row)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Apply `changes` to a stored transaction and return the updated record.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to a transaction.
pub fn update_transaction(
    id: TransactionId,
    changes: &TransactionChanges,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<TransactionRecord, Error> {
    if changes.is_empty() {
        return get_transaction(id, connection);
    }

    let mut set_clause_parts = vec![];
    let mut query_parameters = vec![];

    let mut set = |column: &str, value: Value| {
        query_parameters.push(value);
        set_clause_parts.push(format!("{column} = ?{}", query_parameters.len()));
    };

    if let Some(date) = changes.date {
        set("date", Value::Text(format_timestamp(date)?));
    }

    if let Some(amount) = changes.amount {
        set("amount", Value::Real(amount.value()));
    }

    if let Some(kind) = changes.kind {
        set("type", Value::Text(kind.as_str().to_owned()));
    }

    if let Some(description) = &changes.description {
        set("description", Value::Text(description.clone()));
    }

    if let Some(purpose_id) = changes.purpose_id {
        set("purpose_id", purpose_id.map_or(Value::Null, Value::Integer));
    }

    set("updated_at", Value::Text(format_timestamp(now)?));
    query_parameters.push(Value::Integer(id));

    let query = format!(
        "UPDATE \"transaction\" SET {} WHERE id = ?{}",
        set_clause_parts.join(", "),
        query_parameters.len()
    );

    let rows_affected = connection
        .execute(&query, params_from_iter(query_parameters.iter()))
        .map_err(|error| map_missing_purpose(error, changes.purpose_id.flatten()))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_transaction(id, connection)
}

/// Delete a transaction by ID. Returns an error if the transaction doesn't exist.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete many transactions at once and return how many were deleted.
///
/// IDs that do not refer to a transaction are ignored.
pub fn delete_transactions(ids: &[TransactionId], connection: &Connection) -> Result<usize, Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = std::iter::repeat_n("?", ids.len())
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!("DELETE FROM \"transaction\" WHERE id IN ({placeholders})");

    connection
        .execute(&query, params_from_iter(ids))
        .map_err(Error::from)
}

/// Initialize the transaction table and indexes.
///
/// The purpose table must exist first.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            type TEXT NOT NULL,
            description TEXT NOT NULL,
            purpose_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(purpose_id) REFERENCES purpose(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
    )?;

    Ok(())
}

/// Format an instant as an RFC 3339 UTC timestamp with whole seconds so that
/// stored dates sort correctly as text.
fn format_timestamp(instant: OffsetDateTime) -> Result<String, Error> {
    instant
        .to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)
        .ok()
        .and_then(|instant| instant.format(&Rfc3339).ok())
        .ok_or_else(|| Error::InvalidRecord(format!("date {instant} cannot be stored")))
}

fn map_missing_purpose(error: rusqlite::Error, purpose_id: Option<PurposeId>) -> Error {
    match error {
        // Code 787 occurs when a FOREIGN KEY constraint failed.
        rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
            let purpose = purpose_id.map_or_else(|| "unknown".to_owned(), |id| id.to_string());
            Error::Store(format!("purpose {purpose} does not exist"))
        }
        error => error.into(),
    }
}

fn raw_text(value: ValueRef) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(integer) => integer.to_string(),
        ValueRef::Real(real) => real.to_string(),
        ValueRef::Text(text) | ValueRef::Blob(text) => String::from_utf8_lossy(text).into_owned(),
    }
}

fn map_row(row: &Row) -> Result<TransactionRecord, rusqlite::Error> {
    Ok(TransactionRecord {
        id: row.get(0)?,
        date: raw_text(row.get_ref(1)?),
        amount: raw_text(row.get_ref(2)?),
        kind: raw_text(row.get_ref(3)?),
        description: row.get(4)?,
        purpose_id: row.get(5)?,
        purpose_name: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
