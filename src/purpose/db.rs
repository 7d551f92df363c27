//! Database operations for purposes.

use rusqlite::{Connection, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    database_id::PurposeId,
    purpose::{Purpose, PurposeName},
};

/// Create a purpose and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicatePurposeName] if a purpose with the same name exists.
pub fn create_purpose(
    name: PurposeName,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Purpose, Error> {
    let created_at = created_at.to_offset(UtcOffset::UTC);

    connection
        .execute(
            "INSERT INTO purpose (name, created_at) VALUES (?1, ?2);",
            (name.as_ref(), created_at),
        )
        .map_err(|error| map_unique_violation(error, &name))?;

    let id = connection.last_insert_rowid();

    Ok(Purpose {
        id,
        name,
        created_at,
    })
}

/// Retrieve a single purpose by ID.
pub fn get_purpose(purpose_id: PurposeId, connection: &Connection) -> Result<Purpose, Error> {
    connection
        .prepare("SELECT id, name, created_at FROM purpose WHERE id = :id;")?
        .query_row(&[(":id", &purpose_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all purposes, newest first.
pub fn get_all_purposes(connection: &Connection) -> Result<Vec<Purpose>, Error> {
    connection
        .prepare("SELECT id, name, created_at FROM purpose ORDER BY created_at DESC, id DESC;")?
        .query_map([], map_row)?
        .map(|maybe_purpose| maybe_purpose.map_err(|error| error.into()))
        .collect()
}

/// Rename a purpose. Returns an error if the purpose doesn't exist.
pub fn rename_purpose(
    purpose_id: PurposeId,
    new_name: PurposeName,
    connection: &Connection,
) -> Result<Purpose, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE purpose SET name = ?1 WHERE id = ?2",
            (new_name.as_ref(), purpose_id),
        )
        .map_err(|error| map_unique_violation(error, &new_name))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_purpose(purpose_id, connection)
}

/// Delete a purpose by ID. Returns an error if the purpose doesn't exist.
///
/// Transactions that referenced the purpose are kept with no purpose.
pub fn delete_purpose(purpose_id: PurposeId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM purpose WHERE id = ?1", [purpose_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Initialize the purpose table and indexes.
pub fn create_purpose_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS purpose (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_purpose_created_at ON purpose(created_at);",
    )?;

    Ok(())
}

fn map_unique_violation(error: rusqlite::Error, name: &PurposeName) -> Error {
    match error {
        // Code 2067 occurs when a UNIQUE constraint failed.
        rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
            Error::DuplicatePurposeName(name.to_string())
        }
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<Purpose, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = PurposeName::new_unchecked(&raw_name);
    let created_at = row.get(2)?;

    Ok(Purpose {
        id,
        name,
        created_at,
    })
}
