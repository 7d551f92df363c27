//! Implements an in-memory ledger store for tests and demos.

use std::{
    cmp::Reverse,
    sync::{Arc, Mutex, MutexGuard},
};

use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::{
    Error,
    database_id::{PurposeId, TransactionId},
    purpose::{Purpose, PurposeName},
    stores::LedgerStore,
    timezone::CanonicalZone,
    transaction::{NewTransaction, TransactionChanges, TransactionRecord, parse_timestamp},
};

#[derive(Debug, Default)]
struct State {
    records: Vec<TransactionRecord>,
    purposes: Vec<Purpose>,
    next_transaction_id: TransactionId,
    next_purpose_id: PurposeId,
    failure: Option<String>,
}

/// Keeps transactions and purposes in memory.
///
/// Clones share the same state, so a test can keep a handle to a store that
/// has been moved into a [Ledger](crate::Ledger).
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following store call fail with [Error::Store] carrying
    /// `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        if let Ok(mut state) = self.state.lock() {
            state.failure = message.map(str::to_owned);
        }
    }

    /// Add a raw record as if another writer had stored it.
    ///
    /// The record is not validated, which allows malformed rows to be tested.
    pub fn insert_record(&self, record: TransactionRecord) {
        if let Ok(mut state) = self.state.lock() {
            state.next_transaction_id = state.next_transaction_id.max(record.id);
            state.records.push(record);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Error> {
        let state = self
            .state
            .lock()
            .map_err(|error| Error::Store(format!("could not acquire the store lock: {error}")))?;

        match &state.failure {
            Some(message) => Err(Error::Store(message.clone())),
            None => Ok(state),
        }
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn fetch_all(&self) -> Result<Vec<TransactionRecord>, Error> {
        let mut records = self.lock()?.records.clone();
        // Unparsable dates sort last.
        records.sort_by_cached_key(|record| {
            (
                Reverse(parse_timestamp(&record.date, CanonicalZone::Utc).ok()),
                record.id,
            )
        });

        Ok(records)
    }

    fn fetch_purposes(&self) -> Result<Vec<Purpose>, Error> {
        Ok(self.lock()?.purposes.clone())
    }

    fn create(&mut self, transaction: &NewTransaction) -> Result<TransactionRecord, Error> {
        let mut state = self.lock()?;
        let purpose_name = resolve_purpose(&state.purposes, transaction.purpose_id)?;
        let now = format_timestamp(OffsetDateTime::now_utc())?;

        state.next_transaction_id += 1;
        let record = TransactionRecord {
            id: state.next_transaction_id,
            date: format_timestamp(transaction.date)?,
            amount: transaction.amount.value().to_string(),
            kind: transaction.kind.as_str().to_owned(),
            description: transaction.description.clone(),
            purpose_id: transaction.purpose_id,
            purpose_name,
            created_at: now.clone(),
            updated_at: now,
        };
        state.records.push(record.clone());

        Ok(record)
    }

    fn update(
        &mut self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<TransactionRecord, Error> {
        let mut state = self.lock()?;
        let purpose_name = match changes.purpose_id {
            Some(purpose_id) => Some(resolve_purpose(&state.purposes, purpose_id)?),
            None => None,
        };
        let record = state
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(Error::NotFound)?;

        if changes.is_empty() {
            return Ok(record.clone());
        }

        if let Some(date) = changes.date {
            record.date = format_timestamp(date)?;
        }
        if let Some(amount) = changes.amount {
            record.amount = amount.value().to_string();
        }
        if let Some(kind) = changes.kind {
            record.kind = kind.as_str().to_owned();
        }
        if let Some(description) = &changes.description {
            record.description = description.clone();
        }
        if let (Some(purpose_id), Some(purpose_name)) = (changes.purpose_id, purpose_name) {
            record.purpose_id = purpose_id;
            record.purpose_name = purpose_name;
        }
        record.updated_at = format_timestamp(OffsetDateTime::now_utc())?;

        Ok(record.clone())
    }

    fn delete(&mut self, id: TransactionId) -> Result<(), Error> {
        let mut state = self.lock()?;
        let count_before = state.records.len();
        state.records.retain(|record| record.id != id);

        if state.records.len() == count_before {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn delete_many(&mut self, ids: &[TransactionId]) -> Result<usize, Error> {
        let mut state = self.lock()?;
        let count_before = state.records.len();
        state.records.retain(|record| !ids.contains(&record.id));

        Ok(count_before - state.records.len())
    }

    fn create_purpose(&mut self, name: PurposeName) -> Result<Purpose, Error> {
        let mut state = self.lock()?;

        if state.purposes.iter().any(|purpose| purpose.name == name) {
            return Err(Error::DuplicatePurposeName(name.to_string()));
        }

        state.next_purpose_id += 1;
        let purpose = Purpose {
            id: state.next_purpose_id,
            name,
            created_at: OffsetDateTime::now_utc(),
        };
        state.purposes.push(purpose.clone());

        Ok(purpose)
    }

    fn rename_purpose(&mut self, id: PurposeId, name: PurposeName) -> Result<Purpose, Error> {
        let mut state = self.lock()?;

        if state
            .purposes
            .iter()
            .any(|purpose| purpose.name == name && purpose.id != id)
        {
            return Err(Error::DuplicatePurposeName(name.to_string()));
        }

        let purpose = state
            .purposes
            .iter_mut()
            .find(|purpose| purpose.id == id)
            .ok_or(Error::NotFound)?;
        purpose.name = name.clone();
        let purpose = purpose.clone();

        for record in state
            .records
            .iter_mut()
            .filter(|record| record.purpose_id == Some(id))
        {
            record.purpose_name = Some(name.to_string());
        }

        Ok(purpose)
    }

    fn delete_purpose(&mut self, id: PurposeId) -> Result<(), Error> {
        let mut state = self.lock()?;
        let count_before = state.purposes.len();
        state.purposes.retain(|purpose| purpose.id != id);

        if state.purposes.len() == count_before {
            return Err(Error::NotFound);
        }

        for record in state
            .records
            .iter_mut()
            .filter(|record| record.purpose_id == Some(id))
        {
            record.purpose_id = None;
            record.purpose_name = None;
        }

        Ok(())
    }
}

/// The name of the purpose `purpose_id`, `None` for no purpose.
fn resolve_purpose(
    purposes: &[Purpose],
    purpose_id: Option<PurposeId>,
) -> Result<Option<String>, Error> {
    let Some(purpose_id) = purpose_id else {
        return Ok(None);
    };

    purposes
        .iter()
        .find(|purpose| purpose.id == purpose_id)
        .map(|purpose| Some(purpose.name.to_string()))
        .ok_or_else(|| Error::Store(format!("purpose {purpose_id} does not exist")))
}

fn format_timestamp(instant: OffsetDateTime) -> Result<String, Error> {
    instant
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|error| Error::InvalidRecord(format!("date {instant} cannot be stored: {error}")))
}
