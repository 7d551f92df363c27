//! The last-known-good record set and the projections memoized over it.

use std::{cell::OnceCell, collections::BTreeMap, fmt::Display};

use sha2::{Digest, Sha256};

use crate::{
    Error,
    analytics::{
        BalancedBucket, CategoryTotal, LedgerTotals, PeriodKey, category_totals,
        grouped_by_period, ledger_totals, monthly_balances, yearly_balances,
    },
    timezone::CanonicalZone,
    transaction::Transaction,
};

/// A SHA-256 digest identifying the contents of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hash every field of every record that a projection can read, in order.
    pub fn of(records: &[Transaction]) -> Self {
        let mut hasher = Sha256::new();

        for record in records {
            hasher.update(record.id.to_le_bytes());
            hasher.update(record.date.unix_timestamp_nanos().to_le_bytes());
            hasher.update(record.amount.value().to_bits().to_le_bytes());
            hasher.update(record.kind.as_str());
            hasher.update((record.description.len() as u64).to_le_bytes());
            hasher.update(&record.description);
            hasher.update(record.purpose_id.unwrap_or(-1).to_le_bytes());
            let label = record.purpose_label();
            hasher.update((label.len() as u64).to_le_bytes());
            hasher.update(label);
        }

        Self(hasher.finalize().into())
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

/// Projections computed at most once for the record set with fingerprint `key`.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    key: Option<Fingerprint>,
    totals: OnceCell<LedgerTotals>,
    category_totals: OnceCell<Vec<CategoryTotal>>,
    monthly_balances: OnceCell<Vec<BalancedBucket>>,
    yearly_balances: OnceCell<Vec<BalancedBucket>>,
    grouped_by_period: OnceCell<BTreeMap<PeriodKey, Vec<Transaction>>>,
}

impl ProjectionCache {
    pub fn new(key: Fingerprint) -> Self {
        Self {
            key: Some(key),
            ..Default::default()
        }
    }

    /// The fingerprint of the record set the cached values belong to.
    pub fn key(&self) -> Option<Fingerprint> {
        self.key
    }

    /// Drop every cached value and rekey the cache.
    pub fn invalidate(&mut self, key: Fingerprint) {
        tracing::debug!("invalidating projection cache, new key {key}");
        *self = Self::new(key);
    }
}

fn get_or_try_init<T>(
    cell: &OnceCell<T>,
    init: impl FnOnce() -> Result<T, Error>,
) -> Result<&T, Error> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }

    let value = init()?;

    Ok(cell.get_or_init(|| value))
}

/// An immutable, validated record set and its memoized projections.
///
/// A new snapshot is built on every successful refresh. Nothing computed for
/// an earlier snapshot is ever visible through a later one.
#[derive(Debug)]
pub struct Snapshot {
    records: Vec<Transaction>,
    zone: CanonicalZone,
    cache: ProjectionCache,
}

impl Snapshot {
    pub fn new(records: Vec<Transaction>, zone: CanonicalZone) -> Self {
        let cache = ProjectionCache::new(Fingerprint::of(&records));

        Self {
            records,
            zone,
            cache,
        }
    }

    pub fn empty(zone: CanonicalZone) -> Self {
        Self::new(Vec::new(), zone)
    }

    /// The validated records, newest first.
    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn zone(&self) -> CanonicalZone {
        self.zone
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.cache.key()
    }

    /// Replace the records, clearing every memoized projection.
    pub fn replace(&mut self, records: Vec<Transaction>) {
        self.cache.invalidate(Fingerprint::of(&records));
        self.records = records;
    }

    pub fn totals(&self) -> &LedgerTotals {
        self.cache
            .totals
            .get_or_init(|| ledger_totals(&self.records))
    }

    pub fn category_totals(&self) -> &[CategoryTotal] {
        self.cache
            .category_totals
            .get_or_init(|| category_totals(&self.records))
    }

    pub fn monthly_balances(&self) -> Result<&[BalancedBucket], Error> {
        get_or_try_init(&self.cache.monthly_balances, || {
            monthly_balances(&self.records, self.zone)
        })
        .map(Vec::as_slice)
    }

    pub fn yearly_balances(&self) -> Result<&[BalancedBucket], Error> {
        get_or_try_init(&self.cache.yearly_balances, || {
            yearly_balances(&self.records, self.zone)
        })
        .map(Vec::as_slice)
    }

    pub fn grouped_by_period(&self) -> &BTreeMap<PeriodKey, Vec<Transaction>> {
        self.cache
            .grouped_by_period
            .get_or_init(|| grouped_by_period(&self.records, self.zone))
    }
}
