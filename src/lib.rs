//! Ledger Lens derives time-bucketed aggregates from a ledger of income and
//! expense transactions.
//!
//! The library takes the full, unordered record set of a ledger store and
//! computes calendar buckets (hour to year), running balances,
//! period-over-period growth, category breakdowns and exports from it. All
//! calendar arithmetic happens in one configured [CanonicalZone].
//!
//! [Ledger] is the entry point for applications: it owns a [LedgerStore],
//! refreshes a validated snapshot of its records and serves every view from
//! that snapshot. The pure functions in [analytics] can also be used directly.

pub mod analytics;
mod config;
mod database_id;
pub mod db;
mod error;
pub mod export;
mod filters;
pub mod format;
mod ledger;
pub mod logging;
mod pagination;
pub mod purpose;
mod snapshot;
pub mod stores;
#[cfg(test)]
mod test_utils;
mod timezone;
pub mod transaction;

pub use config::LedgerConfig;
pub use database_id::{PurposeId, TransactionId};
pub use error::Error;
pub use filters::{FilterField, TransactionFilters, apply_filters};
pub use ledger::{Ledger, LoadingFlag, RefreshReport, RejectedRecord};
pub use pagination::{Page, PaginationConfig, paginate};
pub use snapshot::{Fingerprint, ProjectionCache, Snapshot};
pub use stores::{InMemoryLedgerStore, LedgerStore};
pub use timezone::CanonicalZone;
