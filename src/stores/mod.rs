//! Contains the ledger store trait and its implementations.

mod ledger;
mod memory;

pub mod sqlite;

pub use ledger::LedgerStore;
pub use memory::InMemoryLedgerStore;
