//! Transactions: the records every ledger view is derived from.
//!
//! This module contains:
//! - The raw [TransactionRecord] supplied by a ledger store and the validated
//!   [Transaction] it is converted into
//! - Input types for creating and updating transactions
//! - Database functions for storing and querying transactions

mod core;
mod db;

pub use core::{
    Amount, NewTransaction, Transaction, TransactionChanges, TransactionDraft, TransactionRecord,
    TransactionType, parse_timestamp,
};
pub use db::{
    create_transaction_table, delete_transaction, delete_transactions, get_all_transactions,
    get_transaction, insert_transaction, update_transaction,
};
