//! Helpers shared by unit tests.

use time::OffsetDateTime;

use crate::{
    purpose::PurposeName,
    transaction::{Amount, Transaction, TransactionType},
};

/// A validated transaction without a purpose.
pub(crate) fn transaction(date: OffsetDateTime, amount: f64, kind: TransactionType) -> Transaction {
    Transaction {
        id: 0,
        date,
        amount: Amount::new(amount).unwrap(),
        kind,
        description: String::new(),
        purpose_id: None,
        purpose_name: None,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

/// A validated transaction tagged with the purpose `purpose`.
pub(crate) fn tagged(
    date: OffsetDateTime,
    amount: f64,
    kind: TransactionType,
    purpose: &str,
) -> Transaction {
    Transaction {
        purpose_id: Some(1),
        purpose_name: Some(PurposeName::new_unchecked(purpose)),
        ..transaction(date, amount, kind)
    }
}

/// A validated transaction with an ID and description.
pub(crate) fn described(
    id: i64,
    date: OffsetDateTime,
    amount: f64,
    kind: TransactionType,
    description: &str,
) -> Transaction {
    Transaction {
        id,
        description: description.to_owned(),
        ..transaction(date, amount, kind)
    }
}
