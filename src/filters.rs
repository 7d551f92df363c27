//! Equality and substring filters over the transaction list.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, transaction::Transaction};

/// The active transaction filters. An empty string disables a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilters {
    /// Exact match on the resolved purpose name, "Other" matches unresolved
    /// purposes.
    pub purpose: String,
    /// Exact match on the transaction type, "income" or "expense".
    #[serde(rename = "type")]
    pub kind: String,
    /// Case-insensitive substring of the description.
    pub search_query: String,
}

/// Names one of the fields of [TransactionFilters].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Purpose,
    Type,
    SearchQuery,
}

impl FromStr for FilterField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purpose" => Ok(Self::Purpose),
            "type" => Ok(Self::Type),
            "search" | "search_query" => Ok(Self::SearchQuery),
            other => Err(Error::InvalidRecord(format!(
                "filter \"{other}\" is not one of purpose, type or search"
            ))),
        }
    }
}

impl Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Purpose => f.write_str("purpose"),
            Self::Type => f.write_str("type"),
            Self::SearchQuery => f.write_str("search"),
        }
    }
}

impl TransactionFilters {
    pub fn set(&mut self, field: FilterField, value: &str) {
        let value = value.trim().to_owned();

        match field {
            FilterField::Purpose => self.purpose = value,
            FilterField::Type => self.kind = value,
            FilterField::SearchQuery => self.search_query = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.purpose.is_empty() && self.kind.is_empty() && self.search_query.is_empty()
    }

    /// Whether `transaction` passes every active filter.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let purpose_matches =
            self.purpose.is_empty() || transaction.purpose_label() == self.purpose;
        let kind_matches = self.kind.is_empty() || transaction.kind.as_str() == self.kind;
        let search_matches = self.search_query.is_empty()
            || transaction
                .description
                .to_lowercase()
                .contains(&self.search_query.to_lowercase());

        purpose_matches && kind_matches && search_matches
    }
}

/// The transactions that pass every active filter, in the order given.
pub fn apply_filters(records: &[Transaction], filters: &TransactionFilters) -> Vec<Transaction> {
    records
        .iter()
        .filter(|record| filters.matches(record))
        .cloned()
        .collect()
}
