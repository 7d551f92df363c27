//! Defines the transaction record model and its ingestion rules.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    Error,
    database_id::{PurposeId, TransactionId},
    purpose::{PurposeName, UNRESOLVED_PURPOSE_LABEL},
    timezone::CanonicalZone,
};

// ============================================================================
// FIELD TYPES
// ============================================================================

/// Whether money was earned or spent.
///
/// The sign of a transaction is carried here, never by its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// The string stored in the ledger for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::InvalidRecord(format!(
                "type \"{other}\" is not one of \"income\" or \"expense\""
            ))),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-negative, finite amount of money.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0.0);

    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidRecord] if `value` is negative, NaN or infinite.
    pub fn new(value: f64) -> Result<Self, Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidRecord(format!(
                "amount {value} is not a non-negative number"
            )));
        }

        // Folds -0.0 into 0.0.
        Ok(Self(value.abs()))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|_| {
            Error::InvalidRecord(format!("amount \"{s}\" is not a non-negative number"))
        })?;

        Amount::new(value)
    }
}

impl TryFrom<f64> for Amount {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

/// Parse a transaction timestamp.
///
/// Accepts RFC 3339 timestamps with an explicit offset. Timestamps without an
/// offset (`YYYY-MM-DDTHH:MM[:SS[.fff]]`, `YYYY-MM-DD HH:MM:SS[.fff]`) and
/// plain dates (`YYYY-MM-DD`, read as midnight) are wall clock times in `zone`.
///
/// # Errors
///
/// Returns [Error::InvalidRecord] if `text` matches none of these forms.
pub fn parse_timestamp(text: &str, zone: CanonicalZone) -> Result<OffsetDateTime, Error> {
    let text = text.trim();

    if let Ok(instant) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(instant);
    }

    let local = PrimitiveDateTime::parse(
        text,
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
        ),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            text,
            format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
            ),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(text, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    })
    .or_else(|_| {
        Date::parse(text, format_description!("[year]-[month]-[day]"))
            .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
    })
    .map_err(|_| Error::InvalidRecord(format!("date \"{text}\" is not a calendar timestamp")))?;

    Ok(zone.from_local(local))
}

// ============================================================================
// MODELS
// ============================================================================

/// A transaction row exactly as the ledger store supplies it.
///
/// Nothing about a record is trusted until it has been converted with
/// [Transaction::from_record].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub date: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub purpose_id: Option<PurposeId>,
    /// The name of the purpose `purpose_id` refers to, if it still exists.
    pub purpose_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An income or expense that has passed validation.
///
/// Instances are read-only snapshots of the ledger store's state. Every
/// derived view is computed from slices of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    pub purpose_id: Option<PurposeId>,
    pub purpose_name: Option<PurposeName>,
    /// Audit timestamps, not used in aggregation.
    pub created_at: String,
    pub updated_at: String,
}

impl Transaction {
    /// Validate a raw store record.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidRecord] if the amount is not a non-negative
    /// number, the date is not a calendar timestamp or the type is not
    /// "income" or "expense".
    pub fn from_record(record: TransactionRecord, zone: CanonicalZone) -> Result<Self, Error> {
        let amount = record.amount.parse()?;
        let date = parse_timestamp(&record.date, zone)?;
        let kind = record.kind.parse()?;
        let purpose_name = record
            .purpose_name
            .as_deref()
            .and_then(|name| PurposeName::new(name).ok());

        Ok(Self {
            id: record.id,
            date,
            amount,
            kind,
            description: record.description,
            purpose_id: record.purpose_id,
            purpose_name,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// The resolved purpose name, or "Other" when the purpose is missing.
    pub fn purpose_label(&self) -> &str {
        self.purpose_name
            .as_ref()
            .map(|name| name.as_ref())
            .unwrap_or(UNRESOLVED_PURPOSE_LABEL)
    }

    /// The amount with income positive and expenses negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount.value(),
            TransactionType::Expense => -self.amount.value(),
        }
    }
}

/// A validated transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: OffsetDateTime,
    pub amount: Amount,
    pub kind: TransactionType,
    pub description: String,
    pub purpose_id: Option<PurposeId>,
}

impl NewTransaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] without a purpose for discoverability.
    pub fn build(
        date: OffsetDateTime,
        amount: Amount,
        kind: TransactionType,
        description: &str,
    ) -> Self {
        Self {
            date,
            amount,
            kind,
            description: description.to_owned(),
            purpose_id: None,
        }
    }

    /// Set the purpose of the transaction.
    pub fn purpose_id(mut self, purpose_id: Option<PurposeId>) -> Self {
        self.purpose_id = purpose_id;
        self
    }
}

/// Unvalidated user input for a new transaction, e.g. from a form or the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDraft {
    pub date: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub purpose_id: Option<PurposeId>,
}

impl TransactionDraft {
    /// Validate the draft.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidRecord] under the same rules as
    /// [Transaction::from_record].
    pub fn validate(self, zone: CanonicalZone) -> Result<NewTransaction, Error> {
        Ok(NewTransaction {
            date: parse_timestamp(&self.date, zone)?,
            amount: self.amount.parse()?,
            kind: self.kind.parse()?,
            description: self.description,
            purpose_id: self.purpose_id,
        })
    }
}

/// A partial update to a stored transaction. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionChanges {
    pub date: Option<OffsetDateTime>,
    pub amount: Option<Amount>,
    pub kind: Option<TransactionType>,
    pub description: Option<String>,
    /// `Some(None)` clears the purpose.
    pub purpose_id: Option<Option<PurposeId>>,
}

impl TransactionChanges {
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }

    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    pub fn purpose_id(mut self, purpose_id: Option<PurposeId>) -> Self {
        self.purpose_id = Some(purpose_id);
        self
    }

    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.description.is_none()
            && self.purpose_id.is_none()
    }
}

// ============================================================================
// TESTS
// ============================================================================
