//! Calendar period keys and the period bucketer.
//!
//! Every transaction timestamp is converted to wall clock time in the
//! [CanonicalZone] before it is assigned to an hour, day, week, month or year.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{Serialize, Serializer};
use time::{Date, Duration, PrimitiveDateTime, Time, macros::time};

use crate::{
    Error,
    timezone::CanonicalZone,
    transaction::{Transaction, TransactionType},
};

/// The calendar unit used for bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// The key of the calendar unit containing the wall clock time `local`.
    ///
    /// Weeks start on Sunday.
    pub fn key_for(self, local: PrimitiveDateTime) -> PeriodKey {
        let date = local.date();

        match self {
            Self::Hour => PeriodKey::Hour(
                PrimitiveDateTime::new(date, Time::MIDNIGHT) + Duration::hours(local.hour().into()),
            ),
            Self::Day => PeriodKey::Day(date),
            Self::Week => PeriodKey::Week(start_of_week(date)),
            Self::Month => PeriodKey::Month {
                year: date.year(),
                month: u8::from(date.month()),
            },
            Self::Year => PeriodKey::Year(date.year()),
        }
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(Error::InvalidRecord(format!(
                "granularity \"{other}\" is not one of hour, day, week, month or year"
            ))),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The Sunday that begins the week containing `date`.
pub fn start_of_week(date: Date) -> Date {
    date - Duration::days(date.weekday().number_days_from_sunday().into())
}

/// The first day of the month containing `date`.
pub fn start_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Identifies exactly one calendar unit.
///
/// Keys of the same granularity order chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    /// The start of the hour.
    Hour(PrimitiveDateTime),
    Day(Date),
    /// The Sunday the week starts on.
    Week(Date),
    Month { year: i32, month: u8 },
    Year(i32),
}

impl PeriodKey {
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Hour(_) => Granularity::Hour,
            Self::Day(_) => Granularity::Day,
            Self::Week(_) => Granularity::Week,
            Self::Month { .. } => Granularity::Month,
            Self::Year(_) => Granularity::Year,
        }
    }

    /// The key of the following calendar unit, or `None` past the end of the
    /// representable calendar.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Hour(start) => start.checked_add(Duration::HOUR).map(Self::Hour),
            Self::Day(date) => date.next_day().map(Self::Day),
            Self::Week(date) => date.checked_add(Duration::WEEK).map(Self::Week),
            Self::Month { year, month: 12 } => year
                .checked_add(1)
                .map(|year| Self::Month { year, month: 1 }),
            Self::Month { year, month } => Some(Self::Month {
                year,
                month: month + 1,
            }),
            Self::Year(year) => year.checked_add(1).map(Self::Year),
        }
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hour(start) => write!(f, "{}T{:02}:00:00", start.date(), start.hour()),
            Self::Day(date) | Self::Week(date) => write!(f, "{date}"),
            Self::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Year(year) => write!(f, "{year}"),
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An inclusive range of wall clock times in the canonical zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

impl PeriodRange {
    /// The range from the start of `start` to the last hour of `end`.
    pub fn from_dates(start: Date, end: Date) -> Self {
        Self {
            start: PrimitiveDateTime::new(start, Time::MIDNIGHT),
            end: PrimitiveDateTime::new(end, time!(23:00)),
        }
    }

    /// The range from the earliest to the latest transaction, or `None` when
    /// there are no transactions.
    pub fn spanning(records: &[Transaction], zone: CanonicalZone) -> Option<Self> {
        let start = records.iter().map(|record| record.date).min()?;
        let end = records.iter().map(|record| record.date).max()?;

        Some(Self {
            start: zone.to_local(start),
            end: zone.to_local(end),
        })
    }
}

/// The income and expenses of one calendar unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub period: PeriodKey,
    pub income: f64,
    pub expense: f64,
    pub transaction_count: usize,
}

impl Bucket {
    pub fn empty(period: PeriodKey) -> Self {
        Self {
            period,
            income: 0.0,
            expense: 0.0,
            transaction_count: 0,
        }
    }

    /// Income minus expenses.
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }

    fn add(&mut self, transaction: &Transaction) {
        match transaction.kind {
            TransactionType::Income => self.income += transaction.amount.value(),
            TransactionType::Expense => self.expense += transaction.amount.value(),
        }

        self.transaction_count += 1;
    }
}

/// Aggregate `records` into one bucket per calendar unit in `range`.
///
/// The bounds of `range` are widened to the units containing them. Units
/// without transactions still get a zeroed bucket, so the result has no gaps
/// and is strictly ascending. Records outside the range are ignored. An empty
/// sequence is returned if `range.start` is after `range.end`.
pub fn bucket(
    records: &[Transaction],
    granularity: Granularity,
    range: PeriodRange,
    zone: CanonicalZone,
) -> Vec<Bucket> {
    if range.start > range.end {
        return Vec::new();
    }

    let last = granularity.key_for(range.end);
    let mut buckets = Vec::new();
    let mut index_by_key = HashMap::new();
    let mut next_key = Some(granularity.key_for(range.start));

    while let Some(key) = next_key.filter(|key| *key <= last) {
        index_by_key.insert(key, buckets.len());
        buckets.push(Bucket::empty(key));
        next_key = key.next();
    }

    for record in records {
        let key = granularity.key_for(zone.to_local(record.date));

        if let Some(&index) = index_by_key.get(&key) {
            buckets[index].add(record);
        }
    }

    tracing::debug!(
        "bucketed {} records into {} {} buckets",
        records.len(),
        buckets.len(),
        granularity
    );

    buckets
}
