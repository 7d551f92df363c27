//! Read-only views derived from a transaction record set.
//!
//! Every function here is a pure function of its arguments: the same records
//! always produce the same output and nothing is retained between calls.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    analytics::{
        balance::{BalancedBucket, accumulate},
        period::{Bucket, Granularity, PeriodKey, PeriodRange, bucket},
    },
    purpose::UNRESOLVED_PURPOSE_LABEL,
    timezone::CanonicalZone,
    transaction::{Transaction, TransactionType},
};

/// The overall totals of a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerTotals {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub transaction_count: usize,
}

pub fn ledger_totals(records: &[Transaction]) -> LedgerTotals {
    let (income, expenses) =
        records
            .iter()
            .fold((0.0, 0.0), |(income, expenses), record| match record.kind {
                TransactionType::Income => (income + record.amount.value(), expenses),
                TransactionType::Expense => (income, expenses + record.amount.value()),
            });

    LedgerTotals {
        income,
        expenses,
        net: income - expenses,
        transaction_count: records.len(),
    }
}

/// The total spent on a single purpose.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub value: f64,
}

/// Sums expenses by resolved purpose name.
///
/// Income is excluded, this view shows where spending went. Transactions
/// without a resolvable purpose are grouped under "Other", which is sorted
/// last. The remaining purposes are sorted alphabetically.
pub fn category_totals(records: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for record in records
        .iter()
        .filter(|record| record.kind == TransactionType::Expense)
    {
        *totals.entry(record.purpose_label()).or_insert(0.0) += record.amount.value();
    }

    let mut names: Vec<&str> = totals
        .keys()
        .copied()
        .filter(|&name| name != UNRESOLVED_PURPOSE_LABEL)
        .collect();
    names.sort();

    if totals.contains_key(UNRESOLVED_PURPOSE_LABEL) {
        names.push(UNRESOLVED_PURPOSE_LABEL);
    }

    names
        .into_iter()
        .map(|name| CategoryTotal {
            name: name.to_owned(),
            value: totals[name],
        })
        .collect()
}

/// The `limit` most recent transactions, newest first.
///
/// Transactions with the same date keep the order they were given in.
pub fn recent_activity(records: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted: Vec<&Transaction> = records.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    sorted.into_iter().take(limit).cloned().collect()
}

/// Groups transactions by the calendar month they fall in.
///
/// Months are in ascending order and transactions keep the order they were
/// given in. Records only reach this function after their date has been
/// validated, rows with unparsable dates are excluded (and logged) at
/// ingestion.
pub fn grouped_by_period(
    records: &[Transaction],
    zone: CanonicalZone,
) -> BTreeMap<PeriodKey, Vec<Transaction>> {
    let mut groups: BTreeMap<PeriodKey, Vec<Transaction>> = BTreeMap::new();

    for record in records {
        let key = Granularity::Month.key_for(zone.to_local(record.date));
        groups.entry(key).or_default().push(record.clone());
    }

    groups
}

/// Running balances per calendar month from the first to the last transaction.
///
/// # Errors
///
/// Returns [Error::Computation] if the balance invariants are violated.
pub fn monthly_balances(
    records: &[Transaction],
    zone: CanonicalZone,
) -> Result<Vec<BalancedBucket>, Error> {
    history_balances(records, Granularity::Month, None, zone)
}

/// Running balances per calendar year from the first to the last transaction.
///
/// # Errors
///
/// Returns [Error::Computation] if the balance invariants are violated.
pub fn yearly_balances(
    records: &[Transaction],
    zone: CanonicalZone,
) -> Result<Vec<BalancedBucket>, Error> {
    history_balances(records, Granularity::Year, None, zone)
}

/// The balances of the month and year containing `now`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentPeriodBalances {
    pub month: BalancedBucket,
    pub year: BalancedBucket,
}

/// Balances for the current month and year.
///
/// A period after the last transaction carries the last closing balance
/// forward. A period with no history at all is zeroed.
///
/// # Errors
///
/// Returns [Error::Computation] if the balance invariants are violated.
pub fn current_period_balances(
    records: &[Transaction],
    now: OffsetDateTime,
    zone: CanonicalZone,
) -> Result<CurrentPeriodBalances, Error> {
    let current = |granularity: Granularity| -> Result<BalancedBucket, Error> {
        let key = granularity.key_for(zone.to_local(now));
        let balances = history_balances(records, granularity, Some(now), zone)?;

        Ok(balances
            .into_iter()
            .find(|balance| balance.bucket.period == key)
            .unwrap_or_else(|| BalancedBucket::zeroed(Bucket::empty(key))))
    };

    Ok(CurrentPeriodBalances {
        month: current(Granularity::Month)?,
        year: current(Granularity::Year)?,
    })
}

fn history_balances(
    records: &[Transaction],
    granularity: Granularity,
    extend_to: Option<OffsetDateTime>,
    zone: CanonicalZone,
) -> Result<Vec<BalancedBucket>, Error> {
    let Some(mut range) = PeriodRange::spanning(records, zone) else {
        return Ok(Vec::new());
    };

    if let Some(instant) = extend_to {
        range.end = range.end.max(zone.to_local(instant));
    }

    accumulate(bucket(records, granularity, range, zone))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        analytics::period::PeriodKey,
        test_utils::{described, tagged, transaction},
        timezone::CanonicalZone,
        transaction::TransactionType,
    };

    use super::{
        category_totals, current_period_balances, grouped_by_period, ledger_totals,
        monthly_balances, recent_activity, yearly_balances,
    };

    #[test]
    fn category_totals_only_counts_expenses() {
        let records = vec![
            tagged(datetime!(2024-03-01 00:00 UTC), 30.0, TransactionType::Expense, "Food"),
            tagged(datetime!(2024-03-02 00:00 UTC), 20.0, TransactionType::Expense, "Food"),
            transaction(datetime!(2024-03-03 00:00 UTC), 500.0, TransactionType::Income),
        ];

        let totals = category_totals(&records);

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].name, "Food");
        assert_eq!(totals[0].value, 50.0);
    }

    #[test]
    fn category_totals_sum_to_total_expenses() {
        let records = vec![
            tagged(datetime!(2024-03-01 00:00 UTC), 30.0, TransactionType::Expense, "Rent"),
            transaction(datetime!(2024-03-02 00:00 UTC), 12.5, TransactionType::Expense),
            tagged(datetime!(2024-03-02 00:00 UTC), 7.5, TransactionType::Expense, "Bills"),
            tagged(datetime!(2024-03-03 00:00 UTC), 90.0, TransactionType::Income, "Rent"),
        ];

        let totals = category_totals(&records);

        let names: Vec<&str> = totals.iter().map(|total| total.name.as_str()).collect();
        assert_eq!(names, vec!["Bills", "Rent", "Other"]);
        let sum: f64 = totals.iter().map(|total| total.value).sum();
        assert_eq!(sum, ledger_totals(&records).expenses);
    }

    #[test]
    fn recent_activity_is_newest_first_and_stable() {
        let records = vec![
            described(1, datetime!(2024-03-01 00:00 UTC), 1.0, TransactionType::Income, "a"),
            described(2, datetime!(2024-03-03 00:00 UTC), 1.0, TransactionType::Income, "b"),
            described(3, datetime!(2024-03-02 00:00 UTC), 1.0, TransactionType::Income, "c"),
            described(4, datetime!(2024-03-03 00:00 UTC), 1.0, TransactionType::Income, "d"),
        ];

        let recent = recent_activity(&records, 3);

        let ids: Vec<i64> = recent.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![2, 4, 3]);
    }

    #[test]
    fn recent_activity_with_fewer_records_than_limit() {
        let records = vec![transaction(
            datetime!(2024-03-01 00:00 UTC),
            1.0,
            TransactionType::Income,
        )];

        assert_eq!(recent_activity(&records, 5).len(), 1);
    }

    #[test]
    fn grouped_by_period_keys_by_month() {
        let records = vec![
            described(1, datetime!(2024-04-02 00:00 UTC), 1.0, TransactionType::Income, ""),
            described(2, datetime!(2024-03-15 00:00 UTC), 1.0, TransactionType::Income, ""),
            described(3, datetime!(2024-03-01 00:00 UTC), 1.0, TransactionType::Income, ""),
        ];

        let groups = grouped_by_period(&records, CanonicalZone::Utc);

        let keys: Vec<String> = groups.keys().map(|key| key.to_string()).collect();
        assert_eq!(keys, vec!["2024-03", "2024-04"]);
        let march: Vec<i64> = groups[&PeriodKey::Month {
            year: 2024,
            month: 3,
        }]
        .iter()
        .map(|record| record.id)
        .collect();
        assert_eq!(march, vec![2, 3]);
    }

    #[test]
    fn projections_are_idempotent() {
        let records = vec![
            tagged(datetime!(2024-03-01 00:00 UTC), 30.0, TransactionType::Expense, "Food"),
            transaction(datetime!(2024-05-03 00:00 UTC), 500.0, TransactionType::Income),
        ];

        assert_eq!(category_totals(&records), category_totals(&records));
        assert_eq!(recent_activity(&records, 5), recent_activity(&records, 5));
        assert_eq!(
            monthly_balances(&records, CanonicalZone::Utc),
            monthly_balances(&records, CanonicalZone::Utc)
        );
    }

    #[test]
    fn monthly_balances_fill_empty_months() {
        let records = vec![
            transaction(datetime!(2024-01-10 00:00 UTC), 100.0, TransactionType::Income),
            transaction(datetime!(2024-03-10 00:00 UTC), 30.0, TransactionType::Expense),
        ];

        let balances = monthly_balances(&records, CanonicalZone::Utc).unwrap();

        let closing: Vec<f64> = balances.iter().map(|b| b.closing_balance).collect();
        assert_eq!(closing, vec![100.0, 100.0, 70.0]);
        assert_eq!(balances[1].bucket.transaction_count, 0);
    }

    #[test]
    fn yearly_balances_span_history() {
        let records = vec![
            transaction(datetime!(2022-06-10 00:00 UTC), 100.0, TransactionType::Income),
            transaction(datetime!(2024-03-10 00:00 UTC), 30.0, TransactionType::Expense),
        ];

        let balances = yearly_balances(&records, CanonicalZone::Utc).unwrap();

        let years: Vec<String> = balances.iter().map(|b| b.bucket.period.to_string()).collect();
        assert_eq!(years, vec!["2022", "2023", "2024"]);
        assert_eq!(balances[2].opening_balance, 100.0);
        assert_eq!(balances[2].closing_balance, 70.0);
    }

    #[test]
    fn current_period_carries_balance_forward() {
        let records = vec![transaction(
            datetime!(2024-01-10 00:00 UTC),
            100.0,
            TransactionType::Income,
        )];

        let current =
            current_period_balances(&records, datetime!(2024-04-01 00:00 UTC), CanonicalZone::Utc)
                .unwrap();

        assert_eq!(current.month.bucket.period.to_string(), "2024-04");
        assert_eq!(current.month.opening_balance, 100.0);
        assert_eq!(current.month.closing_balance, 100.0);
        assert_eq!(current.year.bucket.income, 100.0);
    }

    #[test]
    fn current_period_without_history_is_zeroed() {
        let current =
            current_period_balances(&[], datetime!(2024-04-01 00:00 UTC), CanonicalZone::Utc)
                .unwrap();

        assert_eq!(current.month.bucket.period.to_string(), "2024-04");
        assert_eq!(current.month.closing_balance, 0.0);
        assert_eq!(current.year.bucket.period.to_string(), "2024");
    }
}
