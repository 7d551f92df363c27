//! Period-over-period statistics.

use serde::Serialize;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, Time};

use crate::{
    Error,
    analytics::period::{Bucket, Granularity, PeriodRange, bucket, start_of_month},
    timezone::CanonicalZone,
    transaction::Transaction,
};

/// The totals of a single period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub transactions: usize,
}

impl From<&Bucket> for PeriodSummary {
    fn from(bucket: &Bucket) -> Self {
        Self {
            income: bucket.income,
            expenses: bucket.expense,
            net: bucket.net(),
            transactions: bucket.transaction_count,
        }
    }
}

/// Percentage change from the previous period to the current one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Growth {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub current: PeriodSummary,
    pub previous: PeriodSummary,
    pub growth: Growth,
}

/// Compare two periods chosen by the caller.
///
/// Growth is reported as a percentage of the previous period. The net growth
/// uses the previous period's income minus expenses as its baseline. A zero
/// baseline reports zero growth rather than an infinite or undefined value.
pub fn compare_adjacent_periods(current: &Bucket, previous: &Bucket) -> PeriodComparison {
    let current = PeriodSummary::from(current);
    let previous = PeriodSummary::from(previous);

    let growth = Growth {
        income: percentage_change(current.income, previous.income),
        expenses: percentage_change(current.expenses, previous.expenses),
        net: percentage_change(current.net, previous.net),
    };

    PeriodComparison {
        current,
        previous,
        growth,
    }
}

fn percentage_change(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        (current - baseline) / baseline * 100.0
    }
}

/// Compare the calendar month containing `now` with the month before it.
///
/// # Errors
///
/// Returns [Error::Computation] if the two months could not be bucketed,
/// which indicates a bug in the bucketer.
pub fn monthly_statistics(
    records: &[Transaction],
    now: OffsetDateTime,
    zone: CanonicalZone,
) -> Result<PeriodComparison, Error> {
    let today = zone.date_of(now);
    let previous_month = start_of_month(start_of_month(today) - Duration::DAY);
    let range = PeriodRange {
        start: PrimitiveDateTime::new(previous_month, Time::MIDNIGHT),
        end: zone.to_local(now),
    };

    match bucket(records, Granularity::Month, range, zone).as_slice() {
        [previous, current] => Ok(compare_adjacent_periods(current, previous)),
        other => Err(Error::Computation(format!(
            "expected two monthly buckets ending at {today}, got {}",
            other.len()
        ))),
    }
}
