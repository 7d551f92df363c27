//! Chart windows: fixed calendar spans bucketed for plotting.

use std::{fmt::Display, str::FromStr};

use serde::Serialize;
use time::{
    Date, Duration,
    util::{days_in_month, days_in_year},
};

use crate::{
    Error,
    analytics::period::{Bucket, Granularity, PeriodRange, bucket, start_of_month, start_of_week},
    timezone::CanonicalZone,
    transaction::Transaction,
};

/// The calendar span a chart covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartWindow {
    /// 24 hourly buckets.
    Day,
    /// 7 daily buckets, Sunday through Saturday.
    Week,
    /// One daily bucket per day of the month.
    Month,
    /// 12 monthly buckets.
    Year,
}

impl ChartWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// The granularity of the buckets shown in this window.
    pub fn granularity(self) -> Granularity {
        match self {
            Self::Day => Granularity::Hour,
            Self::Week | Self::Month => Granularity::Day,
            Self::Year => Granularity::Month,
        }
    }

    /// The range of the window containing `anchor`.
    pub fn range(self, anchor: Date) -> PeriodRange {
        match self {
            Self::Day => PeriodRange::from_dates(anchor, anchor),
            Self::Week => {
                let start = start_of_week(anchor);
                PeriodRange::from_dates(start, start + Duration::days(6))
            }
            Self::Month => {
                let start = start_of_month(anchor);
                let length = days_in_month(anchor.month(), anchor.year());
                PeriodRange::from_dates(start, start + Duration::days(i64::from(length) - 1))
            }
            Self::Year => {
                let start = anchor - Duration::days(i64::from(anchor.ordinal()) - 1);
                let length = days_in_year(anchor.year());
                PeriodRange::from_dates(start, start + Duration::days(i64::from(length) - 1))
            }
        }
    }
}

impl FromStr for ChartWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(Error::InvalidRecord(format!(
                "chart window \"{other}\" is not one of day, week, month or year"
            ))),
        }
    }
}

impl Display for ChartWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket `records` over the chart window containing `anchor`.
///
/// The result always has one bucket per unit of the window, empty units
/// included.
pub fn chart_series(
    records: &[Transaction],
    window: ChartWindow,
    anchor: Date,
    zone: CanonicalZone,
) -> Vec<Bucket> {
    bucket(records, window.granularity(), window.range(anchor), zone)
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::{test_utils::transaction, timezone::CanonicalZone, transaction::TransactionType};

    use super::{ChartWindow, chart_series};

    #[test]
    fn day_window_has_24_hours() {
        let records = vec![transaction(
            datetime!(2024-03-06 09:30 UTC),
            12.0,
            TransactionType::Expense,
        )];

        let series = chart_series(
            &records,
            ChartWindow::Day,
            date!(2024 - 03 - 06),
            CanonicalZone::Utc,
        );

        assert_eq!(series.len(), 24);
        assert_eq!(series[0].period.to_string(), "2024-03-06T00:00:00");
        assert_eq!(series[9].expense, 12.0);
        assert_eq!(series[23].period.to_string(), "2024-03-06T23:00:00");
    }

    #[test]
    fn week_window_runs_sunday_to_saturday() {
        // 2024-03-06 is a Wednesday.
        let series = chart_series(
            &[],
            ChartWindow::Week,
            date!(2024 - 03 - 06),
            CanonicalZone::Utc,
        );

        let days: Vec<String> = series.iter().map(|b| b.period.to_string()).collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], "2024-03-03");
        assert_eq!(days[6], "2024-03-09");
    }

    #[test]
    fn month_window_covers_every_day() {
        let cases = [
            (date!(2024 - 02 - 10), 29),
            (date!(2023 - 02 - 10), 28),
            (date!(2024 - 04 - 30), 30),
            (date!(2024 - 12 - 01), 31),
        ];

        for (anchor, want) in cases {
            let series = chart_series(&[], ChartWindow::Month, anchor, CanonicalZone::Utc);

            assert_eq!(series.len(), want, "anchor {anchor}");
        }
    }

    #[test]
    fn year_window_has_12_months() {
        let records = vec![
            transaction(datetime!(2024-01-15 00:00 UTC), 100.0, TransactionType::Income),
            transaction(datetime!(2024-12-31 23:59 UTC), 40.0, TransactionType::Expense),
            transaction(datetime!(2025-01-01 00:00 UTC), 999.0, TransactionType::Expense),
        ];

        let series = chart_series(
            &records,
            ChartWindow::Year,
            date!(2024 - 07 - 04),
            CanonicalZone::Utc,
        );

        assert_eq!(series.len(), 12);
        assert_eq!(series[0].income, 100.0);
        assert_eq!(series[11].expense, 40.0);
    }

    #[test]
    fn year_window_covers_leap_day() {
        let series = chart_series(
            &[transaction(
                datetime!(2024-12-31 12:00 UTC),
                5.0,
                TransactionType::Expense,
            )],
            ChartWindow::Year,
            date!(2024 - 02 - 29),
            CanonicalZone::Utc,
        );

        assert_eq!(series.len(), 12);
        assert_eq!(series[11].expense, 5.0);
        assert_eq!(
            ChartWindow::Year.range(date!(2024 - 02 - 29)).end.date(),
            date!(2024 - 12 - 31)
        );
    }

    #[test]
    fn parses_window_names() {
        assert_eq!("week".parse(), Ok(ChartWindow::Week));
        assert!("fortnight".parse::<ChartWindow>().is_err());
    }
}
