//! The transaction analytics engine.
//!
//! Everything here is a pure function over a validated record set: period
//! bucketing, running balances, period-over-period comparison and the
//! category, chart and history projections built on top of them.

mod balance;
mod chart;
mod comparison;
mod period;
mod projections;

pub use balance::{BalancedBucket, accumulate};
pub use chart::{ChartWindow, chart_series};
pub use comparison::{
    Growth, PeriodComparison, PeriodSummary, compare_adjacent_periods, monthly_statistics,
};
pub use period::{
    Bucket, Granularity, PeriodKey, PeriodRange, bucket, start_of_month, start_of_week,
};
pub use projections::{
    CategoryTotal, CurrentPeriodBalances, LedgerTotals, category_totals, current_period_balances,
    grouped_by_period, ledger_totals, monthly_balances, recent_activity, yearly_balances,
};
