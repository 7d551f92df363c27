//! The caller-owned ledger: a store, the last-known-good snapshot of its
//! records and the filter and page state of the transaction list.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    analytics::{
        BalancedBucket, Bucket, CategoryTotal, ChartWindow, CurrentPeriodBalances, Granularity,
        LedgerTotals, PeriodComparison, PeriodRange, bucket, chart_series,
        current_period_balances, monthly_statistics, recent_activity,
    },
    config::LedgerConfig,
    database_id::{PurposeId, TransactionId},
    export::{ExportRow, GroupedExportRow, export_groups, export_rows},
    filters::{FilterField, TransactionFilters, apply_filters},
    pagination::{Page, paginate},
    purpose::{Purpose, PurposeName, PurposeQuery, query_purposes},
    snapshot::Snapshot,
    stores::LedgerStore,
    transaction::{NewTransaction, Transaction, TransactionChanges},
};

/// Set while a store call is in flight.
///
/// Clones share the same flag, so a caller can watch it from elsewhere and
/// avoid issuing overlapping writes.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn begin(&self) -> LoadingGuard {
        self.0.store(true, Ordering::SeqCst);
        LoadingGuard(self.0.clone())
    }
}

/// Clears the loading flag when dropped, also on early returns.
struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A store record that failed validation and was left out of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub id: TransactionId,
    pub reason: String,
}

/// The outcome of a successful refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    /// How many records made it into the snapshot.
    pub accepted: usize,
    pub rejected: Vec<RejectedRecord>,
}

/// Holds the state derived from a [LedgerStore].
///
/// Every derived view is recomputed from the full record set after each
/// successful refresh. A failed store call leaves the previous snapshot in
/// place and is recorded in [Ledger::last_error].
#[derive(Debug)]
pub struct Ledger<S: LedgerStore> {
    store: S,
    config: LedgerConfig,
    snapshot: Snapshot,
    purposes: Vec<Purpose>,
    filters: TransactionFilters,
    filtered: Vec<Transaction>,
    page: u64,
    per_page: u64,
    last_error: Option<Error>,
    loading: LoadingFlag,
}

impl<S: LedgerStore> Ledger<S> {
    /// Create a ledger with an empty snapshot. Call [Ledger::refresh] to load
    /// the store's records.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            snapshot: Snapshot::empty(config.zone),
            purposes: Vec::new(),
            filters: TransactionFilters::default(),
            filtered: Vec::new(),
            page: config.pagination.default_page,
            per_page: config.pagination.default_page_size,
            last_error: None,
            loading: LoadingFlag::default(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// A handle to the loading flag that can be kept by the caller.
    pub fn loading(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// The error of the most recent failed store call, cleared by the next
    /// successful one.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Every validated record, newest first.
    pub fn records(&self) -> &[Transaction] {
        self.snapshot.records()
    }

    pub fn purposes(&self) -> &[Purpose] {
        &self.purposes
    }

    /// Run `call` against the store with the loading flag set.
    fn call_store<T>(
        &mut self,
        operation: &str,
        call: impl FnOnce(&mut S) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let _guard = self.loading.begin();

        match call(&mut self.store) {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(error) => {
                tracing::error!("{operation} failed: {error}");
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    // ========================================================================
    // REFRESH
    // ========================================================================

    /// Fetch every record and purpose and rebuild all derived state.
    ///
    /// Records that fail validation are left out of the snapshot and listed
    /// in the report.
    ///
    /// # Errors
    ///
    /// Returns the store's error. The previous snapshot is kept.
    pub fn refresh(&mut self) -> Result<RefreshReport, Error> {
        let (raw_records, purposes) = self.call_store("refresh", |store| {
            Ok((store.fetch_all()?, store.fetch_purposes()?))
        })?;

        let mut records = Vec::with_capacity(raw_records.len());
        let mut rejected = Vec::new();

        for raw_record in raw_records {
            let id = raw_record.id;

            match Transaction::from_record(raw_record, self.config.zone) {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::warn!("excluding transaction {id} from the ledger: {error}");
                    rejected.push(RejectedRecord {
                        id,
                        reason: error.to_string(),
                    });
                }
            }
        }

        let report = RefreshReport {
            accepted: records.len(),
            rejected,
        };

        self.snapshot.replace(records);
        self.purposes = purposes;
        self.reapply_filters();

        tracing::info!(
            "refreshed ledger: {} records accepted, {} rejected",
            report.accepted,
            report.rejected.len()
        );

        Ok(report)
    }

    /// Refresh after a mutation the store accepted.
    ///
    /// A failed refresh does not undo the mutation, it is only recorded in
    /// [Ledger::last_error].
    fn refresh_after(&mut self, operation: &str) {
        if let Err(error) = self.refresh() {
            tracing::warn!("{operation} succeeded but the refresh after it failed: {error}");
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Create a transaction and refresh.
    ///
    /// # Errors
    ///
    /// Returns the store's error, local state is left untouched.
    pub fn create(&mut self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let record = self.call_store("create", |store| store.create(&transaction))?;
        let zone = self.config.zone;
        self.refresh_after("create");

        Transaction::from_record(record, zone)
    }

    /// Update a transaction and refresh.
    ///
    /// # Errors
    ///
    /// Returns the store's error, e.g. [Error::NotFound], local state is left
    /// untouched.
    pub fn update(
        &mut self,
        id: TransactionId,
        changes: TransactionChanges,
    ) -> Result<Transaction, Error> {
        let record = self.call_store("update", |store| store.update(id, &changes))?;
        let zone = self.config.zone;
        self.refresh_after("update");

        Transaction::from_record(record, zone)
    }

    /// Delete a transaction and refresh.
    pub fn delete(&mut self, id: TransactionId) -> Result<(), Error> {
        self.call_store("delete", |store| store.delete(id))?;
        self.refresh_after("delete");

        Ok(())
    }

    /// Delete many transactions and refresh. Returns how many were deleted.
    pub fn delete_many(&mut self, ids: &[TransactionId]) -> Result<usize, Error> {
        let deleted = self.call_store("delete many", |store| store.delete_many(ids))?;
        self.refresh_after("delete many");

        Ok(deleted)
    }

    pub fn create_purpose(&mut self, name: PurposeName) -> Result<Purpose, Error> {
        let purpose = self.call_store("create purpose", |store| store.create_purpose(name))?;
        self.refresh_after("create purpose");

        Ok(purpose)
    }

    /// Rename a purpose and refresh, the new name shows on its transactions.
    pub fn rename_purpose(&mut self, id: PurposeId, name: PurposeName) -> Result<Purpose, Error> {
        let purpose = self.call_store("rename purpose", |store| store.rename_purpose(id, name))?;
        self.refresh_after("rename purpose");

        Ok(purpose)
    }

    /// Delete a purpose and refresh, its transactions become "Other".
    pub fn delete_purpose(&mut self, id: PurposeId) -> Result<(), Error> {
        self.call_store("delete purpose", |store| store.delete_purpose(id))?;
        self.refresh_after("delete purpose");

        Ok(())
    }

    // ========================================================================
    // FILTERS AND PAGING
    // ========================================================================

    pub fn filters(&self) -> &TransactionFilters {
        &self.filters
    }

    /// Set one filter, reapply all filters and go back to the first page.
    pub fn set_filter(&mut self, field: FilterField, value: &str) {
        self.filters.set(field, value);
        self.page = 1;
        self.reapply_filters();
    }

    /// Clear every filter and go back to the first page.
    pub fn clear_filters(&mut self) {
        self.filters = TransactionFilters::default();
        self.page = 1;
        self.reapply_filters();
    }

    /// Select the page to show. Filters are not reapplied.
    pub fn set_page(&mut self, page: u64) {
        self.page = page.max(1);
    }

    /// Change the page size and go back to the first page.
    pub fn set_per_page(&mut self, per_page: u64) {
        self.per_page = per_page.max(1);
        self.page = 1;
    }

    /// The records that pass the current filters, newest first.
    pub fn filtered(&self) -> &[Transaction] {
        &self.filtered
    }

    /// The current page of the filtered records.
    pub fn page(&self) -> Page<Transaction> {
        paginate(&self.filtered, self.page, self.per_page)
    }

    /// Search and page the purpose list.
    pub fn purpose_page(&self, query: &PurposeQuery, page: u64, per_page: u64) -> Page<Purpose> {
        query_purposes(&self.purposes, query, page, per_page)
    }

    fn reapply_filters(&mut self) {
        self.filtered = apply_filters(self.snapshot.records(), &self.filters);
        tracing::debug!(
            "{} of {} records pass the filters",
            self.filtered.len(),
            self.snapshot.records().len()
        );
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    pub fn totals(&self) -> &LedgerTotals {
        self.snapshot.totals()
    }

    pub fn category_totals(&self) -> &[CategoryTotal] {
        self.snapshot.category_totals()
    }

    /// The most recent transactions, as many as the configured limit.
    pub fn recent_activity(&self) -> Vec<Transaction> {
        recent_activity(self.records(), self.config.recent_activity_limit)
    }

    pub fn monthly_balances(&self) -> Result<&[BalancedBucket], Error> {
        self.snapshot.monthly_balances()
    }

    pub fn yearly_balances(&self) -> Result<&[BalancedBucket], Error> {
        self.snapshot.yearly_balances()
    }

    pub fn current_period_balances(
        &self,
        now: OffsetDateTime,
    ) -> Result<CurrentPeriodBalances, Error> {
        current_period_balances(self.records(), now, self.config.zone)
    }

    /// This month compared with last month.
    pub fn monthly_statistics(&self, now: OffsetDateTime) -> Result<PeriodComparison, Error> {
        monthly_statistics(self.records(), now, self.config.zone)
    }

    /// Bucket every record between `start` and `end` inclusive.
    pub fn buckets(&self, granularity: Granularity, start: Date, end: Date) -> Vec<Bucket> {
        bucket(
            self.records(),
            granularity,
            PeriodRange::from_dates(start, end),
            self.config.zone,
        )
    }

    pub fn chart(&self, window: ChartWindow, anchor: Date) -> Vec<Bucket> {
        chart_series(self.records(), window, anchor, self.config.zone)
    }

    /// Export every filtered record, not only the current page.
    pub fn export_rows(&self) -> Result<Vec<ExportRow>, Error> {
        export_rows(&self.filtered, self.config.zone)
    }

    /// Export the current page of the filtered records.
    pub fn export_page_rows(&self) -> Result<Vec<ExportRow>, Error> {
        export_rows(&self.page().items, self.config.zone)
    }

    /// Export every record grouped by month.
    ///
    /// Filters do not apply. The month groups come from the snapshot's
    /// memoized projection.
    pub fn export_grouped(&self) -> Result<Vec<GroupedExportRow>, Error> {
        export_groups(self.snapshot.grouped_by_period(), self.config.zone)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::{
        Error,
        config::LedgerConfig,
        export::GroupedExportRow,
        filters::FilterField,
        purpose::PurposeName,
        stores::InMemoryLedgerStore,
        transaction::{
            Amount, NewTransaction, TransactionChanges, TransactionRecord, TransactionType,
        },
    };

    use super::Ledger;

    fn new_transaction(
        date: time::OffsetDateTime,
        amount: f64,
        kind: TransactionType,
        description: &str,
    ) -> NewTransaction {
        NewTransaction::build(date, Amount::new(amount).unwrap(), kind, description)
    }

    fn get_ledger() -> (Ledger<InMemoryLedgerStore>, InMemoryLedgerStore) {
        let store = InMemoryLedgerStore::new();
        let ledger = Ledger::new(store.clone(), LedgerConfig::default());

        (ledger, store)
    }

    fn seeded_ledger() -> (Ledger<InMemoryLedgerStore>, InMemoryLedgerStore) {
        let (mut ledger, store) = get_ledger();
        ledger
            .create(new_transaction(
                datetime!(2024-03-01 00:00 UTC),
                100.0,
                TransactionType::Income,
                "Salary",
            ))
            .unwrap();
        ledger
            .create(new_transaction(
                datetime!(2024-03-15 00:00 UTC),
                40.0,
                TransactionType::Expense,
                "March Rent",
            ))
            .unwrap();
        ledger
            .create(new_transaction(
                datetime!(2024-04-02 00:00 UTC),
                20.0,
                TransactionType::Expense,
                "Groceries",
            ))
            .unwrap();

        (ledger, store)
    }

    #[test]
    fn create_refreshes_every_view() {
        let (ledger, _) = seeded_ledger();

        assert_eq!(ledger.records().len(), 3);
        assert_eq!(ledger.totals().net, 40.0);
        let balances = ledger.monthly_balances().unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].closing_balance, 60.0);
        assert_eq!(balances[1].opening_balance, 60.0);
        assert_eq!(balances[1].closing_balance, 40.0);
        assert!(!ledger.is_loading());
    }

    #[test]
    fn failed_refresh_keeps_last_known_good_snapshot() {
        let (mut ledger, store) = seeded_ledger();
        let fingerprint = ledger.snapshot().fingerprint();
        store.set_failure(Some("network unreachable"));

        let result = ledger.refresh();

        let want = Error::Store("network unreachable".to_owned());
        assert_eq!(result, Err(want.clone()));
        assert_eq!(ledger.last_error(), Some(&want));
        assert_eq!(ledger.records().len(), 3);
        assert_eq!(ledger.snapshot().fingerprint(), fingerprint);
        assert!(!ledger.is_loading());
    }

    #[test]
    fn failed_create_does_not_change_local_state() {
        let (mut ledger, store) = seeded_ledger();
        store.set_failure(Some("permission denied"));

        let result = ledger.create(new_transaction(
            datetime!(2024-04-03 00:00 UTC),
            5.0,
            TransactionType::Expense,
            "Coffee",
        ));

        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(ledger.records().len(), 3);
        assert_eq!(ledger.totals().expenses, 60.0);

        store.set_failure(None);
        ledger.refresh().unwrap();
        assert_eq!(ledger.last_error(), None);
        assert_eq!(ledger.records().len(), 3);
    }

    #[test]
    fn refresh_excludes_and_reports_invalid_records() {
        let (mut ledger, store) = get_ledger();
        store.insert_record(TransactionRecord {
            id: 1,
            date: "2024-03-01".to_owned(),
            amount: "10".to_owned(),
            kind: "income".to_owned(),
            description: "Valid".to_owned(),
            purpose_id: None,
            purpose_name: None,
            created_at: String::new(),
            updated_at: String::new(),
        });
        store.insert_record(TransactionRecord {
            id: 2,
            date: "not a date".to_owned(),
            amount: "10".to_owned(),
            kind: "income".to_owned(),
            description: "Bad date".to_owned(),
            purpose_id: None,
            purpose_name: None,
            created_at: String::new(),
            updated_at: String::new(),
        });
        store.insert_record(TransactionRecord {
            id: 3,
            date: "2024-03-02".to_owned(),
            amount: "-4".to_owned(),
            kind: "expense".to_owned(),
            description: "Negative".to_owned(),
            purpose_id: None,
            purpose_name: None,
            created_at: String::new(),
            updated_at: String::new(),
        });

        let report = ledger.refresh().unwrap();

        assert_eq!(report.accepted, 1);
        let rejected: Vec<i64> = report.rejected.iter().map(|record| record.id).collect();
        assert_eq!(rejected, vec![2, 3]);
        assert_eq!(ledger.records()[0].description, "Valid");
    }

    #[test]
    fn filters_reset_page_and_page_only_reslices() {
        let (mut ledger, _) = seeded_ledger();
        ledger.set_per_page(1);
        ledger.set_page(3);
        assert_eq!(ledger.page().items.len(), 1);

        ledger.set_filter(FilterField::Type, "expense");
        let page = ledger.page();
        assert_eq!(page.page, 1);
        assert_eq!(page.total, 2);
        assert_eq!(page.last_page, 2);

        ledger.set_page(5);
        let page = ledger.page();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
    }

    #[test]
    fn type_and_search_filters_find_rent() {
        let (mut ledger, _) = seeded_ledger();

        ledger.set_filter(FilterField::Type, "expense");
        ledger.set_filter(FilterField::SearchQuery, "rent");

        let page = ledger.page();
        assert_eq!(page.total, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.items[0].description, "March Rent");
    }

    #[test]
    fn export_covers_the_whole_filtered_view() {
        let (mut ledger, _) = seeded_ledger();
        ledger.set_per_page(1);
        ledger.set_filter(FilterField::Type, "expense");

        let rows = ledger.export_rows().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Groceries");
    }

    #[test]
    fn page_export_covers_only_the_current_page() {
        let (mut ledger, _) = seeded_ledger();
        ledger.set_filter(FilterField::Type, "expense");
        ledger.set_per_page(1);
        ledger.set_page(2);

        let rows = ledger.export_page_rows().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "March Rent");
    }

    #[test]
    fn grouped_export_ignores_filters() {
        let (mut ledger, _) = seeded_ledger();
        ledger.set_filter(FilterField::Type, "expense");

        let rows = ledger.export_grouped().unwrap();

        let exported = rows
            .iter()
            .filter(|row| matches!(row, GroupedExportRow::Transaction(_)))
            .count();
        assert!(ledger.filtered().len() < ledger.records().len());
        assert_eq!(exported, ledger.records().len());
    }

    #[test]
    fn grouped_export_reads_the_memoized_groups() {
        let (ledger, _) = seeded_ledger();

        let first = ledger.snapshot().grouped_by_period() as *const _;
        ledger.export_grouped().unwrap();

        assert!(std::ptr::eq(first, ledger.snapshot().grouped_by_period()));
    }

    #[test]
    fn update_and_delete_refresh() {
        let (mut ledger, _) = seeded_ledger();
        let groceries = ledger
            .records()
            .iter()
            .find(|record| record.description == "Groceries")
            .unwrap()
            .id;

        let updated = ledger
            .update(
                groceries,
                TransactionChanges::default().amount(Amount::new(30.0).unwrap()),
            )
            .unwrap();
        assert_eq!(updated.amount.value(), 30.0);
        assert_eq!(ledger.totals().expenses, 70.0);

        ledger.delete(groceries).unwrap();
        assert_eq!(ledger.records().len(), 2);

        assert_eq!(ledger.delete(groceries), Err(Error::NotFound));
        assert_eq!(ledger.last_error(), Some(&Error::NotFound));
    }

    #[test]
    fn delete_many_refreshes() {
        let (mut ledger, _) = seeded_ledger();
        let ids: Vec<i64> = ledger.records().iter().map(|record| record.id).collect();

        let deleted = ledger.delete_many(&ids[..2]).unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(ledger.records().len(), 1);
    }

    #[test]
    fn purpose_changes_flow_into_category_totals() {
        let (mut ledger, _) = get_ledger();
        let food = ledger
            .create_purpose(PurposeName::new_unchecked("Food"))
            .unwrap();
        ledger
            .create(
                new_transaction(
                    datetime!(2024-03-01 00:00 UTC),
                    30.0,
                    TransactionType::Expense,
                    "Lunch",
                )
                .purpose_id(Some(food.id)),
            )
            .unwrap();
        assert_eq!(ledger.category_totals()[0].name, "Food");

        ledger
            .rename_purpose(food.id, PurposeName::new_unchecked("Eating out"))
            .unwrap();
        assert_eq!(ledger.category_totals()[0].name, "Eating out");

        ledger.delete_purpose(food.id).unwrap();
        assert_eq!(ledger.category_totals()[0].name, "Other");
        assert!(ledger.purposes().is_empty());
    }

    #[test]
    fn chart_and_statistics_use_current_records() {
        let (ledger, _) = seeded_ledger();

        let chart = ledger.chart(crate::analytics::ChartWindow::Year, date!(2024 - 01 - 01));
        assert_eq!(chart.len(), 12);
        assert_eq!(chart[2].income, 100.0);

        let statistics = ledger
            .monthly_statistics(datetime!(2024-04-20 00:00 UTC))
            .unwrap();
        assert_eq!(statistics.current.expenses, 20.0);
        assert_eq!(statistics.previous.net, 60.0);
    }

    #[test]
    fn recent_activity_respects_configured_limit() {
        let (mut ledger, _) = seeded_ledger();
        ledger
            .create(new_transaction(
                datetime!(2024-05-01 00:00 UTC),
                1.0,
                TransactionType::Income,
                "Interest",
            ))
            .unwrap();
        ledger
            .create(new_transaction(
                datetime!(2024-05-02 00:00 UTC),
                1.0,
                TransactionType::Income,
                "Interest",
            ))
            .unwrap();
        ledger
            .create(new_transaction(
                datetime!(2024-05-03 00:00 UTC),
                1.0,
                TransactionType::Income,
                "Interest",
            ))
            .unwrap();

        let recent = ledger.recent_activity();

        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].date, datetime!(2024-05-03 00:00 UTC));
    }
}
