//! Flat and month-grouped export of transactions as CSV or JSON.

use std::{collections::BTreeMap, io::Write};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::{
    Error,
    analytics::{PeriodKey, grouped_by_period},
    timezone::CanonicalZone,
    transaction::Transaction,
};

const HEADER: [&str; 5] = ["date", "description", "purpose", "amount", "type"];

/// A transaction as it appears in an export file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    /// RFC 3339 timestamp in the canonical timezone.
    pub date: String,
    pub description: String,
    /// The resolved purpose name or "Other".
    pub purpose: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ExportRow {
    fn from_transaction(transaction: &Transaction, zone: CanonicalZone) -> Result<Self, Error> {
        let date = transaction
            .date
            .to_offset(zone.offset_at(transaction.date))
            .format(&Rfc3339)
            .map_err(|error| Error::Export(error.to_string()))?;

        Ok(Self {
            date,
            description: transaction.description.clone(),
            purpose: transaction.purpose_label().to_owned(),
            amount: transaction.amount.value(),
            kind: transaction.kind.as_str().to_owned(),
        })
    }

    fn to_record(&self) -> [String; 5] {
        [
            self.date.clone(),
            self.description.clone(),
            self.purpose.clone(),
            self.amount.to_string(),
            self.kind.clone(),
        ]
    }
}

/// An item of the grouped export: a month header or one of its transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupedExportRow {
    /// Marks the start of a month, e.g. "2024-03".
    Month { month: String },
    Transaction(ExportRow),
}

/// Export rows in the order the transactions are given.
pub fn export_rows(records: &[Transaction], zone: CanonicalZone) -> Result<Vec<ExportRow>, Error> {
    records
        .iter()
        .map(|record| ExportRow::from_transaction(record, zone))
        .collect()
}

/// Export rows grouped by month.
///
/// Months are in ascending order and each month marker is followed by that
/// month's transactions in ascending date order.
pub fn export_grouped(
    records: &[Transaction],
    zone: CanonicalZone,
) -> Result<Vec<GroupedExportRow>, Error> {
    export_groups(&grouped_by_period(records, zone), zone)
}

/// Export transactions that are already grouped by month.
///
/// Same layout as [export_grouped].
pub fn export_groups(
    groups: &BTreeMap<PeriodKey, Vec<Transaction>>,
    zone: CanonicalZone,
) -> Result<Vec<GroupedExportRow>, Error> {
    let mut rows = Vec::new();
    let mut transaction_count = 0;

    for (month, transactions) in groups {
        let mut transactions: Vec<&Transaction> = transactions.iter().collect();
        transactions.sort_by_key(|transaction| transaction.date);
        transaction_count += transactions.len();

        rows.push(GroupedExportRow::Month {
            month: month.to_string(),
        });

        for transaction in transactions {
            rows.push(GroupedExportRow::Transaction(ExportRow::from_transaction(
                transaction,
                zone,
            )?));
        }
    }

    tracing::debug!("exported {transaction_count} transactions grouped by month");

    Ok(rows)
}

/// Write `rows` as CSV with a header row.
pub fn write_csv<W: Write>(rows: &[ExportRow], writer: W) -> Result<(), Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for row in rows {
        csv_writer.write_record(row.to_record())?;
    }

    csv_writer.flush().map_err(|error| Error::Export(error.to_string()))
}

/// Write grouped `rows` as CSV.
///
/// Month markers are written as single-field records between the
/// transactions.
pub fn write_grouped_csv<W: Write>(rows: &[GroupedExportRow], writer: W) -> Result<(), Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for row in rows {
        match row {
            GroupedExportRow::Month { month } => csv_writer.write_record([month])?,
            GroupedExportRow::Transaction(row) => csv_writer.write_record(row.to_record())?,
        }
    }

    csv_writer.flush().map_err(|error| Error::Export(error.to_string()))
}

/// Write any export as pretty-printed JSON.
pub fn write_json<W: Write, T: Serialize>(rows: &[T], writer: W) -> Result<(), Error> {
    serde_json::to_writer_pretty(writer, rows)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        test_utils::{described, tagged},
        timezone::CanonicalZone,
        transaction::TransactionType,
    };

    use super::{
        GroupedExportRow, export_grouped, export_rows, write_csv, write_grouped_csv, write_json,
    };

    #[test]
    fn flat_export_keeps_order_and_resolves_purpose() {
        let records = vec![
            tagged(datetime!(2024-04-02 00:00 UTC), 20.0, TransactionType::Expense, "Food"),
            described(2, datetime!(2024-03-01 00:00 UTC), 100.0, TransactionType::Income, "Pay"),
        ];

        let rows = export_rows(&records, CanonicalZone::Utc).unwrap();

        assert_eq!(rows[0].date, "2024-04-02T00:00:00Z");
        assert_eq!(rows[0].purpose, "Food");
        assert_eq!(rows[0].kind, "expense");
        assert_eq!(rows[1].description, "Pay");
        assert_eq!(rows[1].purpose, "Other");
    }

    #[test]
    fn dates_use_the_canonical_zone() {
        let zone = CanonicalZone::from_name("Africa/Lagos").unwrap();
        let records = vec![described(
            1,
            datetime!(2024-03-31 23:30 UTC),
            5.0,
            TransactionType::Expense,
            "Late snack",
        )];

        let rows = export_rows(&records, zone).unwrap();
        let grouped = export_grouped(&records, zone).unwrap();

        assert_eq!(rows[0].date, "2024-04-01T00:30:00+01:00");
        assert_eq!(
            grouped[0],
            GroupedExportRow::Month {
                month: "2024-04".to_owned()
            }
        );
    }

    #[test]
    fn grouped_export_interleaves_month_markers() {
        let records = vec![
            described(3, datetime!(2024-04-02 00:00 UTC), 20.0, TransactionType::Expense, "c"),
            described(2, datetime!(2024-03-15 00:00 UTC), 40.0, TransactionType::Expense, "b"),
            described(1, datetime!(2024-03-01 00:00 UTC), 100.0, TransactionType::Income, "a"),
        ];

        let rows = export_grouped(&records, CanonicalZone::Utc).unwrap();

        let labels: Vec<String> = rows
            .iter()
            .map(|row| match row {
                GroupedExportRow::Month { month } => month.clone(),
                GroupedExportRow::Transaction(row) => row.description.clone(),
            })
            .collect();
        assert_eq!(labels, vec!["2024-03", "a", "b", "2024-04", "c"]);
    }

    #[test]
    fn writes_csv_with_header() {
        let records = vec![described(
            1,
            datetime!(2024-03-01 00:00 UTC),
            12.5,
            TransactionType::Expense,
            "Lunch, with friends",
        )];
        let rows = export_rows(&records, CanonicalZone::Utc).unwrap();
        let mut buffer = Vec::new();

        write_csv(&rows, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "date,description,purpose,amount,type\n\
             2024-03-01T00:00:00Z,\"Lunch, with friends\",Other,12.5,expense\n"
        );
    }

    #[test]
    fn writes_grouped_csv_with_month_markers() {
        let records = vec![described(
            1,
            datetime!(2024-03-01 00:00 UTC),
            7.0,
            TransactionType::Income,
            "Refund",
        )];
        let rows = export_grouped(&records, CanonicalZone::Utc).unwrap();
        let mut buffer = Vec::new();

        write_grouped_csv(&rows, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "date,description,purpose,amount,type\n\
             2024-03\n\
             2024-03-01T00:00:00Z,Refund,Other,7,income\n"
        );
    }

    #[test]
    fn writes_grouped_json() {
        let records = vec![described(
            1,
            datetime!(2024-03-01 00:00 UTC),
            7.0,
            TransactionType::Income,
            "Refund",
        )];
        let rows = export_grouped(&records, CanonicalZone::Utc).unwrap();
        let mut buffer = Vec::new();

        write_json(&rows, &mut buffer).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json[0]["month"], "2024-03");
        assert_eq!(json[1]["type"], "income");
        assert_eq!(json[1]["amount"], 7.0);
    }
}
