use std::{
    error::Error,
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use time::{Date, OffsetDateTime, macros::format_description};

use ledger_lens::{
    CanonicalZone, FilterField, Ledger, LedgerConfig, TransactionId,
    analytics::{BalancedBucket, Bucket, ChartWindow, Granularity, recent_activity},
    export::{write_csv, write_grouped_csv, write_json},
    format::currency,
    logging::setup_logging,
    purpose::{PurposeName, PurposeQuery},
    stores::sqlite::{SQLiteLedgerStore, create_ledger_store},
    transaction::{Transaction, TransactionDraft},
};

/// Summaries, charts and exports over a ledger of income and expenses.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File path to the ledger SQLite database.
    #[arg(long, env = "LEDGER_DB", default_value = "ledger.db")]
    db_path: PathBuf,

    /// The canonical timezone periods are computed in, e.g. "Pacific/Auckland".
    #[arg(long, env = "LEDGER_TIMEZONE", default_value = "UTC")]
    timezone: String,

    /// Also write debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show totals, this month's and this year's balance and spending by purpose.
    Summary,
    /// Compare this month with last month.
    Stats,
    /// Show income and expenses per calendar unit between two dates.
    Buckets {
        #[arg(long, default_value = "month")]
        granularity: Granularity,
        #[arg(long, value_parser = parse_date)]
        from: Date,
        #[arg(long, value_parser = parse_date)]
        to: Date,
    },
    /// Show running balances over the whole history.
    Balances {
        /// Show one row per year instead of per month.
        #[arg(long)]
        yearly: bool,
    },
    /// Show spending by purpose.
    Categories,
    /// Show the most recent transactions.
    Recent {
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// List transactions a page at a time.
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        per_page: Option<u64>,
    },
    /// Show a day, week, month or year as a chart series.
    Chart {
        #[arg(long, default_value = "month")]
        window: ChartWindow,
        /// Any date inside the window, today if not given.
        #[arg(long, value_parser = parse_date)]
        anchor: Option<Date>,
    },
    /// Export the filtered transactions.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Interleave month headers with the transactions of each month.
        ///
        /// Grouped exports cover every transaction and ignore filters.
        #[arg(long)]
        grouped: bool,
        /// Export only this page of the filtered transactions.
        #[arg(long, conflicts_with = "grouped")]
        page: Option<u64>,
        #[arg(long, requires = "page")]
        per_page: Option<u64>,
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Record a transaction.
    Add {
        /// A date such as 2024-03-01 or an RFC 3339 timestamp.
        #[arg(long)]
        date: String,
        #[arg(long)]
        amount: String,
        /// "income" or "expense".
        #[arg(long = "type")]
        kind: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        purpose_id: Option<i64>,
    },
    /// Delete one or more transactions.
    Delete {
        #[arg(required = true)]
        ids: Vec<TransactionId>,
    },
    /// Manage purposes.
    Purposes {
        #[command(subcommand)]
        command: PurposeCommand,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Only transactions with this purpose, "Other" for none.
    #[arg(long)]
    purpose: Option<String>,
    /// Only "income" or "expense" transactions.
    #[arg(long = "type")]
    kind: Option<String>,
    /// Only transactions whose description contains this text.
    #[arg(long)]
    search: Option<String>,
}

#[derive(Subcommand, Debug)]
enum PurposeCommand {
    /// List purposes, newest first.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,
        #[arg(long)]
        page: Option<u64>,
    },
    /// Create a purpose.
    Add { name: String },
    /// Rename a purpose.
    Rename { id: i64, name: String },
    /// Delete a purpose, its transactions are kept without one.
    Delete { id: i64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Csv,
    Json,
}

fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected a date like 2024-03-01: {error}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    setup_logging(cli.log_file.as_deref())?;

    let zone = CanonicalZone::from_name(&cli.timezone)?;
    let store = create_ledger_store(Connection::open(&cli.db_path)?)?;
    let mut ledger = Ledger::new(store, LedgerConfig::with_zone(zone));

    let report = ledger.refresh()?;
    if !report.rejected.is_empty() {
        eprintln!(
            "Skipped {} invalid transactions, run with RUST_LOG=warn for details.",
            report.rejected.len()
        );
    }

    let now = OffsetDateTime::now_utc();

    match cli.command {
        Command::Summary => print_summary(&ledger, now)?,
        Command::Stats => {
            let statistics = ledger.monthly_statistics(now)?;
            println!("{:<10} {:>14} {:>14} {:>10}", "", "This month", "Last month", "Growth");
            for (label, current, previous, growth) in [
                (
                    "Income",
                    statistics.current.income,
                    statistics.previous.income,
                    statistics.growth.income,
                ),
                (
                    "Expenses",
                    statistics.current.expenses,
                    statistics.previous.expenses,
                    statistics.growth.expenses,
                ),
                (
                    "Net",
                    statistics.current.net,
                    statistics.previous.net,
                    statistics.growth.net,
                ),
            ] {
                println!(
                    "{label:<10} {:>14} {:>14} {growth:>9.1}%",
                    currency(current),
                    currency(previous)
                );
            }
        }
        Command::Buckets {
            granularity,
            from,
            to,
        } => print_buckets(&ledger.buckets(granularity, from, to)),
        Command::Balances { yearly } => {
            let balances = if yearly {
                ledger.yearly_balances()?
            } else {
                ledger.monthly_balances()?
            };
            print_balances(balances);
        }
        Command::Categories => {
            for category in ledger.category_totals() {
                println!("{:<24} {:>14}", category.name, currency(category.value));
            }
        }
        Command::Recent { limit } => {
            let recent = match limit {
                Some(limit) => recent_activity(ledger.records(), limit),
                None => ledger.recent_activity(),
            };
            print_transactions(&recent, zone);
        }
        Command::List {
            filters,
            page,
            per_page,
        } => {
            apply_filter_args(&mut ledger, filters);
            if let Some(per_page) = per_page {
                ledger.set_per_page(per_page);
            }
            if let Some(page) = page {
                ledger.set_page(page);
            }

            let page = ledger.page();
            print_transactions(&page.items, zone);
            println!(
                "Page {} of {} ({} transactions)",
                page.page, page.last_page, page.total
            );
        }
        Command::Chart { window, anchor } => {
            let anchor = anchor.unwrap_or_else(|| zone.date_of(now));
            print_buckets(&ledger.chart(window, anchor));
        }
        Command::Export {
            filters,
            format,
            grouped,
            page,
            per_page,
            out,
        } => {
            apply_filter_args(&mut ledger, filters);
            if let Some(per_page) = per_page {
                ledger.set_per_page(per_page);
            }
            if let Some(page) = page {
                ledger.set_page(page);
            }

            let writer: Box<dyn Write> = match &out {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(io::stdout().lock()),
            };

            let exported = if grouped {
                let rows = ledger.export_grouped()?;
                match format {
                    ExportFormat::Csv => write_grouped_csv(&rows, writer)?,
                    ExportFormat::Json => write_json(&rows, writer)?,
                }
                ledger.records().len()
            } else {
                let rows = match page {
                    Some(_) => ledger.export_page_rows()?,
                    None => ledger.export_rows()?,
                };
                match format {
                    ExportFormat::Csv => write_csv(&rows, writer)?,
                    ExportFormat::Json => write_json(&rows, writer)?,
                }
                rows.len()
            };

            if let Some(path) = out {
                eprintln!("Exported {exported} transactions to {path:#?}");
            }
        }
        Command::Add {
            date,
            amount,
            kind,
            description,
            purpose_id,
        } => {
            let draft = TransactionDraft {
                date,
                amount,
                kind,
                description,
                purpose_id,
            };
            let transaction = ledger.create(draft.validate(zone)?)?;
            println!("Created transaction {}", transaction.id);
        }
        Command::Delete { ids } => {
            let deleted = match ids.as_slice() {
                [id] => ledger.delete(*id).map(|_| 1)?,
                ids => ledger.delete_many(ids)?,
            };
            println!("Deleted {deleted} transactions");
        }
        Command::Purposes { command } => run_purpose_command(&mut ledger, command)?,
    }

    Ok(())
}

fn apply_filter_args(ledger: &mut Ledger<SQLiteLedgerStore>, filters: FilterArgs) {
    for (field, value) in [
        (FilterField::Purpose, filters.purpose),
        (FilterField::Type, filters.kind),
        (FilterField::SearchQuery, filters.search),
    ] {
        if let Some(value) = value {
            ledger.set_filter(field, &value);
        }
    }
}

fn run_purpose_command(
    ledger: &mut Ledger<SQLiteLedgerStore>,
    command: PurposeCommand,
) -> Result<(), Box<dyn Error>> {
    match command {
        PurposeCommand::List {
            search,
            from,
            to,
            page,
        } => {
            let query = PurposeQuery {
                search,
                created_from: from,
                created_to: to,
            };
            let pagination = &ledger.config().pagination;
            let page = ledger.purpose_page(
                &query,
                page.unwrap_or(pagination.default_page),
                pagination.default_page_size,
            );

            for purpose in &page.items {
                println!(
                    "{:>5}  {:<24} {}",
                    purpose.id,
                    purpose.name,
                    purpose.created_at.date()
                );
            }
            println!(
                "Page {} of {} ({} purposes)",
                page.page, page.last_page, page.total
            );
        }
        PurposeCommand::Add { name } => {
            let purpose = ledger.create_purpose(PurposeName::new(&name)?)?;
            println!("Created purpose {} \"{}\"", purpose.id, purpose.name);
        }
        PurposeCommand::Rename { id, name } => {
            let purpose = ledger.rename_purpose(id, PurposeName::new(&name)?)?;
            println!("Renamed purpose {} to \"{}\"", purpose.id, purpose.name);
        }
        PurposeCommand::Delete { id } => {
            ledger.delete_purpose(id)?;
            println!("Deleted purpose {id}");
        }
    }

    Ok(())
}

fn print_summary(
    ledger: &Ledger<SQLiteLedgerStore>,
    now: OffsetDateTime,
) -> Result<(), Box<dyn Error>> {
    let totals = ledger.totals();
    println!("Transactions: {}", totals.transaction_count);
    println!("Income:       {:>14}", currency(totals.income));
    println!("Expenses:     {:>14}", currency(totals.expenses));
    println!("Net:          {:>14}", currency(totals.net));

    let current = ledger.current_period_balances(now)?;
    println!();
    println!(
        "Balance at the end of {}: {}",
        current.month.bucket.period,
        currency(current.month.closing_balance)
    );
    println!(
        "Balance at the end of {}: {}",
        current.year.bucket.period,
        currency(current.year.closing_balance)
    );

    let categories = ledger.category_totals();
    if !categories.is_empty() {
        println!();
        println!("Spending by purpose:");
        for category in categories {
            println!("  {:<22} {:>14}", category.name, currency(category.value));
        }
    }

    Ok(())
}

fn print_transactions(transactions: &[Transaction], zone: CanonicalZone) {
    for transaction in transactions {
        println!(
            "{:>5}  {}  {:<30} {:<16} {:>14}",
            transaction.id,
            zone.date_of(transaction.date),
            transaction.description,
            transaction.purpose_label(),
            currency(transaction.signed_amount())
        );
    }
}

fn print_buckets(buckets: &[Bucket]) {
    println!(
        "{:<20} {:>14} {:>14} {:>14} {:>6}",
        "Period", "Income", "Expenses", "Net", "Count"
    );
    for bucket in buckets {
        println!(
            "{:<20} {:>14} {:>14} {:>14} {:>6}",
            bucket.period.to_string(),
            currency(bucket.income),
            currency(bucket.expense),
            currency(bucket.net()),
            bucket.transaction_count
        );
    }
}

fn print_balances(balances: &[BalancedBucket]) {
    println!(
        "{:<10} {:>14} {:>14} {:>14}",
        "Period", "Opening", "Net", "Closing"
    );
    for balance in balances {
        println!(
            "{:<10} {:>14} {:>14} {:>14}",
            balance.bucket.period.to_string(),
            currency(balance.opening_balance),
            currency(balance.net),
            currency(balance.closing_balance)
        );
    }
}
