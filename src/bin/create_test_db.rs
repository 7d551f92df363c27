use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime, macros::datetime};

use ledger_lens::{
    db::initialize,
    purpose::{PurposeName, create_purpose},
    transaction::{Amount, NewTransaction, TransactionType, insert_transaction},
};

/// A utility for creating a test database for the ledger command line tool.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many months of transactions to generate.
    #[arg(long, short, default_value_t = 18)]
    months: u32,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_ledger.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize(&conn)?;

    println!("Creating purposes...");
    let now = OffsetDateTime::now_utc();
    let salary = create_purpose(PurposeName::new("Salary")?, now, &conn)?;
    let rent = create_purpose(PurposeName::new("Rent")?, now, &conn)?;
    let food = create_purpose(PurposeName::new("Food")?, now, &conn)?;

    println!("Creating transactions for {} months...", args.months);
    let start = datetime!(2024-01-01 09:00 UTC);
    let mut count = 0;

    for month in 0..args.months {
        let month_start = start + Duration::days(i64::from(month) * 30);
        let samples = [
            (0, 4200.0, TransactionType::Income, "Monthly pay", Some(salary.id)),
            (1, 1650.0, TransactionType::Expense, "Rent", Some(rent.id)),
            (6, 142.35, TransactionType::Expense, "Supermarket", Some(food.id)),
            (13, 38.9, TransactionType::Expense, "Takeaways", Some(food.id)),
            (20, 119.99, TransactionType::Expense, "Power bill", None),
            (27, 25.0 + f64::from(month), TransactionType::Income, "Interest", None),
        ];

        for (day, amount, kind, description, purpose_id) in samples {
            let transaction = NewTransaction::build(
                month_start + Duration::days(day),
                Amount::new(amount)?,
                kind,
                description,
            )
            .purpose_id(purpose_id);

            insert_transaction(&transaction, now, &conn)?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
