use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use expense_tracker::{AllowedCategories, NewExpense, create_expense, initialize_db};

/// A utility for creating a test database for the expense tracker REST API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many days of sample expenses to create, counting back from today.
    #[arg(long, short, default_value_t = 60)]
    days: u16,
}

const SAMPLE_EXPENSES: [(&str, i64, u32, &str); 8] = [
    ("Coffee", 450, 2, "Food"),
    ("Groceries", 8_735, 7, "Food"),
    ("Bus fare", 320, 3, "Transportation"),
    ("Electricity bill", 12_050, 30, "Bills"),
    ("Cinema tickets", 3_200, 14, "Entertainment"),
    ("Textbook", 6_499, 45, "Education"),
    ("Pharmacy", 1_875, 21, "Health"),
    ("Rent", 120_000, 30, "Housing"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating sample expenses...");

    let categories = AllowedCategories::default();
    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for day in 0..args.days {
        let date = today - Duration::days(i64::from(day));

        for (index, &(name, cents, every_n_days, category)) in SAMPLE_EXPENSES.iter().enumerate() {
            if (u32::from(day) + index as u32) % every_n_days != 0 {
                continue;
            }

            let expense = NewExpense::new(
                name,
                Decimal::new(cents, 2),
                date,
                category,
                &categories,
            )?;
            create_expense(expense, &mut conn)?;
            count += 1;
        }
    }

    println!("Created {count} expenses between {} and {today}.", earliest(today, args.days));
    println!("Success!");

    Ok(())
}

fn earliest(today: Date, days: u16) -> Date {
    today - Duration::days(i64::from(days.saturating_sub(1)))
}
