//! Defines the core data models and database queries for expenses.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{AllowedCategories, Error, database_id::ExpenseId};

// ============================================================================
// MODELS
// ============================================================================

/// Money that was spent, e.g. on a coffee or the rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub name: String,
    /// How much money was spent. Always greater than zero.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// When the money was spent.
    #[serde(with = "date_format")]
    pub date: Date,
    /// The category the expense belongs to, e.g. "Food" or "Housing".
    pub category: String,
}

/// A positive amount of money.
///
/// The amount is kept exactly as it was given, with no rounding. In the
/// database it is stored as a fixed-width text key (see [amount_sort_key]) so
/// that SQL comparisons and sorting order amounts by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    /// This function will return a [Error::InvalidExpense] if the amount is zero or less.
    pub fn new(amount: Decimal) -> Result<Self, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidExpense);
        }

        Ok(Self(amount))
    }

    /// The amount as a decimal number.
    pub fn to_decimal(&self) -> Decimal {
        self.0
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(amount_sort_key(self.0)))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        parse_amount_sort_key(text)
            .map(Self)
            .ok_or_else(|| FromSqlError::Other(format!("invalid stored amount \"{text}\"").into()))
    }
}

/// A validated expense that is ready to be written to the database.
///
/// To create a `NewExpense`, use [NewExpense::new] or [ExpenseData::validate].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    name: String,
    amount: Amount,
    date: Date,
    category: String,
}

impl NewExpense {
    /// Validate the fields of an expense.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidExpense] if `amount` is not positive or `name` is blank,
    /// - or [Error::InvalidCategory] if `category` is not in `categories`.
    pub fn new(
        name: &str,
        amount: Decimal,
        date: Date,
        category: &str,
        categories: &AllowedCategories,
    ) -> Result<Self, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidExpense);
        }

        let amount = Amount::new(amount)?;
        categories.validate(category)?;

        Ok(Self {
            name: name.to_owned(),
            amount,
            date,
            category: category.to_owned(),
        })
    }
}

/// The request body for creating or replacing an expense.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseData {
    /// The ID of the expense being replaced. Ignored when creating an expense.
    #[serde(default)]
    pub id: Option<ExpenseId>,
    /// What the money was spent on.
    #[serde(default)]
    pub name: Option<String>,
    /// How much money was spent.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// When the money was spent.
    #[serde(deserialize_with = "date_format::deserialize")]
    pub date: Date,
    /// The category the expense belongs to.
    pub category: String,
}

impl ExpenseData {
    /// Check the expense data against the expense invariants.
    ///
    /// # Errors
    /// See [NewExpense::new].
    pub fn validate(self, categories: &AllowedCategories) -> Result<NewExpense, Error> {
        NewExpense::new(
            self.name.as_deref().unwrap_or_default(),
            self.amount,
            self.date,
            &self.category,
            categories,
        )
    }
}

/// The digits kept before the decimal point of an amount sort key.
///
/// This fits the largest [Decimal], which has 29 digits.
const KEY_INTEGER_DIGITS: usize = 29;
/// The digits kept after the decimal point of an amount sort key.
///
/// This fits the largest scale of a [Decimal].
const KEY_FRACTION_DIGITS: usize = 28;

/// Encode a non-negative amount as text that sorts in the same order as the value.
///
/// Both sides of the decimal point are zero padded to a fixed width, so byte
/// order and numeric order agree, e.g. `4.5` becomes
/// `00000000000000000000000000004.5000000000000000000000000000`.
/// Equal values with different scales, such as `4.5` and `4.50`, produce the same key.
///
/// Negative values are clamped to zero.
pub(crate) fn amount_sort_key(amount: Decimal) -> String {
    let amount = amount.max(Decimal::ZERO);
    let scale = amount.scale();
    let mantissa = amount.mantissa().unsigned_abs();
    let divisor = 10u128.pow(scale);
    let integer = mantissa / divisor;

    let fraction = if scale == 0 {
        String::new()
    } else {
        format!("{:0width$}", mantissa % divisor, width = scale as usize)
    };

    format!(
        "{integer:0int_width$}.{fraction:0<frac_width$}",
        int_width = KEY_INTEGER_DIGITS,
        frac_width = KEY_FRACTION_DIGITS
    )
}

/// Decode a key created by [amount_sort_key].
fn parse_amount_sort_key(key: &str) -> Option<Decimal> {
    let (integer, fraction) = key.split_once('.')?;
    let integer = match integer.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        integer.parse().ok()
    } else {
        format!("{integer}.{fraction}").parse().ok()
    }
}

/// Parse a calendar date written as `YYYY-MM-DD`.
///
/// An ISO 8601 date-time such as `2024-01-05T13:45:00Z` is also accepted, but
/// the time of day is discarded.
pub(crate) fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();
    let date_part = text.get(..10)?;
    let rest = &text[10..];

    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return None;
    }

    Date::parse(date_part, date_format::DATE_FORMAT).ok()
}

/// Serde helpers for dates in the `YYYY-MM-DD` format.
pub(crate) mod date_format {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    pub(crate) const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date.format(DATE_FORMAT).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;

        super::parse_date(&text).ok_or_else(|| {
            de::Error::custom(format!("invalid date \"{text}\", expected YYYY-MM-DD"))
        })
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new expense in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_expense(expense: NewExpense, connection: &mut Connection) -> Result<Expense, Error> {
    connection
        .prepare(
            "INSERT INTO expense (name, amount, date, category)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, amount, date, category",
        )?
        .query_row(
            (
                expense.name,
                expense.amount,
                expense.date,
                expense.category,
            ),
            map_expense_row,
        )
        .map_err(Error::from)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare("SELECT id, name, amount, date, category FROM expense WHERE id = :id")?
        .query_row(&[(":id", &id)], map_expense_row)
        .map_err(Error::from)
}

/// Replace every field of the expense `id` with the fields of `expense`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    expense: NewExpense,
    connection: &mut Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense SET name = ?1, amount = ?2, date = ?3, category = ?4 WHERE id = ?5",
        (
            expense.name,
            expense.amount,
            expense.date,
            expense.category,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the expense `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(id: ExpenseId, connection: &mut Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expense WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the total number of expenses in the database.
#[cfg(test)]
pub fn count_expenses(connection: &Connection) -> Result<u64, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM expense", [], |row| row.get(0))?;

    Ok(count.max(0) as u64)
}

/// Create the expense table in the database.
///
/// `AUTOINCREMENT` stops SQLite from reusing the IDs of deleted expenses.
/// Amounts are stored as sort keys from [amount_sort_key]. A zero key has
/// nothing left once its zeros and decimal point are trimmed.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            amount TEXT NOT NULL CHECK (length(amount) = 58 AND ltrim(amount, '0.') != ''),
            date TEXT NOT NULL,
            category TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);
        CREATE INDEX IF NOT EXISTS idx_expense_category ON expense(category);
        CREATE INDEX IF NOT EXISTS idx_expense_amount ON expense(amount);",
    )
}

/// Map a database row to an [Expense].
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let amount: Amount = row.get(2)?;
    let date = row.get(3)?;
    let category = row.get(4)?;

    Ok(Expense {
        id,
        name,
        amount: amount.to_decimal(),
        date,
        category,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        AllowedCategories, Error,
        test_utils::{get_test_connection, insert_expense},
    };

    use super::{
        NewExpense, amount_sort_key, count_expenses, create_expense, delete_expense, get_expense,
        update_expense,
    };

    #[test]
    fn create_succeeds() {
        let mut conn = get_test_connection();
        let categories = AllowedCategories::default();
        let new_expense = NewExpense::new(
            "Coffee",
            dec!(4.50),
            date!(2024 - 01 - 05),
            "Food",
            &categories,
        )
        .unwrap();

        let expense = create_expense(new_expense, &mut conn).expect("Could not create expense");

        assert!(expense.id > 0);
        assert_eq!(expense.name, "Coffee");
        assert_eq!(expense.amount, dec!(4.50));
        assert_eq!(expense.date, date!(2024 - 01 - 05));
        assert_eq!(expense.category, "Food");
    }

    #[test]
    fn get_returns_created_expense() {
        let mut conn = get_test_connection();
        let inserted = insert_expense(&mut conn, "Rent", dec!(1200), date!(2024 - 01 - 01), "Housing");

        let got = get_expense(inserted.id, &conn);

        assert_eq!(got, Ok(inserted));
    }

    #[test]
    fn get_with_invalid_id_returns_not_found() {
        let conn = get_test_connection();

        assert_eq!(get_expense(42, &conn), Err(Error::NotFound));
    }

    #[test]
    fn update_replaces_every_field() {
        let mut conn = get_test_connection();
        let categories = AllowedCategories::default();
        let inserted = insert_expense(&mut conn, "Rent", dec!(1200), date!(2024 - 01 - 01), "Housing");
        let replacement = NewExpense::new(
            "Bus pass",
            dec!(35.25),
            date!(2024 - 02 - 03),
            "Transportation",
            &categories,
        )
        .unwrap();

        update_expense(inserted.id, replacement, &mut conn).expect("Could not update expense");

        let got = get_expense(inserted.id, &conn).unwrap();
        assert_eq!(got.id, inserted.id);
        assert_eq!(got.name, "Bus pass");
        assert_eq!(got.amount, dec!(35.25));
        assert_eq!(got.date, date!(2024 - 02 - 03));
        assert_eq!(got.category, "Transportation");
    }

    #[test]
    fn update_with_invalid_id_returns_not_found() {
        let mut conn = get_test_connection();
        let categories = AllowedCategories::default();
        let replacement =
            NewExpense::new("Tea", dec!(3), date!(2024 - 02 - 03), "Food", &categories).unwrap();

        let result = update_expense(3, replacement, &mut conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_expense() {
        let mut conn = get_test_connection();
        let inserted = insert_expense(&mut conn, "Coffee", dec!(4.5), date!(2024 - 01 - 05), "Food");

        delete_expense(inserted.id, &mut conn).expect("Could not delete expense");

        assert_eq!(get_expense(inserted.id, &conn), Err(Error::NotFound));
        assert_eq!(count_expenses(&conn), Ok(0));
    }

    #[test]
    fn delete_with_invalid_id_returns_not_found() {
        let mut conn = get_test_connection();

        assert_eq!(delete_expense(999, &mut conn), Err(Error::NotFound));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut conn = get_test_connection();
        let first = insert_expense(&mut conn, "Coffee", dec!(4.5), date!(2024 - 01 - 05), "Food");
        delete_expense(first.id, &mut conn).unwrap();

        let second = insert_expense(&mut conn, "Tea", dec!(3.5), date!(2024 - 01 - 06), "Food");

        assert!(second.id > first.id);
    }

    #[test]
    fn amounts_round_trip_through_the_database() {
        let mut conn = get_test_connection();

        for amount in [
            dec!(0.004),
            dec!(4.555),
            dec!(12345678901234567.89),
            Decimal::MAX,
        ] {
            let inserted = insert_expense(&mut conn, "Thing", amount, date!(2024 - 01 - 05), "Other");

            assert_eq!(inserted.amount, amount);
            assert_eq!(get_expense(inserted.id, &conn).unwrap().amount, amount);
        }
    }

    #[test]
    fn database_rejects_non_positive_amounts() {
        let conn = get_test_connection();

        let result = conn.execute(
            "INSERT INTO expense (name, amount, date, category) VALUES ('x', 0, '2024-01-01', 'Food')",
            [],
        );
        let zero_key = conn.execute(
            "INSERT INTO expense (name, amount, date, category) VALUES ('x', ?1, '2024-01-01', 'Food')",
            [amount_sort_key(Decimal::ZERO)],
        );

        assert!(result.is_err());
        assert!(zero_key.is_err());
    }
}
