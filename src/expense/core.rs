//! Defines the core data models and database queries for expenses.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::ExpenseId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// Money spent by a user.
///
/// To create a new `Expense`, build an [ExpenseDraft] and insert it with
/// [create_expense] or an [ExpenseStore](crate::expense::ExpenseStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user who spent the money.
    pub user_id: UserID,
    /// What the money was spent on, e.g. "Groceries" or the name of a scanned item.
    pub category: String,
    /// How much was spent. Always greater than zero.
    pub amount: f64,
    /// When the money was spent.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// An expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    /// The user who spent the money.
    pub user_id: UserID,
    /// What the money was spent on.
    pub category: String,
    /// How much was spent.
    pub amount: f64,
    /// When the money was spent.
    pub date: OffsetDateTime,
}

impl ExpenseDraft {
    /// Create a draft for an expense that happened just now.
    pub fn now(user_id: UserID, category: &str, amount: f64) -> Self {
        Self {
            user_id,
            category: category.to_owned(),
            amount,
            date: OffsetDateTime::now_utc(),
        }
    }

    /// Set the date of the expense.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = date;
        self
    }
}

/// Defines which expenses [get_expenses] returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseQuery {
    /// Only include expenses of this user.
    pub user_id: UserID,
    /// Include expenses within `date_range` (inclusive).
    pub date_range: Option<RangeInclusive<OffsetDateTime>>,
    /// Selects up to N expenses.
    pub limit: i64,
    /// The number of expenses to skip.
    pub offset: i64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new expense in the database from a draft.
///
/// The date is stored in UTC so that dates sort chronologically.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidOwnerIdentity] if the user ID does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(draft: ExpenseDraft, connection: &Connection) -> Result<Expense, Error> {
    let user_id = draft.user_id;

    connection
        .prepare(
            "INSERT INTO expense (user_id, category, amount, date)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, category, amount, date",
        )?
        .query_row(
            (
                user_id.as_i64(),
                draft.category,
                draft.amount,
                draft.date.to_offset(UtcOffset::UTC),
            ),
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidOwnerIdentity(user_id.to_string()),
            error => error.into(),
        })
}

/// Get a page of a user's expenses, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_expenses(query: &ExpenseQuery, connection: &Connection) -> Result<Vec<Expense>, Error> {
    let (start, end) = date_bounds(query);

    connection
        .prepare(
            "SELECT id, user_id, category, amount, date FROM expense
             WHERE user_id = ?1
               AND (?2 IS NULL OR date >= ?2)
               AND (?3 IS NULL OR date <= ?3)
             ORDER BY date DESC, id DESC
             LIMIT ?4 OFFSET ?5",
        )?
        .query_map(
            (query.user_id.as_i64(), start, end, query.limit, query.offset),
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Count the expenses that match `query`, ignoring its limit and offset.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn count_expenses(query: &ExpenseQuery, connection: &Connection) -> Result<u64, Error> {
    let (start, end) = date_bounds(query);

    connection
        .query_row(
            "SELECT COUNT(id) FROM expense
             WHERE user_id = ?1
               AND (?2 IS NULL OR date >= ?2)
               AND (?3 IS NULL OR date <= ?3)",
            (query.user_id.as_i64(), start, end),
            |row| row.get::<_, i64>(0),
        )
        .map(|count| u64::try_from(count).unwrap_or_default())
        .map_err(|error| error.into())
}

/// The date range in UTC, matching how dates are stored.
fn date_bounds(query: &ExpenseQuery) -> (Option<OffsetDateTime>, Option<OffsetDateTime>) {
    match &query.date_range {
        Some(range) => (
            Some(range.start().to_offset(UtcOffset::UTC)),
            Some(range.end().to_offset(UtcOffset::UTC)),
        ),
        None => (None, None),
    }
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let category = row.get(2)?;
    let amount = row.get(3)?;
    let date = row.get(4)?;

    Ok(Expense {
        id,
        user_id,
        category,
        amount,
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================
