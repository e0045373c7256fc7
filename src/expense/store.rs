//! Defines the expense store trait and an implementation for the SQLite backend.
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    db::lock,
    expense::core::{Expense, ExpenseDraft, create_expense},
    user::is_valid_identity,
};

/// Somewhere expenses can be saved.
///
/// Implementations are cloned into the blocking tasks that save a batch of
/// scanned expenses, so cloning should be cheap.
pub trait ExpenseStore {
    /// Check that `id` is formatted as an owner ID the store can save expenses for.
    fn is_valid_identity(&self, id: &str) -> bool;

    /// Save an expense and return it with its assigned ID.
    fn insert(&self, draft: ExpenseDraft) -> Result<Expense, Error>;
}

/// Stores expenses in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ExpenseStore for SQLiteExpenseStore {
    fn is_valid_identity(&self, id: &str) -> bool {
        is_valid_identity(id)
    }

    /// Create a new expense in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - [Error::InvalidOwnerIdentity] if the owner is not a registered user,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn insert(&self, draft: ExpenseDraft) -> Result<Expense, Error> {
        create_expense(draft, &*lock(&self.connection)?)
    }
}
