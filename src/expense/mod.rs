//! Expense management for the spending tracker.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and `ExpenseDraft` for creating expenses
//! - Database functions for storing, querying and counting expenses
//! - The `ExpenseStore` seam that scanned expenses are saved through
//! - Route handlers for adding and listing expenses

pub(crate) mod core;
mod create_endpoint;
mod list_endpoint;
mod store;

pub use core::{
    Expense, ExpenseDraft, ExpenseQuery, count_expenses, create_expense_table, get_expenses,
};
pub use create_endpoint::create_expense_endpoint;
pub use list_endpoint::list_expenses_endpoint;
pub use store::{ExpenseStore, SQLiteExpenseStore};
