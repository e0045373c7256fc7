//! Defines the endpoint for listing a user's expenses a page at a time.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::Claims,
    date::DateInput,
    db::lock,
    expense::{Expense, ExpenseQuery, count_expenses, get_expenses},
    pagination::{PaginationConfig, page_count, page_offset, sql_bound},
};

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls the default page and page size.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for listing expenses.
///
/// The date range is only applied when both dates are given.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    /// The earliest date to include, as `YYYY-MM-DD` or an RFC 3339 date-time.
    pub start_date: Option<String>,
    /// The latest date to include. A date without a time includes that whole day.
    pub end_date: Option<String>,
    /// The page to show, counting from one.
    pub page: Option<u64>,
    /// The number of expenses per page.
    pub limit: Option<u64>,
}

/// A page of expenses, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePage {
    /// The expenses on this page.
    pub expenses: Vec<Expense>,
    /// The page number, counting from one.
    pub current_page: u64,
    /// The number of pages for the query.
    pub total_pages: u64,
    /// The number of expenses that match the query across all pages.
    pub total_expenses: u64,
}

/// A route handler for listing the expenses of the logged in user.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidOwnerIdentity] if the user ID in the path is malformed,
/// - [Error::OwnerMismatch] if the user ID is not the logged in user,
/// - [Error::InvalidDateRange] if a date cannot be parsed,
/// - or an internal error if the expenses could not be read.
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesState>,
    claims: Claims,
    Path(user_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<ExpenseListQuery>, Error>,
) -> Result<Json<ExpensePage>, Error> {
    let user_id = claims.authorize(&user_id)?;

    let date_range = match (&query.start_date, &query.end_date) {
        (Some(start_date), Some(end_date)) => {
            Some(parse_date(start_date)?.start()..=parse_date(end_date)?.end())
        }
        _ => None,
    };

    let page = query
        .page
        .unwrap_or(state.pagination_config.default_page)
        .max(1);
    let limit = query
        .limit
        .unwrap_or(state.pagination_config.default_page_size)
        .max(1);

    let expense_query = ExpenseQuery {
        user_id,
        date_range,
        limit: sql_bound(limit),
        offset: sql_bound(page_offset(page, limit)),
    };

    let (expenses, total_expenses) = {
        let connection = lock(&state.db_connection)?;
        (
            get_expenses(&expense_query, &connection)?,
            count_expenses(&expense_query, &connection)?,
        )
    };

    Ok(Json(ExpensePage {
        expenses,
        current_page: page,
        total_pages: page_count(total_expenses, limit),
        total_expenses,
    }))
}

fn parse_date(text: &str) -> Result<DateInput, Error> {
    DateInput::parse(text).ok_or_else(|| Error::InvalidDateRange(text.to_owned()))
}
