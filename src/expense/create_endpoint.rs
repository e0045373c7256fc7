//! Defines the endpoint for recording a single expense.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Error,
    auth::Claims,
    expense::{ExpenseDraft, ExpenseStore, SQLiteExpenseStore},
};

/// The body of a request to add an expense.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseForm {
    /// The owner of the expense, must be the logged in user.
    #[serde(default)]
    pub user_id: String,
    /// What the money was spent on.
    pub category: String,
    /// How much was spent.
    #[serde(default)]
    pub amount: Option<f64>,
}

/// A route handler for recording an expense that happened just now.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidAmount] if the amount is missing or not greater than zero,
/// - [Error::InvalidOwnerIdentity] if the user ID is malformed or not registered,
/// - [Error::OwnerMismatch] if the user ID is not the logged in user,
/// - or an internal error if the expense could not be saved.
pub async fn create_expense_endpoint(
    State(store): State<SQLiteExpenseStore>,
    claims: Claims,
    WithRejection(Json(form), _): WithRejection<Json<ExpenseForm>, Error>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let amount = form
        .amount
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or(Error::InvalidAmount)?;

    let user_id = claims.authorize(&form.user_id)?;
    let draft = ExpenseDraft::now(user_id, &form.category, amount);

    let expense = tokio::task::spawn_blocking(move || store.insert(draft))
        .await
        .map_err(|error| {
            tracing::error!("the task saving an expense did not finish: {error}");
            Error::PartialPersistenceFailure {
                failed: 1,
                attempted: 1,
            }
        })??;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expense added successfully",
            "expense": expense,
        })),
    ))
}
