//! Defines the endpoint for recording the items of a scanned receipt QR code.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Error,
    auth::Claims,
    expense::{ExpenseStore, SQLiteExpenseStore},
    scan::scan_expenses,
};

/// The body of a scan request.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanForm {
    /// The owner of the scanned expenses, must be the logged in user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// The text read from the QR code, which should be a JSON document.
    #[serde(default)]
    pub data: Option<Value>,
}

/// A route handler for saving one expense per item in a scanned QR code.
///
/// # Errors
///
/// Returns a:
/// - [Error::MissingScanFields] if the user ID or the data is missing or empty,
/// - [Error::OwnerMismatch] if the user ID is not the logged in user,
/// - [Error::InvalidPayloadFormat] if the data is not a JSON string,
/// - or any error from [scan_expenses].
pub async fn scan_endpoint(
    State(store): State<SQLiteExpenseStore>,
    claims: Claims,
    WithRejection(Json(form), _): WithRejection<Json<ScanForm>, Error>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let user_id = form
        .user_id
        .filter(|user_id| !user_id.is_empty())
        .ok_or(Error::MissingScanFields)?;

    let data = match form.data {
        None | Some(Value::Null) => return Err(Error::MissingScanFields),
        Some(Value::String(data)) if data.is_empty() => return Err(Error::MissingScanFields),
        Some(Value::String(data)) => data,
        Some(other) => {
            return Err(Error::InvalidPayloadFormat(format!(
                "expected the data to be a string, got {other}"
            )));
        }
    };

    // A malformed ID is reported by the scan, after the items are checked.
    if store.is_valid_identity(&user_id) {
        claims.authorize(&user_id)?;
    }

    let expenses = scan_expenses(&store, &user_id, &data).await?;
    tracing::info!("saved {} expenses from a QR scan", expenses.len());

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expenses added via QR scan successfully",
            "expenses": expenses,
        })),
    ))
}
