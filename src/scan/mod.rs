//! Turns the JSON read from a receipt QR code into expenses.
//!
//! A scan goes through three steps:
//! 1. [extract_items] finds every object with a `name` and a `price`,
//! 2. [validate_items] checks them and computes their amounts,
//! 3. [materialize] saves one expense per item.
//!
//! An invalid item stops the scan before anything is saved.

mod endpoint;
mod extract;
mod materialize;
mod validate;

pub use endpoint::scan_endpoint;
pub use extract::{CandidateItem, extract_items};
pub use materialize::materialize;
pub use validate::{ValidatedItem, validate_item, validate_items};

use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    Error,
    date::DateInput,
    expense::{Expense, ExpenseStore},
};

/// Decode `data`, find its line items and save them as expenses for `owner_id`.
///
/// A top-level `date` in the payload is used as the date of every expense.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidPayloadFormat] if `data` is not JSON or its date cannot be parsed,
/// - [Error::NoValidItems] if no items were found,
/// - the first validation error if any item is invalid,
/// - or any error from [materialize].
pub async fn scan_expenses<S>(store: &S, owner_id: &str, data: &str) -> Result<Vec<Expense>, Error>
where
    S: ExpenseStore + Clone + Send + 'static,
{
    let payload: Value =
        serde_json::from_str(data).map_err(|error| Error::InvalidPayloadFormat(error.to_string()))?;

    let occurred_at = payload_date(&payload)?;

    let candidates = extract_items(&payload);
    if candidates.is_empty() {
        return Err(Error::NoValidItems);
    }

    let items = validate_items(&candidates)?;

    materialize(store, owner_id, items, occurred_at).await
}

/// Read the optional top-level `date` of a payload.
fn payload_date(payload: &Value) -> Result<Option<OffsetDateTime>, Error> {
    match payload.get("date") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => DateInput::parse(text)
            .map(|date| Some(date.start()))
            .ok_or_else(|| Error::InvalidPayloadFormat(format!("could not parse the date \"{text}\""))),
        Some(other) => Err(Error::InvalidPayloadFormat(format!(
            "expected the date to be a string, got {other}"
        ))),
    }
}
