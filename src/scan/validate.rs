//! Checks candidate items and turns them into typed line items.

use serde_json::Value;

use crate::{Error, scan::extract::CandidateItem};

/// A line item with a name, a positive price and a positive quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedItem {
    /// What was bought.
    pub name: String,
    /// The price of one unit.
    pub price: f64,
    /// How many units were bought.
    pub quantity: f64,
    /// `price * quantity`.
    pub amount: f64,
}

/// Check a single candidate item.
///
/// The checks run in order and the first failure is returned. `index` is the
/// position of the item in the scan and is used in the error.
///
/// # Errors
///
/// Returns a:
/// - [Error::MissingName] if the name is not a string,
/// - [Error::MissingPrice] if the price is null,
/// - [Error::InvalidPrice] if the price is not a number greater than zero,
/// - or [Error::InvalidQuantity] if the quantity is not a number greater than zero.
pub fn validate_item(index: usize, item: &CandidateItem) -> Result<ValidatedItem, Error> {
    let Value::String(name) = &item.name else {
        return Err(Error::MissingName(index));
    };

    if item.price.is_null() {
        return Err(Error::MissingPrice(index));
    }

    let price = positive_number(&item.price).ok_or(Error::InvalidPrice(index))?;
    let quantity = positive_number(&item.quantity).ok_or(Error::InvalidQuantity(index))?;

    // A huge quantity can overflow the amount to infinity.
    let amount = price * quantity;
    if !amount.is_finite() {
        return Err(Error::InvalidQuantity(index));
    }

    Ok(ValidatedItem {
        name: name.to_owned(),
        price,
        quantity,
        amount,
    })
}

/// Check every candidate item in a scan.
///
/// One invalid item rejects the whole scan so that a scan is either saved
/// in full or not at all.
///
/// # Errors
///
/// Returns the error for the first invalid item, see [validate_item].
pub fn validate_items(items: &[CandidateItem]) -> Result<Vec<ValidatedItem>, Error> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_item(index, item))
        .collect()
}

/// Only JSON numbers count, strings such as "3" are rejected.
fn positive_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|number| *number > 0.0),
        _ => None,
    }
}
