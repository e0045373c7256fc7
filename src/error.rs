//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The scanned QR data could not be decoded as JSON, or a value inside it
    /// (e.g., the payload date) had the wrong format.
    #[error("Invalid QR data format. Expected JSON string. {0}")]
    InvalidPayloadFormat(String),

    /// The line item at the given index does not have a string name.
    #[error("item {0} is missing a name")]
    MissingName(usize),

    /// The line item at the given index does not have a price.
    #[error("item {0} is missing a price")]
    MissingPrice(usize),

    /// The price of the line item at the given index is not a number greater
    /// than zero.
    #[error("item {0} has an invalid price, the price must be a number greater than zero")]
    InvalidPrice(usize),

    /// The quantity of the line item at the given index is not a number
    /// greater than zero.
    #[error("item {0} has an invalid quantity, the quantity must be a number greater than zero")]
    InvalidQuantity(usize),

    /// The scanned payload did not contain any line items.
    #[error("no valid items were found in the QR data")]
    NoValidItems,

    /// One or more expenses in a batch could not be saved.
    ///
    /// Expenses from the same batch that were saved before the failure are
    /// not rolled back.
    #[error("{failed} of {attempted} expenses could not be saved")]
    PartialPersistenceFailure {
        /// The number of inserts that failed.
        failed: usize,
        /// The number of inserts that were attempted.
        attempted: usize,
    },

    /// The string used to refer to the owner of an expense is not a valid
    /// user ID.
    #[error("\"{0}\" is not a valid user ID")]
    InvalidOwnerIdentity(String),

    /// The scan request did not include both the user ID and the QR data.
    #[error("userId and data are required")]
    MissingScanFields,

    /// The amount for a new expense was zero or negative.
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// The user in the request does not match the user in the auth token.
    #[error("the user ID does not match the logged in user")]
    OwnerMismatch,

    /// The password and its confirmation given during registration differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A user with the email already exists.
    #[error("User already exists")]
    DuplicateEmail,

    /// The email and password do not match a registered user.
    #[error("Invalid Credentials")]
    InvalidCredentials,

    /// The bearer token is missing, malformed or expired.
    #[error("invalid or missing auth token")]
    InvalidToken,

    /// The JSON web token could not be created.
    #[error("could not create auth token: {0}")]
    TokenCreation(String),

    /// A date in the expense query could not be parsed.
    #[error("could not parse the date \"{0}\", expected a date (YYYY-MM-DD) or an RFC 3339 date-time")]
    InvalidDateRange(String),

    /// The request body or query string could not be read, e.g. a field had the wrong type.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// The name of the error variant, sent to clients alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidPayloadFormat(_) => "InvalidPayloadFormat",
            Error::MissingName(_) => "MissingName",
            Error::MissingPrice(_) => "MissingPrice",
            Error::InvalidPrice(_) => "InvalidPrice",
            Error::InvalidQuantity(_) => "InvalidQuantity",
            Error::NoValidItems => "NoValidItems",
            Error::PartialPersistenceFailure { .. } => "PartialPersistenceFailure",
            Error::InvalidOwnerIdentity(_) => "InvalidOwnerIdentity",
            Error::MissingScanFields => "MissingScanFields",
            Error::InvalidAmount => "InvalidAmount",
            Error::OwnerMismatch => "OwnerMismatch",
            Error::PasswordMismatch => "PasswordMismatch",
            Error::InvalidEmail(_) => "InvalidEmail",
            Error::TooWeak(_) => "TooWeak",
            Error::HashingError(_) => "HashingError",
            Error::DuplicateEmail => "DuplicateEmail",
            Error::InvalidCredentials => "InvalidCredentials",
            Error::InvalidToken => "InvalidToken",
            Error::TokenCreation(_) => "TokenCreation",
            Error::InvalidDateRange(_) => "InvalidDateRange",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::NotFound => "NotFound",
            Error::SqlError(_) => "SqlError",
            Error::DatabaseLockError => "DatabaseLockError",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::OwnerMismatch => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::PartialPersistenceFailure { .. }
            | Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => {
                // Any errors that are matched here are not intended to be shown to the client.
                tracing::error!("An unexpected error occurred: {}", self);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        let body = Json(json!({
            "message": message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::Value;

    use crate::Error;

    async fn render(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");

        (
            status,
            serde_json::from_slice(&body).expect("Could not parse body as JSON"),
        )
    }

    #[tokio::test]
    async fn validation_error_is_bad_request_with_kind() {
        let (status, body) = render(Error::InvalidPrice(2)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "InvalidPrice");
        assert_eq!(
            body["message"],
            "item 2 has an invalid price, the price must be a number greater than zero"
        );
    }

    #[tokio::test]
    async fn partial_failure_reports_counts() {
        let (status, body) = render(Error::PartialPersistenceFailure {
            failed: 1,
            attempted: 3,
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "PartialPersistenceFailure");
        assert_eq!(body["message"], "1 of 3 expenses could not be saved");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = render(Error::HashingError("bad salt".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["message"].as_str().unwrap().contains("bad salt"));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
