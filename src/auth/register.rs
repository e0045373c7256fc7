//! Registration of new users.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    db::lock,
    user::{NewUser, create_user, get_user_by_email},
};

/// The currency label given to users who do not choose one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegisterState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost for hashing the new user's password.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// The body of a registration request.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// The user's name.
    pub full_name: String,
    /// The email address to log in with.
    pub email: String,
    /// The password to log in with.
    pub password: String,
    /// Must match `password`.
    pub confirm_password: String,
    /// How much the user plans to spend each month.
    #[serde(default)]
    pub monthly_budget: f64,
    /// A currency label, defaults to [DEFAULT_CURRENCY].
    #[serde(default)]
    pub preferred_currency: Option<String>,
    /// Whether the user wants notifications.
    #[serde(default)]
    pub notification_pref: bool,
}

/// A route handler for registering a new user.
///
/// # Errors
///
/// Returns a:
/// - [Error::PasswordMismatch] if the password and its confirmation differ,
/// - [Error::InvalidEmail] if the email is not a valid email address,
/// - [Error::DuplicateEmail] if the email is already registered,
/// - [Error::TooWeak] if the password is easy to guess,
/// - or an internal error if the password could not be hashed or the user
///   could not be saved.
pub async fn register_user(
    State(state): State<RegisterState>,
    WithRejection(Json(form), _): WithRejection<Json<RegisterForm>, Error>,
) -> Result<(StatusCode, Json<Value>), Error> {
    if form.password != form.confirm_password {
        return Err(Error::PasswordMismatch);
    }

    let email =
        EmailAddress::from_str(&form.email).map_err(|_| Error::InvalidEmail(form.email.clone()))?;

    let existing_user = {
        let connection = lock(&state.db_connection)?;
        get_user_by_email(&email, &connection)
    };

    match existing_user {
        Ok(_) => return Err(Error::DuplicateEmail),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let password =
        ValidatedPassword::new(&form.password, &[email.as_str(), form.full_name.as_str()])?;
    let cost = state.password_hash_cost;
    let password_hash = tokio::task::spawn_blocking(move || PasswordHash::new(password, cost))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))??;

    let new_user = NewUser {
        full_name: form.full_name,
        email,
        password_hash,
        monthly_budget: form.monthly_budget,
        preferred_currency: form
            .preferred_currency
            .filter(|currency| !currency.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
        notification_pref: form.notification_pref,
    };

    let user = {
        let connection = lock(&state.db_connection)?;
        create_user(new_user, &connection)?
    };
    tracing::info!("registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        AppState, endpoints,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, create_test_user, get_test_app_state},
        user::get_user_by_email,
    };

    use super::register_user;

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::REGISTER, post(register_user))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    fn registration(email: &str, password: &str, confirm_password: &str) -> Value {
        json!({
            "fullName": "Jane Doe",
            "email": email,
            "password": password,
            "confirmPassword": confirm_password,
        })
    }

    #[tokio::test]
    async fn register_succeeds() {
        let state = get_test_app_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration("jane@example.com", TEST_PASSWORD, TEST_PASSWORD))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        response.assert_json(&json!({ "message": "User registered successfully" }));

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email(&"jane@example.com".parse().unwrap(), &connection).unwrap();
        assert_eq!(user.full_name, "Jane Doe");
        assert_eq!(user.preferred_currency, "USD");
        assert!(user.password_hash.verify(TEST_PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn register_keeps_optional_fields() {
        let state = get_test_app_state();
        let server = get_test_server(state.clone());

        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "fullName": "Jane Doe",
                "email": "jane@example.com",
                "password": TEST_PASSWORD,
                "confirmPassword": TEST_PASSWORD,
                "monthlyBudget": 750.5,
                "preferredCurrency": "NZD",
                "notificationPref": true,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email(&"jane@example.com".parse().unwrap(), &connection).unwrap();
        assert_eq!(user.monthly_budget, 750.5);
        assert_eq!(user.preferred_currency, "NZD");
        assert!(user.notification_pref);
    }

    #[tokio::test]
    async fn register_fails_on_password_mismatch() {
        let server = get_test_server(get_test_app_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration("jane@example.com", TEST_PASSWORD, "somethingelseentirely"))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "message": "Passwords do not match",
            "kind": "PasswordMismatch",
        }));
    }

    #[tokio::test]
    async fn register_fails_on_existing_email() {
        let state = get_test_app_state();
        create_test_user(&state.db_connection.lock().unwrap());
        let server = get_test_server(state);

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration(TEST_EMAIL, TEST_PASSWORD, TEST_PASSWORD))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "User already exists");
    }

    #[tokio::test]
    async fn register_fails_on_invalid_email() {
        let server = get_test_server(get_test_app_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration("not an email", TEST_PASSWORD, TEST_PASSWORD))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["kind"], "InvalidEmail");
    }

    #[tokio::test]
    async fn register_fails_on_weak_password() {
        let server = get_test_server(get_test_app_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration("jane@example.com", "password", "password"))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["kind"], "TooWeak");
    }
}
