//! Log-in requests, which trade an email and password for an auth token.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::WithRejection;
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::token::{JwtKeys, encode_jwt},
    db::lock,
    user::{User, UserID, get_user_by_email},
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing the auth token.
    pub jwt_keys: JwtKeys,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
        }
    }
}

/// The body of a log-in request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// The public details of a logged in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's ID, used in the expense routes.
    pub id: UserID,
    /// The user's name.
    pub full_name: String,
    /// The user's email address.
    pub email: String,
    /// How much the user plans to spend each month.
    pub monthly_budget: f64,
    /// The user's currency label.
    pub preferred_currency: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email.to_string(),
            monthly_budget: user.monthly_budget,
            preferred_currency: user.preferred_currency,
        }
    }
}

/// The response to a successful log-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The bearer token for the expense routes.
    pub token: String,
    /// The user that logged in.
    pub user: UserProfile,
}

/// Handler for log-in requests via the POST method.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidCredentials] if the email is not registered or the password is wrong,
/// - or an internal error if the password could not be checked or the token could not be created.
pub async fn post_log_in(
    State(state): State<LoginState>,
    WithRejection(Json(user_data), _): WithRejection<Json<LogInData>, Error>,
) -> Result<Json<LogInResponse>, Error> {
    let email =
        EmailAddress::from_str(&user_data.email).map_err(|_| Error::InvalidCredentials)?;

    let user = {
        let connection = lock(&state.db_connection)?;
        get_user_by_email(&email, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::debug!("log-in attempt for unknown email {email}");
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    let password_hash = user.password_hash.clone();
    let password = user_data.password;
    let is_password_correct =
        tokio::task::spawn_blocking(move || password_hash.verify(&password))
            .await
            .map_err(|error| Error::HashingError(error.to_string()))??;

    if !is_password_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_jwt(user.id, &state.jwt_keys.encoding)?;
    tracing::info!("user {} logged in", user.id);

    Ok(Json(LogInResponse {
        token,
        user: user.into(),
    }))
}
