//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error, PasswordHash, auth::JwtKeys, db::initialize, expense::SQLiteExpenseStore,
    pagination::PaginationConfig,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys for signing and checking auth tokens.
    pub jwt_keys: JwtKeys,

    /// The config that controls how expenses are paged.
    pub pagination_config: PaginationConfig,

    /// The bcrypt cost used when hashing the passwords of new users.
    pub password_hash_cost: u32,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `jwt_secret` is used to sign the auth tokens handed out at log-in.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys::new(jwt_secret),
            pagination_config,
            password_hash_cost: PasswordHash::DEFAULT_COST,
        })
    }

    /// Set the bcrypt cost for hashing passwords.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_keys.clone()
    }
}

impl FromRef<AppState> for SQLiteExpenseStore {
    fn from_ref(state: &AppState) -> Self {
        SQLiteExpenseStore::new(state.db_connection.clone())
    }
}
