//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
///
/// User IDs are sent to and received from clients as strings, e.g. `"42"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserID {
    type Err = Error;

    /// Parse a user ID from a string of ASCII digits.
    ///
    /// Signs, whitespace and zero are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(Error::InvalidOwnerIdentity(s.to_owned()));
        }

        match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(Error::InvalidOwnerIdentity(s.to_owned())),
        }
    }
}

impl TryFrom<String> for UserID {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserID> for String {
    fn from(value: UserID) -> Self {
        value.to_string()
    }
}

/// Check that `id` is formatted as a user ID.
///
/// This does not check whether the user exists.
pub fn is_valid_identity(id: &str) -> bool {
    id.parse::<UserID>().is_ok()
}

/// A user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's name as entered during registration.
    pub full_name: String,
    /// The email address the user logs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// How much the user plans to spend each month.
    pub monthly_budget: f64,
    /// A currency label, e.g. "USD". No conversion is done with this value.
    pub preferred_currency: String,
    /// Whether the user wants to receive notifications.
    pub notification_pref: bool,
}

/// The data needed to register a new [User].
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The user's name.
    pub full_name: String,
    /// The email address the user logs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// How much the user plans to spend each month.
    pub monthly_budget: f64,
    /// A currency label, e.g. "USD".
    pub preferred_currency: String,
    /// Whether the user wants to receive notifications.
    pub notification_pref: bool,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                monthly_budget REAL NOT NULL DEFAULT 0,
                preferred_currency TEXT NOT NULL DEFAULT 'USD',
                notification_pref INTEGER NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email is already registered,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (full_name, email, password, monthly_budget, preferred_currency, notification_pref)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            &new_user.full_name,
            new_user.email.as_str(),
            new_user.password_hash.to_string(),
            new_user.monthly_budget,
            &new_user.preferred_currency,
            new_user.notification_pref,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        full_name: new_user.full_name,
        email: new_user.email,
        password_hash: new_user.password_hash,
        monthly_budget: new_user.monthly_budget,
        preferred_currency: new_user.preferred_currency,
        notification_pref: new_user.notification_pref,
    })
}

/// Get the user from the database with the email address `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, full_name, email, password, monthly_budget, preferred_currency, notification_pref
             FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", email.as_str())], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let full_name = row.get(1)?;
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;
    let monthly_budget = row.get(4)?;
    let preferred_currency = row.get(5)?;
    let notification_pref = row.get(6)?;

    Ok(User {
        id: UserID::new(raw_id),
        full_name,
        email: EmailAddress::new_unchecked(raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        monthly_budget,
        preferred_currency,
        notification_pref,
    })
}

#[cfg(test)]
mod user_id_tests {
    use crate::{
        Error,
        user::{UserID, is_valid_identity},
    };

    #[test]
    fn parses_positive_integer() {
        assert_eq!("42".parse::<UserID>(), Ok(UserID::new(42)));
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "0", "-1", "+1", " 1", "1.0", "abc", "507f1f77bcf86cd799439011"] {
            assert_eq!(
                raw.parse::<UserID>(),
                Err(Error::InvalidOwnerIdentity(raw.to_owned())),
                "want {raw:?} to be rejected"
            );
            assert!(!is_valid_identity(raw));
        }
    }

    #[test]
    fn rejects_ids_that_overflow() {
        assert!(!is_valid_identity("99999999999999999999"));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&UserID::new(7)).unwrap();

        assert_eq!(json, "\"7\"");
        assert_eq!(serde_json::from_str::<UserID>(&json).unwrap(), UserID::new(7));
    }
}

#[cfg(test)]
mod user_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        user::{NewUser, create_user, create_user_table, get_user_by_email},
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            full_name: "Jane Doe".to_owned(),
            email: EmailAddress::from_str(email).unwrap(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            monthly_budget: 500.0,
            preferred_currency: "NZD".to_owned(),
            notification_pref: true,
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.full_name, "Jane Doe");
        assert_eq!(inserted_user.preferred_currency, "NZD");
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        let result = create_user(new_user("foo@bar.baz"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        let retrieved_user = get_user_by_email(&test_user.email, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_fails_with_non_existent_email() {
        let db_connection = get_db_connection();
        let email = EmailAddress::from_str("notavalidemail@foo.bar").unwrap();

        assert_eq!(
            get_user_by_email(&email, &db_connection),
            Err(Error::NotFound)
        );
    }
}
