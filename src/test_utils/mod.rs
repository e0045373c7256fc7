#![allow(missing_docs)]

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    db::initialize,
    expense::{Expense, ExpenseDraft, ExpenseStore},
    pagination::PaginationConfig,
    user::{NewUser, User, create_user, is_valid_identity},
};

pub(crate) const TEST_JWT_SECRET: &str = "foobar";
pub(crate) const TEST_PASSWORD: &str = "roostersgocockledoodledoo";
pub(crate) const TEST_EMAIL: &str = "test@example.com";

/// The lowest cost bcrypt accepts, to keep the tests fast.
pub(crate) const TEST_HASH_COST: u32 = 4;

pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&conn).expect("Could not initialize database.");
    conn
}

/// Insert a user with the email [TEST_EMAIL] and the password [TEST_PASSWORD].
pub(crate) fn create_test_user(conn: &Connection) -> User {
    create_test_user_with_email(TEST_EMAIL, conn)
}

pub(crate) fn create_test_user_with_email(email: &str, conn: &Connection) -> User {
    let password = ValidatedPassword::new(TEST_PASSWORD, &[]).expect("Test password is too weak");

    create_user(
        NewUser {
            full_name: "Test User".to_owned(),
            email: EmailAddress::from_str(email).expect("Invalid test email"),
            password_hash: PasswordHash::new(password, TEST_HASH_COST)
                .expect("Could not hash test password"),
            monthly_budget: 1000.0,
            preferred_currency: "USD".to_owned(),
            notification_pref: false,
        },
        conn,
    )
    .expect("Could not create test user")
}

pub(crate) fn get_test_app_state() -> AppState {
    AppState::new(
        Connection::open_in_memory().expect("Could not open database in memory."),
        TEST_JWT_SECRET,
        PaginationConfig::default(),
    )
    .expect("Could not create app state")
    .with_password_hash_cost(TEST_HASH_COST)
}

/// An [ExpenseStore] that keeps expenses in memory and can be told to fail.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingStore {
    inserted: Arc<Mutex<Vec<ExpenseDraft>>>,
    fail_on: Option<String>,
}

impl RecordingStore {
    /// A store that fails to insert any expense with the category `category`.
    pub(crate) fn failing_on(category: &str) -> Self {
        Self {
            fail_on: Some(category.to_owned()),
            ..Default::default()
        }
    }

    /// The drafts that were saved, in the order they were saved.
    pub(crate) fn inserted(&self) -> Vec<ExpenseDraft> {
        self.inserted
            .lock()
            .expect("Could not lock recorded expenses")
            .clone()
    }
}

impl ExpenseStore for RecordingStore {
    fn is_valid_identity(&self, id: &str) -> bool {
        is_valid_identity(id)
    }

    fn insert(&self, draft: ExpenseDraft) -> Result<Expense, Error> {
        if self.fail_on.as_deref() == Some(draft.category.as_str()) {
            return Err(Error::DatabaseLockError);
        }

        let mut inserted = self
            .inserted
            .lock()
            .expect("Could not lock recorded expenses");
        inserted.push(draft.clone());

        Ok(Expense {
            id: inserted.len() as i64,
            user_id: draft.user_id,
            category: draft.category,
            amount: draft.amount,
            date: draft.date,
        })
    }
}
