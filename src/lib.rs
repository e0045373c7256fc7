//! Spending Tracker is a JSON API for recording personal expenses.
//!
//! Users register and log in to get a bearer token, then record expenses one
//! at a time, list them a page at a time, or record every item on a receipt at
//! once by posting the JSON read from the receipt's QR code.
//!
//! The QR payload is searched for line items (objects with a `name` and a
//! `price`), every item is checked, and one expense is saved per item. See
//! [scan_expenses] for the whole pipeline.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod date;
mod db;
mod endpoints;
mod error;
mod expense;
mod logging;
mod pagination;
mod password;
mod routing;
mod scan;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Claims, JwtKeys};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{Expense, ExpenseDraft, ExpenseStore, SQLiteExpenseStore};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use scan::{
    CandidateItem, ValidatedItem, extract_items, materialize, scan_expenses, validate_item,
    validate_items,
};
pub use user::{NewUser, User, UserID, create_user};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
