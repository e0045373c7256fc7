//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{user_id}', use [format_endpoint].

/// The root route, which reports that the API is up.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in and getting an auth token.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for recording a single expense.
pub const ADD_EXPENSE: &str = "/api/expenses/add";
/// The route for recording the expenses in a scanned receipt QR code.
pub const SCAN_EXPENSES: &str = "/api/expenses/scan";
/// The route for listing a user's expenses.
pub const USER_EXPENSES: &str = "/api/expenses/{user_id}";

/// Replace the `{...}` parameter in `endpoint_path` with `id`.
///
/// Only the first parameter is replaced. If there is no parameter, the
/// original `endpoint_path` is returned.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map(|offset| start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!("{}{}{}", &endpoint_path[..start], id, &endpoint_path[end..])
}
