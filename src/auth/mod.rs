//! User registration, log-in and the bearer tokens that protect the expense routes.

mod log_in;
mod register;
pub(crate) mod token;

pub use log_in::post_log_in;
pub use register::register_user;
pub use token::{Claims, JwtKeys};
