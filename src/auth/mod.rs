//! User authentication: registration, log-in and log-out, session cookies,
//! bearer tokens and the middleware guarding protected routes.

mod cookie;
mod jwt;
mod log_in;
mod log_out;
mod middleware;
mod register;
mod session;
mod token;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use jwt::BearerKeys;
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use register::{create_account, register_user};
pub use session::get_session;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
#[cfg(test)]
pub(crate) use log_in::LogInResponse;
