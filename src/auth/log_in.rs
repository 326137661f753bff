//! This file defines the route for handling log-in requests.
//! The cookie and jwt modules handle the lower level token logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use axum_extra::extract::PrivateCookieJar;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, UserID,
    auth::{
        cookie::set_auth_cookie,
        jwt::{BearerKeys, create_bearer_token},
    },
    extract::ApiJson,
    user::get_user_by_email,
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The keys for signing bearer tokens.
    pub bearer_keys: BearerKeys,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_duration: state.cookie_duration,
            bearer_keys: state.bearer_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered during log-in.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LogInRequest {
    /// Email entered during log-in.
    pub email: Option<String>,
    /// Password entered during log-in.
    pub password: Option<String>,
    /// Whether to keep the user logged in for [REMEMBER_ME_COOKIE_DURATION].
    #[serde(default)]
    pub remember_me: bool,
}

/// The body of a successful log-in response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The ID of the user that logged in.
    pub user_id: UserID,
    /// The user's email address.
    pub email: String,
    /// The user's registered name.
    pub name: String,
    /// A bearer token that can be used instead of the session cookie.
    pub access_token: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request the auth cookie is set and the user's
/// details are returned with a bearer token.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing.
/// - The email does not belong to a registered user or the password is not correct.
///   Both cases give the same error so clients cannot tell which emails are registered.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    ApiJson(request): ApiJson<LogInRequest>,
) -> Result<impl IntoResponse, Error> {
    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) => (email, password),
        (email, password) => {
            let mut missing = Vec::new();
            if email.is_none() {
                missing.push("email");
            }
            if password.is_none() {
                missing.push("password");
            }
            return Err(Error::MissingFields(missing));
        }
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user.password_hash.verify(&password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if request.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;
    let access_token = create_bearer_token(user.id, &state.bearer_keys)?;
    tracing::info!("User {} logged in", user.id);

    Ok((
        jar,
        Json(LogInResponse {
            user_id: user.id,
            email: user.email,
            name: user.name,
            access_token,
        }),
    ))
}
