//! Authentication middleware that validates the session cookie or bearer token and extends cookie sessions.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderName, HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    extract::{PrivateCookieJar, cookie::Key},
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error, UserID,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        jwt::{BearerKeys, verify_bearer_token},
    },
    user::get_user_by_id,
};

/// The request header the middleware sets to the authenticated user's ID.
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The keys for verifying bearer tokens.
    pub bearer_keys: BearerKeys,
    /// The database connection for checking that the user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            bearer_keys: state.bearer_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid bearer token or session cookie.
///
/// A request with an `Authorization: Bearer` header is authenticated by the
/// token alone. Otherwise the encrypted session cookie is used, and its expiry
/// is pushed back to at least the state's cookie duration from now once the
/// handler has run.
///
/// Requests without valid credentials, or whose user no longer exists, get a 401 response.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>`
/// to receive the user ID. The ID is also set in the [USER_ID_HEADER] header, replacing any value
/// sent by the client.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    parts.headers.remove(&USER_ID_HEADER);

    let bearer = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok();

    let (user_id, cookie_jar) = match bearer {
        Some(TypedHeader(Authorization(bearer))) => {
            match verify_bearer_token(bearer.token(), &state.bearer_keys) {
                Ok(user_id) => (user_id, None),
                Err(error) => return error.into_response(),
            }
        }
        None => {
            let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
                Ok(jar) => jar,
                Err(error) => {
                    tracing::error!("Error getting cookie jar: {error:?}");
                    return Error::Unauthorized.into_response();
                }
            };

            match get_token_from_cookies(&jar) {
                Ok(token) => (token.user_id, Some(jar)),
                Err(error) => return error.into_response(),
            }
        }
    };

    // Tokens stay valid after their user is deleted.
    if let Err(error) = ensure_user_exists(user_id, &state.db_connection) {
        return error.into_response();
    }

    insert_user_id(&mut parts, user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let Some(jar) = cookie_jar else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

fn ensure_user_exists(user_id: UserID, db_connection: &Mutex<Connection>) -> Result<(), Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::Unauthorized),
        Err(error) => Err(error),
    }
}

fn insert_user_id(parts: &mut axum::http::request::Parts, user_id: UserID) {
    parts
        .headers
        .insert(USER_ID_HEADER, HeaderValue::from(user_id.as_i64()));
    parts.extensions.insert(user_id);
}
