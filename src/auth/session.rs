use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, UserID, user::get_user_by_id};

/// The state needed to look up the logged-in user.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The public details of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The user's ID.
    pub id: UserID,
    /// The user's email address.
    pub email: String,
    /// The user's registered name.
    pub name: String,
}

/// A route handler that returns the user the request was authenticated as.
pub async fn get_session(
    State(state): State<SessionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<SessionUser>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    // A token can outlive its user, which makes the token invalid.
    let user = get_user_by_id(user_id, &connection).map_err(|error| match error {
        Error::NotFound => Error::Unauthorized,
        error => error,
    })?;

    Ok(Json(SessionUser {
        id: user.id,
        email: user.email,
        name: user.name,
    }))
}
