//! Registration of new user accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    category::seed_default_categories,
    extract::ApiJson,
    profile::create_profile,
    user::{User, create_user, parse_email},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost for hashing the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data entered during registration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The email address to log in with.
    pub email: Option<String>,
    /// The password to log in with.
    pub password: Option<String>,
    /// The name shown in the app.
    pub name: Option<String>,
}

/// Create a user together with their profile and default categories.
///
/// Either everything is created or nothing is.
///
/// # Errors
///
/// Returns an [Error::DuplicateEmail] if `email` is already registered, or an
/// [Error::SqlError] if some other SQL error occurred.
pub fn create_account(
    email: &EmailAddress,
    name: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let transaction = connection.unchecked_transaction()?;

    let user = create_user(email, name, password_hash, &transaction)?;
    create_profile(user.id, name, &transaction)?;
    seed_default_categories(user.id, &transaction)?;

    transaction.commit()?;

    Ok(user)
}

/// A route handler for registering a new user.
///
/// Responds with 201 Created and a message on success.
///
/// # Errors
///
/// Returns an error if a field is missing, the email is invalid, the password
/// is too weak, or the email is already registered.
pub async fn register_user(
    State(state): State<RegistrationState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, Error> {
    let name = request
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty());

    let (raw_email, raw_password, name) = match (request.email, request.password, name) {
        (Some(email), Some(password), Some(name)) => (email, password, name),
        (email, password, name) => {
            let missing = [
                ("email", email.is_none()),
                ("password", password.is_none()),
                ("name", name.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, is_missing)| is_missing.then_some(field))
            .collect();

            return Err(Error::MissingFields(missing));
        }
    };

    let email = parse_email(&raw_email)?;
    let validated_password =
        ValidatedPassword::new(&raw_password, &[email.as_str(), name.as_str()])?;
    let password_hash =
        PasswordHash::new(validated_password, state.password_hash_cost).inspect_err(|error| {
            tracing::error!("an error occurred while hashing a password: {error}")
        })?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_account(&email, &name, password_hash, &connection)?;
    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully" })),
    ))
}
