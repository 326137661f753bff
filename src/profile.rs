//! The user's profile: display name, avatar and preferred currency.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, UserID, extract::ApiJson};

/// The currency new profiles start with.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// A user's profile. Every user has exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// The user the profile belongs to.
    pub user_id: UserID,
    /// The name displayed in the app.
    pub full_name: String,
    /// A link to the user's avatar image.
    pub avatar_url: Option<String>,
    /// A three letter currency code, e.g. "BRL".
    pub currency: String,
    /// When the profile was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields of a profile edit. Fields that are `None` keep their current value.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// The new display name.
    pub full_name: Option<String>,
    /// The new avatar link.
    pub avatar_url: Option<String>,
    /// The new currency code.
    pub currency: Option<String>,
}

/// Create the profile table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
                user_id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL,
                avatar_url TEXT,
                currency TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create the profile for a newly registered user with the default currency.
///
/// # Errors
/// Returns an [Error::SqlError] if the user does not exist or already has a profile.
pub fn create_profile(
    user_id: UserID,
    full_name: &str,
    connection: &Connection,
) -> Result<Profile, Error> {
    connection
        .prepare(
            "INSERT INTO profile (user_id, full_name, avatar_url, currency, updated_at)
             VALUES (?1, ?2, NULL, ?3, ?4)
             RETURNING user_id, full_name, avatar_url, currency, updated_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                full_name,
                DEFAULT_CURRENCY,
                OffsetDateTime::now_utc(),
            ),
            map_profile_row,
        )
        .map_err(Error::from)
}

/// Get the profile of `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no profile.
pub fn get_profile(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    connection
        .prepare(
            "SELECT user_id, full_name, avatar_url, currency, updated_at
             FROM profile WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], map_profile_row)
        .map_err(Error::from)
}

/// Apply `update` to the profile of `user_id`, creating the profile if it is missing.
///
/// A missing profile is created with the user's registered name and the
/// default currency for any field `update` leaves out.
///
/// # Errors
/// Returns an [Error::InvalidCurrency] if the currency is not a three letter code,
/// an [Error::MissingFields] if the new name is blank,
/// or an [Error::SqlError] if `user_id` does not refer to a user.
pub fn upsert_profile(
    user_id: UserID,
    update: ProfileUpdate,
    connection: &Connection,
) -> Result<Profile, Error> {
    let currency = update.currency.as_deref().map(parse_currency).transpose()?;
    let full_name = match update.full_name.map(|name| name.trim().to_owned()) {
        Some(name) if name.is_empty() => return Err(Error::MissingFields(vec!["full_name"])),
        full_name => full_name,
    };

    connection
        .prepare(
            "INSERT INTO profile (user_id, full_name, avatar_url, currency, updated_at)
             VALUES (
                ?1,
                COALESCE(?2, (SELECT name FROM user WHERE id = ?1)),
                ?3,
                COALESCE(?4, ?5),
                ?6
             )
             ON CONFLICT(user_id) DO UPDATE SET
                full_name = COALESCE(?2, full_name),
                avatar_url = COALESCE(?3, avatar_url),
                currency = COALESCE(?4, currency),
                updated_at = ?6
             RETURNING user_id, full_name, avatar_url, currency, updated_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                full_name,
                update.avatar_url,
                currency,
                DEFAULT_CURRENCY,
                OffsetDateTime::now_utc(),
            ),
            map_profile_row,
        )
        .map_err(Error::from)
}

/// Normalise a currency code to upper case.
///
/// # Errors
/// Returns [Error::InvalidCurrency] unless `raw` is three ASCII letters.
fn parse_currency(raw: &str) -> Result<String, Error> {
    let code = raw.trim();

    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(Error::InvalidCurrency(raw.to_owned()))
    }
}

fn map_profile_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    Ok(Profile {
        user_id: UserID::new(row.get(0)?),
        full_name: row.get(1)?,
        avatar_url: row.get(2)?,
        currency: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// The state needed to read and edit profiles.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing profiles.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the caller's profile.
pub async fn get_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Profile>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_profile(user_id, &connection).map(Json)
}

/// A route handler that edits the caller's profile and returns the result.
pub async fn patch_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Profile>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let profile = upsert_profile(user_id, update, &connection)?;
    tracing::debug!("Updated profile for user {user_id}");

    Ok(Json(profile))
}
