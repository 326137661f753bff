//! Defines the core data models and database queries for transactions.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, TransactionType, UserID,
    category::get_category,
    database_id::{CategoryId, TransactionId},
    transaction::iso_date,
};

// ============================================================================
// MODELS
// ============================================================================

/// The ID and name of the category a transaction belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub name: String,
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The category the transaction belongs to.
    pub category: CategorySummary,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        kind: TransactionType,
        category_id: CategoryId,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            kind,
            category_id,
            date: OffsetDateTime::now_utc().date(),
            description: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::{TransactionType, transaction::Transaction};
///
/// let transaction = Transaction::build(45.99, TransactionType::Expense, 1)
///     .date(date!(2025 - 01 - 15))
///     .description(Some("Coffee".to_owned()));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money, must be a positive, finite number.
    pub amount: f64,

    /// Whether the money was earned or spent.
    pub kind: TransactionType,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    ///
    /// Must be owned by the same user as the transaction.
    pub category_id: CategoryId,

    /// The date when the transaction occurred.
    ///
    /// Defaults to today's date (UTC) if not specified.
    pub date: Date,

    /// A human-readable description of the transaction.
    pub description: Option<String>,
}

impl TransactionBuilder {
    /// Set the date of the transaction.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Set the description of the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// The fields of a transaction edit. Fields that are `None` keep their current value.
///
/// An empty description clears the stored description.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    /// The new amount.
    pub amount: Option<f64>,
    /// The new description.
    pub description: Option<String>,
    /// The new date.
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    /// The new transaction type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The new category.
    pub category_id: Option<CategoryId>,
}

/// The state needed to list, read, create, edit and delete transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Check that `amount` can be stored as a transaction amount.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is zero, negative or not finite.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Trim `description`, treating blank descriptions as no description.
fn normalise_description(description: Option<String>) -> Option<String> {
    description
        .map(|description| description.trim().to_owned())
        .filter(|description| !description.is_empty())
}

/// Check that `category_id` refers to a category owned by `user_id`.
fn ensure_category_owned(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match get_category(category_id, user_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidCategory(category_id)),
        Err(error) => Err(error),
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_TRANSACTION: &str = "SELECT t.id, t.user_id, t.amount, t.description, t.kind, t.date, \
     t.category_id, c.name, t.created_at, t.updated_at \
     FROM \"transaction\" t INNER JOIN category c ON c.id = t.category_id";

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not a positive, finite number,
/// - or [Error::InvalidCategory] if the category ID does not refer to a category owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = validate_amount(builder.amount)?;
    ensure_category_owned(builder.category_id, user_id, connection)?;
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO \"transaction\"
            (user_id, category_id, amount, description, kind, date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            user_id.as_i64(),
            builder.category_id,
            amount,
            normalise_description(builder.description),
            builder.kind,
            builder.date,
            now,
        ],
    )?;

    get_transaction(connection.last_insert_rowid(), user_id, connection)
}

/// Retrieve the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = :id AND t.user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve up to `limit` of the transactions owned by `user_id`, newest first.
///
/// Transactions on the same date are ordered by most recently created.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.user_id = ?1 ORDER BY t.date DESC, t.id DESC LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Retrieve all transactions owned by `user_id` dated on or after `since`, newest first.
///
/// If `since` is `None` every transaction of the user is returned.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_since(
    user_id: UserID,
    since: Option<Date>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.user_id = ?1 AND (?2 IS NULL OR t.date >= ?2) \
             ORDER BY t.date DESC, t.id DESC"
        ))?
        .query_map((user_id.as_i64(), since), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Apply `update` to the transaction `id` owned by `user_id` and refresh its `updated_at`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::InvalidAmount] if the new amount is not a positive, finite number,
/// - or [Error::InvalidCategory] if the new category is not owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    // Report a missing transaction before complaining about its new fields.
    get_transaction(id, user_id, connection)?;

    let amount = update.amount.map(validate_amount).transpose()?;
    if let Some(category_id) = update.category_id {
        ensure_category_owned(category_id, user_id, connection)?;
    }
    let description = update
        .description
        .map(|description| description.trim().to_owned());

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET
            amount = COALESCE(?1, amount),
            description = CASE WHEN ?2 IS NULL THEN description ELSE NULLIF(?2, '') END,
            date = COALESCE(?3, date),
            kind = COALESCE(?4, kind),
            category_id = COALESCE(?5, category_id),
            updated_at = ?6
         WHERE id = ?7 AND user_id = ?8",
        params![
            amount,
            description,
            update.date,
            update.kind,
            update.category_id,
            OffsetDateTime::now_utc(),
            id,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_transaction(id, user_id, connection)
}

/// Delete the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                description TEXT,
                kind TEXT NOT NULL CHECK (kind IN ('INCOME', 'EXPENSE')),
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the transaction list, dashboard and reports.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Expects the columns in the order of `SELECT_TRANSACTION`.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        description: row.get(3)?,
        kind: row.get(4)?,
        date: row.get(5)?,
        category: CategorySummary {
            id: row.get(6)?,
            name: row.get(7)?,
        },
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
