//! Categories group a user's transactions, e.g. "Groceries" or "Salary".
//!
//! Every category is typed as either income or expense and belongs to exactly
//! one user. New users get the [DEFAULT_CATEGORIES].

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, TransactionType, UserID,
    database_id::CategoryId,
    extract::{ApiJson, ApiQuery},
};

/// The categories every new user starts with.
pub const DEFAULT_CATEGORIES: &[(&str, TransactionType)] = &[
    ("Alimentação", TransactionType::Expense),
    ("Moradia", TransactionType::Expense),
    ("Transporte", TransactionType::Expense),
    ("Lazer", TransactionType::Expense),
    ("Saúde", TransactionType::Expense),
    ("Educação", TransactionType::Expense),
    ("Salário", TransactionType::Income),
    ("Freelance", TransactionType::Income),
    ("Investimentos", TransactionType::Income),
];

/// The colour used when a category is created without one.
pub const DEFAULT_COLOR: &str = "#6b7280";
/// The icon used when a category is created without one.
pub const DEFAULT_ICON: &str = "dollar-sign";

/// The name of a category. Never empty and never padded with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name without validation.
    ///
    /// The caller should ensure that `name` is non-empty and trimmed.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }
}

impl TryFrom<String> for CategoryName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryName> for String {
    fn from(name: CategoryName) -> Self {
        name.0
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A label for grouping a user's transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserID,
    /// The display name of the category.
    pub name: CategoryName,
    /// Whether the category groups income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A CSS colour for displaying the category.
    pub color: String,
    /// The name of the icon displayed next to the category.
    pub icon: String,
}

/// The data needed to create a category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The display name of the category.
    pub name: CategoryName,
    /// Whether the category groups income or expenses.
    pub kind: TransactionType,
    /// A CSS colour, [DEFAULT_COLOR] if `None`.
    pub color: Option<String>,
    /// An icon name, [DEFAULT_ICON] if `None`.
    pub icon: Option<String>,
}

impl NewCategory {
    /// A category with the default colour and icon.
    pub fn new(name: CategoryName, kind: TransactionType) -> Self {
        Self {
            name,
            kind,
            color: None,
            icon: None,
        }
    }
}

/// Create the category table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('INCOME', 'EXPENSE')),
                color TEXT NOT NULL,
                icon TEXT NOT NULL,
                UNIQUE(user_id, name),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a category owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategoryName] if the user already has a category with the same name,
/// - or [Error::SqlError] if `user_id` is not a valid user or there is some other SQL error.
pub fn create_category(
    category: NewCategory,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "INSERT INTO category (user_id, name, kind, color, icon)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, name, kind, color, icon",
        )?
        .query_row(
            (
                user_id.as_i64(),
                category.name.as_ref(),
                category.kind,
                category.color.as_deref().unwrap_or(DEFAULT_COLOR),
                category.icon.as_deref().unwrap_or(DEFAULT_ICON),
            ),
            map_category_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategoryName(category.name.to_string()),
            error => error.into(),
        })
}

/// Retrieve the category `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a category owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, color, icon FROM category
             WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_category_row,
        )
        .map_err(Error::from)
}

/// Retrieve the categories of `user_id` ordered by name, optionally only those of type `kind`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_categories(
    user_id: UserID,
    kind: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, color, icon FROM category
             WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY name ASC",
        )?
        .query_map((user_id.as_i64(), kind), map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Give `user_id` the [DEFAULT_CATEGORIES].
///
/// Categories the user already has are left untouched, so calling this twice
/// does not create duplicates.
///
/// # Errors
/// Returns an [Error::SqlError] if `user_id` is not a valid user or there is some other SQL error.
pub fn seed_default_categories(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO category (user_id, name, kind, color, icon)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for (name, kind) in DEFAULT_CATEGORIES {
        statement.execute((user_id.as_i64(), name, kind, DEFAULT_COLOR, DEFAULT_ICON))?;
    }

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        kind: row.get(3)?,
        color: row.get(4)?,
        icon: row.get(5)?,
    })
}

/// The state needed to list and create categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Only list categories of this type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

/// The request body for creating a category.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    /// The name of the new category.
    pub name: Option<String>,
    /// Whether the category groups income or expenses.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// A CSS colour.
    pub color: Option<String>,
    /// An icon name.
    pub icon: Option<String>,
}

/// A route handler for listing the caller's categories.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_categories(user_id, query.kind, &connection).map(Json)
}

/// A route handler for creating a category, responds with the new category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, Error> {
    let (name, kind) = match (request.name, request.kind) {
        (Some(name), Some(kind)) => (name, kind),
        (name, kind) => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push("name");
            }
            if kind.is_none() {
                missing.push("type");
            }
            return Err(Error::MissingFields(missing));
        }
    };

    let new_category = NewCategory {
        name: name.parse()?,
        kind,
        color: request.color,
        icon: request.icon,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(new_category, user_id, &connection)?;
    tracing::debug!("Created category {} for user {user_id}", category.id);

    Ok((StatusCode::CREATED, Json(category)))
}



#[cfg(test)]
mod category_endpoint_tests {
    use axum::http::StatusCode;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::{
        TransactionType, endpoints,
        category::Category,
        test_utils::{get_test_server, log_in_test_user},
    };

    #[tokio::test]
    async fn create_category_responds_with_new_category() {
        let server = get_test_server();
        let user = log_in_test_user(&server, "foo@bar.baz").await;

        let response = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&user.access_token)
            .json(&json!({ "name": " Pets ", "type": "EXPENSE" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let category = response.json::<Category>();
        assert_eq!(category.name.as_ref(), "Pets");
        assert_eq!(category.kind, TransactionType::Expense);
        assert_eq!(category.user_id, user.user_id);
    }

    #[rstest]
    #[case::missing_name(json!({ "type": "INCOME" }), "Missing required fields: name")]
    #[case::missing_type(json!({ "name": "Pets" }), "Missing required fields: type")]
    #[case::missing_both(json!({}), "Missing required fields: name, type")]
    #[case::blank_name(
        json!({ "name": "   ", "type": "EXPENSE" }),
        "Category name cannot be empty"
    )]
    #[tokio::test]
    async fn create_category_rejects_invalid_body(#[case] body: Value, #[case] message: &str) {
        let server = get_test_server();
        let user = log_in_test_user(&server, "foo@bar.baz").await;

        let response = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&user.access_token)
            .json(&body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": message }));
    }

    #[tokio::test]
    async fn create_category_rejects_duplicate_name() {
        let server = get_test_server();
        let user = log_in_test_user(&server, "foo@bar.baz").await;
        let body = json!({ "name": "Pets", "type": "EXPENSE" });
        server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&user.access_token)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&user.access_token)
            .json(&body)
            .await;

        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({ "error": "the category \"Pets\" already exists" }));
    }

    #[tokio::test]
    async fn get_categories_filters_by_type() {
        let server = get_test_server();
        let user = log_in_test_user(&server, "foo@bar.baz").await;

        let categories = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer(&user.access_token)
            .add_query_param("type", "INCOME")
            .await
            .json::<Vec<Category>>();

        assert!(!categories.is_empty());
        assert!(
            categories
                .iter()
                .all(|category| category.kind == TransactionType::Income)
        );
    }
}
