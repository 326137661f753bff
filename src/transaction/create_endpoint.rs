//! Defines the endpoint for creating a new transaction.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, TransactionType, UserID,
    database_id::CategoryId,
    extract::ApiJson,
    transaction::{Transaction, TransactionState, core::create_transaction, iso_date},
};

/// The request body for creating a transaction.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    /// The amount of money, must be positive.
    pub amount: Option<f64>,
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// When the transaction happened, defaults to today.
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

/// A route handler for creating a new transaction for the caller.
///
/// Responds with 201 and the created transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(request): ApiJson<CreateTransactionRequest>,
) -> Result<impl IntoResponse, Error> {
    let (amount, kind, category_id) = match (request.amount, request.kind, request.category_id) {
        (Some(amount), Some(kind), Some(category_id)) => (amount, kind, category_id),
        (amount, kind, category_id) => {
            let missing = [
                ("amount", amount.is_none()),
                ("type", kind.is_none()),
                ("category_id", category_id.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, is_missing)| is_missing.then_some(field))
            .collect();

            return Err(Error::MissingFields(missing));
        }
    };

    let mut builder =
        Transaction::build(amount, kind, category_id).description(request.description);
    if let Some(date) = request.date {
        builder = builder.date(date);
    }

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(builder, user_id, &connection).inspect_err(|error| {
        tracing::debug!("could not create transaction for user {user_id}: {error}")
    })?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error, TransactionType,
        category::Category,
        extract::ApiJson,
        test_utils::{
            create_test_category, create_test_user, get_test_connection, parse_json_response,
        },
        transaction::{
            Transaction, TransactionState,
            create_endpoint::{CreateTransactionRequest, create_transaction_endpoint},
            get_transaction,
        },
        user::User,
    };

    fn setup() -> (TransactionState, User, Category) {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let category = create_test_category(user.id, "Rent", TransactionType::Expense, &conn);

        (
            TransactionState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user,
            category,
        )
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user, category) = setup();
        let request = CreateTransactionRequest {
            amount: Some(1200.0),
            description: Some("March rent".to_owned()),
            kind: Some(TransactionType::Expense),
            category_id: Some(category.id),
            date: Some(date!(2025 - 03 - 01)),
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user.id), ApiJson(request))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let transaction: Transaction = parse_json_response(response).await;
        assert_eq!(transaction.user_id, user.id);
        assert_eq!(transaction.amount, 1200.0);
        assert_eq!(transaction.date, date!(2025 - 03 - 01));
        assert_eq!(transaction.category.name, "Rent");
        let stored = get_transaction(
            transaction.id,
            user.id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(stored, transaction);
    }

    #[tokio::test]
    async fn date_defaults_to_today() {
        let (state, user, category) = setup();
        let request = CreateTransactionRequest {
            amount: Some(1.0),
            kind: Some(TransactionType::Expense),
            category_id: Some(category.id),
            ..Default::default()
        };

        let response =
            create_transaction_endpoint(State(state), Extension(user.id), ApiJson(request))
                .await
                .into_response();

        let transaction: Transaction = parse_json_response(response).await;
        assert_eq!(transaction.date, OffsetDateTime::now_utc().date());
    }

    #[tokio::test]
    async fn reports_missing_fields() {
        let (state, user, _) = setup();
        let request = CreateTransactionRequest {
            amount: Some(1.0),
            ..Default::default()
        };

        let result =
            create_transaction_endpoint(State(state), Extension(user.id), ApiJson(request)).await;

        assert_eq!(
            result.err(),
            Some(Error::MissingFields(vec!["type", "category_id"]))
        );
    }

    #[tokio::test]
    async fn rejects_category_of_other_user() {
        let (state, _, category) = setup();
        let other_user = create_test_user("bar@baz.qux", &state.db_connection.lock().unwrap());
        let request = CreateTransactionRequest {
            amount: Some(1.0),
            kind: Some(TransactionType::Expense),
            category_id: Some(category.id),
            ..Default::default()
        };

        let result =
            create_transaction_endpoint(State(state), Extension(other_user.id), ApiJson(request))
                .await;

        assert_eq!(result.err(), Some(Error::InvalidCategory(category.id)));
    }
}
