use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    extract::{ApiJson, ApiPath},
    transaction::{Transaction, TransactionState, TransactionUpdate, core::update_transaction},
};

/// A route handler for editing one of the caller's transactions.
///
/// Only the fields present in the request body are changed. Responds with the
/// updated transaction.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(update): ApiJson<TransactionUpdate>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = update_transaction(transaction_id, user_id, update, &connection)?;
    tracing::debug!("Updated transaction {transaction_id} for user {user_id}");

    Ok(Json(transaction))
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use time::macros::date;

    use crate::{
        Error, TransactionType,
        extract::{ApiJson, ApiPath},
        test_utils::{create_test_category, create_test_user, get_test_connection},
        transaction::{
            Transaction, TransactionState, TransactionUpdate, create_transaction,
            edit_endpoint::edit_transaction_endpoint, get_transaction,
        },
    };

    #[tokio::test]
    async fn can_update_transaction() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let category = create_test_category(user.id, "Rent", TransactionType::Expense, &conn);
        let transaction = create_transaction(
            Transaction::build(1.23, TransactionType::Expense, category.id)
                .date(date!(2025 - 10 - 27)),
            user.id,
            &conn,
        )
        .expect("could not create test transaction");
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let update = TransactionUpdate {
            amount: Some(3.21),
            description: Some("foo".to_owned()),
            date: Some(date!(2025 - 10 - 28)),
            ..Default::default()
        };

        let got = edit_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            ApiPath(transaction.id),
            ApiJson(update),
        )
        .await
        .expect("could not update transaction")
        .0;

        assert_eq!(got.amount, 3.21);
        assert_eq!(got.description.as_deref(), Some("foo"));
        assert_eq!(got.date, date!(2025 - 10 - 28));
        let stored = get_transaction(
            transaction.id,
            user.id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(stored, got);
    }

    #[tokio::test]
    async fn cannot_update_transaction_of_other_user() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let other_user = create_test_user("bar@baz.qux", &conn);
        let category = create_test_category(user.id, "Rent", TransactionType::Expense, &conn);
        let transaction = create_transaction(
            Transaction::build(1.23, TransactionType::Expense, category.id),
            user.id,
            &conn,
        )
        .unwrap();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let result = edit_transaction_endpoint(
            State(state),
            Extension(other_user.id),
            ApiPath(transaction.id),
            ApiJson(TransactionUpdate {
                amount: Some(99.0),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
