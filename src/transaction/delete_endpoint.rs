use axum::{Extension, extract::State, http::StatusCode};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    extract::ApiPath,
    transaction::{TransactionState, core::delete_transaction},
};

/// A route handler for deleting one of the caller's transactions, responds with 204 No Content.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;
    tracing::debug!("Deleted transaction {transaction_id} for user {user_id}");

    Ok(StatusCode::NO_CONTENT)
}
