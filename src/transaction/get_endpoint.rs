use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    extract::ApiPath,
    transaction::{Transaction, TransactionState, core::get_transaction},
};

/// A route handler for fetching one of the caller's transactions.
///
/// Transactions owned by other users are reported as not found.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}
