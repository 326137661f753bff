//! Defines the endpoint for listing the caller's transactions.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use crate::{
    Error, UserID,
    extract::ApiQuery,
    transaction::{Transaction, TransactionState, core::get_transactions},
};

/// The number of transactions listed when the client does not ask for a number.
pub const DEFAULT_LIMIT: u32 = 10;
/// The most transactions that can be listed at once.
pub const MAX_LIMIT: u32 = 1000;

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// The maximum number of transactions to return.
    pub limit: Option<i64>,
}

impl ListQuery {
    /// The requested limit, clamped to `1..=MAX_LIMIT`.
    fn limit(&self) -> u32 {
        match self.limit {
            None => DEFAULT_LIMIT,
            Some(limit) => limit.clamp(1, MAX_LIMIT as i64) as u32,
        }
    }
}

/// A route handler for listing the caller's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions(user_id, query.limit(), &connection).map(Json)
}
