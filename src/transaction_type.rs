//! Whether money came in or went out.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// The direction of a transaction, and the kind of transactions a category groups.
///
/// Serialized as `"INCOME"` or `"EXPENSE"`, both over the wire and in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The canonical string for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid transaction type {other:?}").into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::TransactionType;

    #[test]
    fn serializes_as_upper_case() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Income).unwrap(),
            "\"INCOME\""
        );
        assert_eq!(
            serde_json::from_str::<TransactionType>("\"EXPENSE\"").unwrap(),
            TransactionType::Expense
        );
    }

    #[test]
    fn rejects_lower_case() {
        assert!(serde_json::from_str::<TransactionType>("\"income\"").is_err());
    }

    #[test]
    fn round_trips_through_sqlite() {
        let conn = Connection::open_in_memory().unwrap();

        let got: TransactionType = conn
            .query_row("SELECT ?1", [TransactionType::Expense], |row| row.get(0))
            .unwrap();

        assert_eq!(got, TransactionType::Expense);
    }

    #[test]
    fn invalid_database_value_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();

        let result: rusqlite::Result<TransactionType> =
            conn.query_row("SELECT 'TRANSFER'", [], |row| row.get(0));

        assert!(result.is_err());
    }
}
