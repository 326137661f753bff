//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for the transaction REST endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;

use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub use core::{
    Transaction, TransactionState, TransactionUpdate, create_transaction_table,
    get_transactions_since,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::get_transactions_endpoint;

#[cfg(test)]
pub use core::{
    CategorySummary, create_transaction, delete_transaction, get_transaction, get_transactions,
    update_transaction,
};

#[cfg(test)]
mod iso_date_tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use time::{Date, macros::date};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Dated {
        #[serde(with = "super::iso_date")]
        date: Date,
    }

    #[test]
    fn dates_use_year_month_day() {
        let dated = Dated {
            date: date!(2025 - 03 - 01),
        };

        assert_eq!(serde_json::to_value(&dated).unwrap(), json!({ "date": "2025-03-01" }));
        assert_eq!(
            serde_json::from_value::<Dated>(json!({ "date": "2025-03-01" })).unwrap(),
            dated
        );
    }

    #[test]
    fn rejects_other_date_formats() {
        assert!(serde_json::from_value::<Dated>(json!({ "date": "01/03/2025" })).is_err());
    }
}
