//! Dashboard module
//!
//! Sums the user's transactions into income, expenses and balance, and groups
//! them by category for reports.

mod aggregation;
mod handlers;

pub use handlers::{get_category_report, get_dashboard};
