//! Pure aggregation over transactions for the dashboard and the category report.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{TransactionType, database_id::CategoryId, transaction::Transaction};

/// The money that came in and went out over a set of transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// The sum of all income.
    pub income: f64,
    /// The sum of all expenses.
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// The summed amount of the transactions in a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The ID of the category.
    pub category_id: CategoryId,
    /// The name of the category.
    pub name: String,
    /// The sum of the transaction amounts.
    pub total: f64,
    /// The number of transactions in the category.
    pub count: usize,
}

/// Sum the income and expenses of `transactions` in a single pass.
pub fn summarise(transactions: &[Transaction]) -> Totals {
    let (income, expenses) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expenses), transaction| {
                match transaction.kind {
                    TransactionType::Income => (income + transaction.amount, expenses),
                    TransactionType::Expense => (income, expenses + transaction.amount),
                }
            });

    Totals {
        income,
        expenses,
        balance: income - expenses,
    }
}

/// Group `transactions` by category.
///
/// The result is sorted by total, largest first. Ties are broken by category name.
pub fn totals_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<CategoryId, CategoryTotal> = HashMap::new();

    for transaction in transactions {
        let entry = totals
            .entry(transaction.category.id)
            .or_insert_with(|| CategoryTotal {
                category_id: transaction.category.id,
                name: transaction.category.name.clone(),
                total: 0.0,
                count: 0,
            });
        entry.total += transaction.amount;
        entry.count += 1;
    }

    let mut totals: Vec<CategoryTotal> = totals.into_values().collect();
    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
    });

    totals
}
