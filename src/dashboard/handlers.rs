//! Route handlers for the dashboard summary and the category report.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    AppState, Error, TransactionType, UserID,
    dashboard::aggregation::{CategoryTotal, Totals, summarise, totals_by_category},
    extract::ApiQuery,
    transaction::{Transaction, get_transactions_since},
};

/// The number of transactions shown in the dashboard's recent list.
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// The state needed for the dashboard and reports.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of the dashboard response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Income, expenses and balance over all of the user's transactions.
    #[serde(flatten)]
    pub totals: Totals,
    /// How many transactions the user has recorded.
    pub transaction_count: usize,
    /// The newest transactions.
    pub recent_transactions: Vec<Transaction>,
}

/// How far back the category report looks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportRange {
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
    /// The last 365 days.
    Year,
    /// Every transaction.
    #[default]
    All,
}

impl ReportRange {
    /// The earliest date included in the range, counting `today` as the last day.
    ///
    /// Returns `None` for [ReportRange::All].
    pub fn start_date(self, today: Date) -> Option<Date> {
        let days = match self {
            ReportRange::Week => 7,
            ReportRange::Month => 30,
            ReportRange::Year => 365,
            ReportRange::All => return None,
        };

        today.checked_sub(Duration::days(days - 1))
    }
}

/// The query parameters of the category report.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportQuery {
    /// Only include transactions of this type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// How far back to look.
    #[serde(default)]
    pub range: ReportRange,
}

/// The body of the category report response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    /// The transaction type the report was filtered by, if any.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The range the report covers.
    pub range: ReportRange,
    /// The sum over every category.
    pub total: f64,
    /// The totals per category, largest first.
    pub categories: Vec<CategoryTotal>,
}

/// A route handler for the user's income, expenses, balance and newest transactions.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Dashboard>, Error> {
    let mut transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_since(user_id, None, &connection)?
    };

    let totals = summarise(&transactions);
    let transaction_count = transactions.len();
    transactions.truncate(RECENT_TRANSACTION_COUNT);

    Ok(Json(Dashboard {
        totals,
        transaction_count,
        recent_transactions: transactions,
    }))
}

/// A route handler for the per-category totals of the user's transactions.
pub async fn get_category_report(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Json<CategoryReport>, Error> {
    let since = query.range.start_date(OffsetDateTime::now_utc().date());

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_since(user_id, since, &connection)?
    };

    let transactions: Vec<Transaction> = match query.kind {
        Some(kind) => transactions
            .into_iter()
            .filter(|transaction| transaction.kind == kind)
            .collect(),
        None => transactions,
    };

    let categories = totals_by_category(&transactions);
    let total = categories.iter().map(|category| category.total).sum();

    Ok(Json(CategoryReport {
        kind: query.kind,
        range: query.range,
        total,
        categories,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rstest::rstest;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        TransactionType,
        category::Category,
        dashboard::handlers::{
            DashboardState, RECENT_TRANSACTION_COUNT, ReportQuery, ReportRange,
            get_category_report, get_dashboard,
        },
        extract::ApiQuery,
        test_utils::{create_test_category, create_test_user, get_test_connection},
        transaction::{Transaction, create_transaction},
        user::User,
    };

    struct Fixture {
        state: DashboardState,
        user: User,
        rent: Category,
        food: Category,
        salary: Category,
    }

    fn setup() -> Fixture {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let rent = create_test_category(user.id, "Rent", TransactionType::Expense, &conn);
        let food = create_test_category(user.id, "Food", TransactionType::Expense, &conn);
        let salary = create_test_category(user.id, "Salary", TransactionType::Income, &conn);

        Fixture {
            state: DashboardState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user,
            rent,
            food,
            salary,
        }
    }

    fn insert(
        fixture: &Fixture,
        amount: f64,
        kind: TransactionType,
        category: &Category,
        days_ago: i64,
    ) {
        let date = OffsetDateTime::now_utc().date() - Duration::days(days_ago);
        let connection = fixture.state.db_connection.lock().unwrap();
        create_transaction(
            Transaction::build(amount, kind, category.id).date(date),
            fixture.user.id,
            &connection,
        )
        .unwrap();
    }

    #[rstest]
    #[case::week(ReportRange::Week, date!(2025 - 03 - 04))]
    #[case::month(ReportRange::Month, date!(2025 - 02 - 09))]
    #[case::year(ReportRange::Year, date!(2024 - 03 - 11))]
    fn range_start_includes_today(#[case] range: ReportRange, #[case] want: time::Date) {
        assert_eq!(range.start_date(date!(2025 - 03 - 10)), Some(want));
    }

    #[test]
    fn all_range_has_no_start() {
        assert_eq!(ReportRange::All.start_date(date!(2025 - 03 - 10)), None);
    }

    #[tokio::test]
    async fn dashboard_is_empty_for_new_user() {
        let fixture = setup();

        let dashboard = get_dashboard(State(fixture.state.clone()), Extension(fixture.user.id))
            .await
            .unwrap()
            .0;

        assert_eq!(dashboard.totals.income, 0.0);
        assert_eq!(dashboard.totals.expenses, 0.0);
        assert_eq!(dashboard.totals.balance, 0.0);
        assert_eq!(dashboard.transaction_count, 0);
        assert!(dashboard.recent_transactions.is_empty());
    }

    #[tokio::test]
    async fn dashboard_sums_and_limits_recent_transactions() {
        let fixture = setup();
        insert(&fixture, 3000.0, TransactionType::Income, &fixture.salary, 10);
        for days_ago in 0..6 {
            insert(&fixture, 10.0, TransactionType::Expense, &fixture.food, days_ago);
        }
        insert(&fixture, 1200.0, TransactionType::Expense, &fixture.rent, 20);

        let dashboard = get_dashboard(State(fixture.state.clone()), Extension(fixture.user.id))
            .await
            .unwrap()
            .0;

        assert_eq!(dashboard.totals.income, 3000.0);
        assert_eq!(dashboard.totals.expenses, 1260.0);
        assert_eq!(dashboard.totals.balance, 1740.0);
        assert_eq!(dashboard.transaction_count, 8);
        assert_eq!(dashboard.recent_transactions.len(), RECENT_TRANSACTION_COUNT);
        let today = OffsetDateTime::now_utc().date();
        assert_eq!(dashboard.recent_transactions[0].date, today);
    }

    #[tokio::test]
    async fn dashboard_ignores_other_users() {
        let fixture = setup();
        insert(&fixture, 50.0, TransactionType::Expense, &fixture.food, 0);
        let other_user = {
            let connection = fixture.state.db_connection.lock().unwrap();
            create_test_user("other@bar.baz", &connection)
        };

        let dashboard = get_dashboard(State(fixture.state.clone()), Extension(other_user.id))
            .await
            .unwrap()
            .0;

        assert_eq!(dashboard.transaction_count, 0);
    }

    #[tokio::test]
    async fn report_filters_by_type_and_range() {
        let fixture = setup();
        insert(&fixture, 3000.0, TransactionType::Income, &fixture.salary, 1);
        insert(&fixture, 40.0, TransactionType::Expense, &fixture.food, 2);
        insert(&fixture, 60.0, TransactionType::Expense, &fixture.food, 6);
        insert(&fixture, 1200.0, TransactionType::Expense, &fixture.rent, 7);

        let report = get_category_report(
            State(fixture.state.clone()),
            Extension(fixture.user.id),
            ApiQuery(ReportQuery {
                kind: Some(TransactionType::Expense),
                range: ReportRange::Week,
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(report.total, 100.0);
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].category_id, fixture.food.id);
        assert_eq!(report.categories[0].count, 2);
    }

    #[tokio::test]
    async fn report_defaults_to_all_time_and_types() {
        let fixture = setup();
        insert(&fixture, 3000.0, TransactionType::Income, &fixture.salary, 400);
        insert(&fixture, 1200.0, TransactionType::Expense, &fixture.rent, 0);

        let report = get_category_report(
            State(fixture.state.clone()),
            Extension(fixture.user.id),
            ApiQuery(ReportQuery::default()),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(report.range, ReportRange::All);
        assert_eq!(report.kind, None);
        let names: Vec<&str> = report
            .categories
            .iter()
            .map(|category| category.name.as_str())
            .collect();
        assert_eq!(names, vec!["Salary", "Rent"]);
    }
}
