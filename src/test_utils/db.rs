use rusqlite::Connection;

use crate::{
    PasswordHash, TransactionType, UserID,
    category::{Category, NewCategory, create_category},
    db::initialize,
    user::{User, create_user, parse_email},
};

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");

    connection
}

#[track_caller]
pub(crate) fn create_test_user(email: &str, connection: &Connection) -> User {
    create_user(
        &parse_email(email).expect("invalid test email"),
        "Test User",
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("could not create test user")
}

#[track_caller]
pub(crate) fn create_test_category(
    user_id: UserID,
    name: &str,
    kind: TransactionType,
    connection: &Connection,
) -> Category {
    create_category(
        NewCategory::new(name.parse().expect("invalid test category name"), kind),
        user_id,
        connection,
    )
    .expect("could not create test category")
}
