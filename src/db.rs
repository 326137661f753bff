/*! Sets up the application's SQLite database. */

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, category::create_category_table, profile::create_profile_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create the tables for all of the domain models if they do not exist yet.
///
/// Foreign key enforcement is switched on for `connection`, so deleting a user
/// also deletes their profile, categories and transactions.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();

        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn deleting_user_cascades() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO user (id, email, name, password) VALUES (1, 'a@b.c', 'A', 'x')",
            (),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO category (user_id, name, kind, color, icon)
             VALUES (1, 'Rent', 'EXPENSE', '#000000', 'home')",
            (),
        )
        .unwrap();

        conn.execute("DELETE FROM user WHERE id = 1", ()).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
