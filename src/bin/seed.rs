use std::error::Error;

use clap::Parser;
use rusqlite::Connection;

use pocketbook_rs::{
    PasswordHash, ValidatedPassword, create_account, get_user_by_email, initialize_db, parse_email,
    seed_default_categories,
};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_NAME: &str = "Admin";

/// A utility for seeding a database with an admin user and the default categories.
///
/// Running it again leaves an existing admin user untouched, apart from
/// restoring any missing default categories.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database, created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// The password for the admin user.
    #[arg(long, default_value = "123456")]
    password: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("Seeding database at {:#?}", args.db_path);
    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    match get_user_by_email(ADMIN_EMAIL, &conn) {
        Ok(user) => {
            println!("User {ADMIN_EMAIL} already exists, restoring default categories...");
            seed_default_categories(user.id, &conn)?;
        }
        Err(pocketbook_rs::Error::NotFound) => {
            println!("Creating user {ADMIN_EMAIL}...");
            let password_hash = PasswordHash::new(
                ValidatedPassword::new_unchecked(&args.password),
                PasswordHash::DEFAULT_COST,
            )?;
            create_account(&parse_email(ADMIN_EMAIL)?, ADMIN_NAME, password_hash, &conn)?;
        }
        Err(error) => return Err(error.into()),
    }

    println!("Success!");

    Ok(())
}
