use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;

use spending_tracker::{
    NewUser, PasswordHash, SQLiteExpenseStore, ValidatedPassword, create_user, initialize_db,
    scan_expenses,
};

/// A receipt with nested line items, as read from a QR code.
const SAMPLE_RECEIPT: &str = r#"{
    "store": "Corner Shop",
    "date": "2025-01-15",
    "sections": {
        "dairy": [{"name": "Milk", "price": 2.5, "quantity": 2}],
        "bakery": [{"name": "Bread", "price": 3.2}]
    }
}"#;

/// A utility for creating a test database for the REST API server of the spending tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The email of the test user.
    #[arg(long, short, default_value = "test@example.com")]
    email: String,

    /// The password of the test user.
    #[arg(long, short, default_value = "roostersgocockledoodledoo")]
    password: String,
}

/// Create and populate a database for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {}...", args.email);

    let password = ValidatedPassword::new(&args.password, &[args.email.as_str()])?;
    let user = create_user(
        NewUser {
            full_name: "Test User".to_owned(),
            email: EmailAddress::from_str(&args.email)?,
            password_hash: PasswordHash::new(password, PasswordHash::DEFAULT_COST)?,
            monthly_budget: 1000.0,
            preferred_currency: "USD".to_owned(),
            notification_pref: false,
        },
        &conn,
    )?;

    println!("Adding expenses from a sample receipt...");

    let store = SQLiteExpenseStore::new(Arc::new(Mutex::new(conn)));
    let expenses = scan_expenses(&store, &user.id.to_string(), SAMPLE_RECEIPT).await?;

    println!("Success! Created user {} with {} expenses.", user.id, expenses.len());

    Ok(())
}
