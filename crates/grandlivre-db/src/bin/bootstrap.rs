//! # Chart-of-Accounts Bootstrap
//!
//! Seeds a tenant's system accounts and expense categories, then prints a
//! JSON summary of what was created.
//!
//! ## Usage
//! ```bash
//! # Default database (GRANDLIVRE_DATABASE_PATH or ./grandlivre.db)
//! cargo run -p grandlivre-db --bin grandlivre-bootstrap -- --tenant acme
//!
//! # Explicit database and actor
//! cargo run -p grandlivre-db --bin grandlivre-bootstrap -- \
//!     --tenant acme --db ./data/ledger.db --actor setup
//! ```
//!
//! Safe to run repeatedly: existing accounts and categories are left as is.

use std::env;
use std::path::PathBuf;

use grandlivre_db::{Database, DbConfig, LedgerSettings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = LedgerSettings::from_env()?;

    let args: Vec<String> = env::args().collect();
    let mut tenant: Option<String> = None;
    let mut actor = String::from("system");
    let mut db_path: PathBuf = settings.database_path.clone();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--actor" | "-a" => {
                if i + 1 < args.len() {
                    actor = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let Some(tenant) = tenant else {
        print_help();
        return Err("--tenant is required".into());
    };

    let config = DbConfig::new(&db_path).max_connections(settings.max_connections);
    let db = Database::new(config).await?;

    info!(path = %db_path.display(), tenant = %tenant, "Bootstrapping chart of accounts");

    let report = db
        .bootstrap(settings.codes.clone())
        .initialize_chart_of_accounts(&tenant, &actor)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    db.close().await;
    Ok(())
}

fn print_help() {
    println!("Grandlivre chart-of-accounts bootstrap");
    println!();
    println!("Usage: grandlivre-bootstrap --tenant <ID> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -t, --tenant <ID>   Tenant to bootstrap (required)");
    println!("  -a, --actor <ID>    Recorded as created_by (default: system)");
    println!("  -d, --db <PATH>     Database file path (default: GRANDLIVRE_DATABASE_PATH or ./grandlivre.db)");
    println!("  -h, --help          Show this help message");
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
