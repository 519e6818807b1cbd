//! # Seed Data Generator
//!
//! Populates a database with the demo catalog, coupons and sample orders.
//!
//! ## Usage
//! ```bash
//! # Seed the default database (TILL_DB_PATH or the platform data dir)
//! cargo run -p till-db --bin seed
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//!
//! # Overwrite catalog and categories with the defaults
//! cargo run -p till-db --bin seed -- --reset
//! ```
//!
//! ## What Gets Seeded
//! - Default products and categories (only where none are stored)
//! - Demo coupons (WELCOME10, SAVE5, VIP20) and bulk rules
//! - 14 days of sample orders (only into an empty order log)

use std::env;
use std::path::PathBuf;

use till_db::{Database, StoreConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till=trace` - Show trace for till crates only
/// - Default: INFO, with debug for till crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = StoreConfig::from_env();
    let mut reset = false;
    let mut with_orders = true;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--reset" => reset = true,
            "--no-orders" => with_orders = false,
            "--help" | "-h" => {
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $TILL_DB_PATH or data dir)");
                println!("      --reset        Overwrite products and categories with the defaults");
                println!("      --no-orders    Skip sample order generation");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    println!("🌱 Till POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config.db_config()?).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let catalog = db.catalog();
    if reset {
        catalog.reset_products().await?;
        catalog.reset_categories().await?;
        println!("✓ Catalog reset to defaults");
    } else {
        catalog.initialize().await?;
        println!("✓ Catalog initialized");
    }
    db.discounts().initialize().await?;
    println!("✓ Coupons and bulk rules initialized");

    if with_orders {
        let seeded = db.orders().seed_sample_orders(config.tax_rate).await?;
        if seeded == 0 {
            println!("⚠ Order log already has data, sample orders skipped");
        } else {
            println!("✓ Generated {} sample orders", seeded);
        }
    }

    let summary = db.orders().sales_summary().await?;
    let products = catalog.list_products().await?;
    info!(products = products.len(), "Seed complete");

    println!();
    println!("Products:        {}", products.len());
    println!("Month revenue:   {}", config.format_currency(summary.month_revenue));
    println!("Average order:   {}", config.format_currency(summary.average_order_value));
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
