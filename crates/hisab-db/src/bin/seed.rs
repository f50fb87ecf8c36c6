//! # Seed Data Generator
//!
//! Populates a development store with a typical karyana shop: catalog,
//! opening stock history, customers with udhaar, vendors, expenses.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p hisab-db --bin seed
//!
//! # Cap the number of items
//! cargo run -p hisab-db --bin seed -- --items 24
//!
//! # Specify database path
//! cargo run -p hisab-db --bin seed -- --db ./data/hisab.db
//! ```
//!
//! ## What Gets Seeded
//! - Categories and items with shelf prices in paisa
//! - Two opening stock_in batches per item at different unit costs, so
//!   a FIFO and a LIFO valuation of the same store disagree
//! - A few stock_out entries (pre-history sales and wastage)
//! - Customers, some carrying udhaar from the paper register
//! - Vendors with payables, and a week of expenses

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use hisab_core::{Category, CostMethod, Customer, Expense, Item, Money, Profile, Vendor};
use hisab_db::{Store, StoreConfig};

/// Catalog: (category, items as (name, shelf price in paisa)).
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Atta & Rice",
        &[
            ("Basmati Rice 5kg", 165000),
            ("Sella Rice 5kg", 145000),
            ("Fine Atta 10kg", 128000),
            ("Chakki Atta 5kg", 72000),
            ("Daal Chana 1kg", 48000),
            ("Daal Masoor 1kg", 52000),
        ],
    ),
    (
        "Chai & Beverages",
        &[
            ("Tapal Danedar 190g", 60000),
            ("Lipton Yellow Label 190g", 62000),
            ("Sufaid Chini 1kg", 16500),
            ("Gur 1kg", 22000),
            ("Rooh Afza 800ml", 45000),
        ],
    ),
    (
        "Ghee & Oil",
        &[
            ("Dalda Ghee 1kg", 58000),
            ("Sunflower Oil 1L", 52000),
            ("Desi Ghee 500g", 95000),
        ],
    ),
    (
        "Masala",
        &[
            ("National Haldi 200g", 18000),
            ("Lal Mirch 200g", 21000),
            ("Garam Masala 100g", 15000),
            ("Namak 800g", 6000),
        ],
    ),
    (
        "Soap & Cleaning",
        &[
            ("Lifebuoy Soap", 9000),
            ("Surf Excel 1kg", 38000),
            ("Vim Bar", 6500),
            ("Dettol 250ml", 28000),
        ],
    ),
    (
        "Biscuits & Sweets",
        &[
            ("Sooper Biscuit Family Pack", 12000),
            ("Prince Biscuit", 5000),
            ("Candyland Toffee Jar", 25000),
        ],
    ),
];

/// Customers, with carried-over udhaar in paisa (0 = clean slate).
const CUSTOMERS: &[(&str, &str, i64)] = &[
    ("Ahmed Bhai", "0300-1234567", 185000),
    ("Rashid Sahab", "0321-7654321", 92000),
    ("Bilal", "0333-1112223", 0),
    ("Khala Nasreen", "0345-9988776", 47500),
    ("Usman", "0301-5556667", 0),
];

/// Vendors with opening payables in paisa.
const VENDORS: &[(&str, &str, i64)] = &[
    ("Karachi Wholesale Traders", "021-34567890", 2250000),
    ("Punjab Flour Mills", "042-35678901", 860000),
    ("Metro Cash & Carry", "021-34998877", 0),
];

/// A week of expenses: (description, paisa, days ago).
const EXPENSES: &[(&str, i64, i64)] = &[
    ("Shop rent", 2500000, 6),
    ("Electricity bill", 845000, 5),
    ("Counter chai and biscuits", 32000, 3),
    ("Delivery rickshaw", 60000, 2),
    ("Shop cleaning", 50000, 1),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut max_items: usize = usize::MAX;
    let mut db_path = String::from("./hisab_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--items" | "-n" => {
                if i + 1 < args.len() {
                    max_items = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Hisab POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --items <N>    Cap the number of items (default: whole catalog)");
                println!("  -d, --db <PATH>    Database file path (default: ./hisab_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Hisab POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let store = Store::open(StoreConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Re-running seed against a stocked store would double the ledger
    let existing = store.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicate history.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let profile = Profile::new("seed", "Seed Tool", "Hisab Demo Store");
    let start = std::time::Instant::now();
    let now = Utc::now();

    // Catalog
    println!();
    println!("Seeding catalog...");

    let mut item_ids: Vec<(String, i64)> = Vec::new();

    'catalog: for (category_name, items) in CATALOG {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: category_name.to_string(),
            created_at: now,
        };
        store.categories().insert(&category).await?;

        for (name, price_paisa) in *items {
            if item_ids.len() >= max_items {
                break 'catalog;
            }

            let item = Item {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                category_id: Some(category.id.clone()),
                unit_price_paisa: *price_paisa,
                current_stock: 0,
                is_archived: false,
                created_at: now,
                updated_at: now,
            };
            store.items().insert(&item).await?;
            item_ids.push((item.id, *price_paisa));
        }
    }

    println!("  {} items across {} categories", item_ids.len(), CATALOG.len());

    // Opening stock: two deliveries per item at different unit costs,
    // then a sprinkling of outflows so replay has layers to consume.
    println!("Seeding opening stock history...");

    let ledger = store.ledger();
    let mut movements = 0;

    for (idx, (item_id, price_paisa)) in item_ids.iter().enumerate() {
        let first_qty = 10 + (idx as i64 * 7) % 15;
        let second_qty = 8 + (idx as i64 * 11) % 12;

        // Costs climb between deliveries; that gap is what makes the
        // valuation method matter.
        let first_cost = Money::from_paisa(price_paisa * 70 / 100);
        let second_cost = Money::from_paisa(price_paisa * 80 / 100);

        ledger
            .record_stock_in(item_id, first_qty, first_cost, &profile)
            .await?;
        ledger
            .record_stock_in(item_id, second_qty, second_cost, &profile)
            .await?;
        movements += 2;

        if idx % 3 == 0 {
            let sold = 1 + (idx as i64 * 5) % first_qty.max(2);
            ledger
                .record_stock_out(item_id, sold, Money::from_paisa(*price_paisa), &profile)
                .await?;
            movements += 1;
        }
    }

    println!("  {} ledger entries", movements);

    // Customers
    println!("Seeding customers...");

    let customers = store.customers();
    for (name, phone, udhaar_paisa) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: Some(phone.to_string()),
            outstanding_paisa: 0,
            total_purchases_paisa: 0,
            created_at: now,
            updated_at: now,
        };
        customers.insert(&customer).await?;

        if *udhaar_paisa > 0 {
            customers
                .record_charge(&customer.id, Money::from_paisa(*udhaar_paisa))
                .await?;
        }
    }

    println!("  {} customers", CUSTOMERS.len());

    // Vendors
    println!("Seeding vendors...");

    let vendors = store.vendors();
    for (name, phone, payable_paisa) in VENDORS {
        let vendor = Vendor {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: Some(phone.to_string()),
            payable_paisa: 0,
            total_supplied_paisa: 0,
            created_at: now,
            updated_at: now,
        };
        vendors.insert(&vendor).await?;

        if *payable_paisa > 0 {
            vendors
                .record_supply(&vendor.id, Money::from_paisa(*payable_paisa))
                .await?;
        }
    }

    println!("  {} vendors", VENDORS.len());

    // Expenses
    println!("Seeding expenses...");

    let expenses = store.expenses();
    for (description, amount_paisa, days_ago) in EXPENSES {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            amount_paisa: *amount_paisa,
            incurred_on: now - Duration::days(*days_ago),
            recorded_by: profile.user_id.clone(),
            created_at: now,
        };
        expenses.insert(&expense).await?;
    }

    println!("  {} expenses", EXPENSES.len());

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seeded in {:?}", elapsed);

    // Verify with a valuation replay
    println!();
    println!("Verifying valuation replay...");
    let fifo = store.reports().valuation(CostMethod::Fifo).await?;
    let lifo = store.reports().valuation(CostMethod::Lifo).await?;
    println!(
        "  FIFO: {} items, {} units, {}",
        fifo.items.len(),
        fifo.total_stock_units,
        fifo.total_value()
    );
    println!(
        "  LIFO: {} items, {} units, {}",
        lifo.items.len(),
        lifo.total_stock_units,
        lifo.total_value()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Initializes logging for the seed run.
///
/// ## Environment
/// - `RUST_LOG=debug` - Show repository-level debug messages
/// - Default: info, with sqlx noise suppressed
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hisab=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
