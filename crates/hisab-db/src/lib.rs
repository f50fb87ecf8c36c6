//! # hisab-db: Store Layer for Hisab POS
//!
//! This crate provides database access for the Hisab POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hisab POS Data Flow                              │
//! │                                                                         │
//! │  Caller (counter UI, seed tool, reports)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     hisab-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │     Store     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (item, bill, │    │  (embedded)  │  │   │
//! │  │   │               │    │   ledger, …)  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  Checkout txn │    │ 001_init.sql │  │   │
//! │  │   │ Management    │    │  Reports      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     ./data/hisab.db                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`repository`] - Repository implementations (item, ledger, bill, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hisab_db::{Store, StoreConfig};
//!
//! // Open store with default config
//! let config = StoreConfig::new("path/to/hisab.db");
//! let store = Store::open(config).await?;
//!
//! // Use repositories
//! let items = store.items().list_active().await?;
//! let report = store.reports().valuation(CostMethod::Fifo).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Store, StoreConfig};

// Repository re-exports for convenience
pub use repository::bill::BillRepository;
pub use repository::category::CategoryRepository;
pub use repository::checkout::{Checkout, CheckoutOutcome, CheckoutRequest, Tender};
pub use repository::customer::CustomerRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::item::ItemRepository;
pub use repository::ledger::{LedgerRepository, MovementView};
pub use repository::report::{Reports, SalesSummary};
pub use repository::vendor::VendorRepository;
