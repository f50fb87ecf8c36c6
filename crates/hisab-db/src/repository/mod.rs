//! # Repository Module
//!
//! Database repository implementations for Hisab POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  store.items().list_active()                                   │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── list_active(&self)                                                │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, item)                                               │
//! │  └── archive(&self, id)                                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Multi-table flows (checkout) get a coordinator of their own         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Item catalog CRUD and search
//! - [`category::CategoryRepository`] - Category bookkeeping
//! - [`ledger::LedgerRepository`] - Append-only stock movement ledger
//! - [`customer::CustomerRepository`] - Customer udhaar ledger
//! - [`vendor::VendorRepository`] - Vendor payable ledger
//! - [`expense::ExpenseRepository`] - Shop expenses
//! - [`bill::BillRepository`] - Bills and bill lines
//! - [`checkout::Checkout`] - The atomic checkout transaction
//! - [`report::Reports`] - Valuation and day-book reports

pub mod bill;
pub mod category;
pub mod checkout;
pub mod customer;
pub mod expense;
pub mod item;
pub mod ledger;
pub mod report;
pub mod vendor;
