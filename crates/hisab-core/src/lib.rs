//! # hisab-core: Pure Business Logic for Hisab POS
//!
//! This crate is the **heart** of Hisab POS. It holds the domain types and
//! the business rules of a karyana-store counter as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hisab POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Callers                                     │   │
//! │  │    Counter UI ──► Checkout ──► Reports ──► Seed tool           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    hisab-db (Store Layer)                       │   │
//! │  │     SQLite pool, migrations, repositories, checkout txn         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hisab-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌─────────┐ ┌────────┐ ┌───────────┐            │   │
//! │  │   │  types   │ │  money  │ │  cart  │ │ valuation │            │   │
//! │  │   │ Item     │ │  Money  │ │  Cart  │ │ BatchQueues│           │   │
//! │  │   │ Movement │ │  paisa  │ │  lines │ │ FIFO/LIFO │            │   │
//! │  │   └──────────┘ └─────────┘ └────────┘ └───────────┘            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, StockMovement, Bill, Customer, etc.)
//! - [`money`] - Money type with integer paisa arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`cart`] - The in-progress sale at the counter
//! - [`valuation`] - Batch cost queues and full-history valuation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same ledger in, same valuation out, every time
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are paisa (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use hisab_core::money::Money;
//! use hisab_core::types::StockMovement;
//! use hisab_core::valuation::{BatchQueues, CostMethod};
//!
//! // Two deliveries of rice at different costs, then a sale of 12 units
//! let mut queues = BatchQueues::new(CostMethod::Fifo);
//! queues.apply(&StockMovement::stock_in("rice", 10, Money::from_paisa(500), "owner", Utc::now()));
//! queues.apply(&StockMovement::stock_in("rice", 10, Money::from_paisa(700), "owner", Utc::now()));
//! queues.apply(&StockMovement::stock_out("rice", 12, Money::from_paisa(900), "owner", Utc::now()));
//!
//! // FIFO eats the 500-paisa batch first: 8 units @ 700 remain
//! assert_eq!(queues.stock_of("rice"), 8);
//! assert_eq!(queues.value_of("rice"), 5600);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;
pub mod valuation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use hisab_core::Money` instead of
// `use hisab_core::money::Money`

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
pub use valuation::{value_items, Batch, BatchQueues, CostMethod, ItemValuation, Valuation};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps a single bill printable on a
/// thermal receipt.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in the cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
