//! # Domain Types
//!
//! Core domain types used throughout Hisab POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌───────────────┐   ┌────────────────┐   ┌────────────────┐        │
//! │  │     Item      │   │ StockMovement  │   │     Bill       │        │
//! │  │ ───────────── │   │ ────────────── │   │ ─────────────  │        │
//! │  │ id (UUID)     │   │ id (UUID)      │   │ id (UUID)      │        │
//! │  │ name          │   │ item_id (FK)   │   │ bill_number    │        │
//! │  │ price_paisa   │   │ kind, quantity │   │ bill_type      │        │
//! │  │ current_stock │   │ unit cost      │   │ totals         │        │
//! │  └───────────────┘   └────────────────┘   └────────────────┘        │
//! │                                                                     │
//! │  ┌───────────────┐   ┌────────────────┐   ┌────────────────┐        │
//! │  │   Customer    │   │    Vendor      │   │    Expense     │        │
//! │  │ udhaar ledger │   │ payable ledger │   │ daily outgoing │        │
//! │  └───────────────┘   └────────────────┘   └────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Ledgers, Two Disciplines
//! - `StockMovement` rows are append-only and totally ordered; valuation
//!   replays them from the beginning every time.
//! - Customer/vendor balances are running counters, adjusted by delta
//!   updates; they are never derived from the stock ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A stocked product.
///
/// ## The `current_stock` caveat
/// `current_stock` is a denormalized running total kept for the sales
/// floor (cart checks, list screens). It can drift from batch-level cost
/// history, so valuation recomputes stock from the movement ledger and
/// never reads this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the floor and on bills.
    pub name: String,

    /// Optional category reference.
    pub category_id: Option<String>,

    /// Sale price in paisa.
    pub unit_price_paisa: i64,

    /// Cached stock counter. Not authoritative for valuation.
    pub current_stock: i64,

    /// Archived items are hidden from sale and excluded from valuation.
    /// Items are never hard-deleted; bill history references them.
    pub is_archived: bool,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the sale price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paisa(self.unit_price_paisa)
    }

    /// Soft stock check used by the cart: does the cached counter cover
    /// `quantity`? Not transactional; checkout re-validates.
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }
}

/// An item category. Pure catalog bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock received (purchase, return to shelf). Opens a cost batch.
    StockIn,
    /// Stock leaving (sale, wastage). Consumes cost batches.
    StockOut,
}

/// One immutable entry in the stock ledger.
///
/// ## Invariants
/// - Append-only: once written, never mutated. Corrections are new
///   entries, not edits.
/// - Totally ordered by `occurred_at` per item (insertion order breaks
///   ties).
/// - `quantity` is a positive magnitude; `kind` carries the direction.
///   [`StockMovement::signed_quantity`] exposes the ±delta view.
///
/// This is the system of record for valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,

    /// Item this movement belongs to.
    pub item_id: String,

    /// Positive magnitude of the movement.
    pub quantity: i64,

    /// Direction of the movement.
    pub kind: MovementKind,

    /// Unit cost for stock_in, sale price for stock_out, in paisa,
    /// frozen at the time of the movement.
    pub unit_price_paisa: i64,

    /// Who recorded the movement (operator id).
    pub recorded_by: String,

    /// When the movement happened.
    pub occurred_at: DateTime<Utc>,
}

impl StockMovement {
    /// Creates a stock_in entry (purchase / restock).
    pub fn stock_in(
        item_id: impl Into<String>,
        quantity: i64,
        unit_cost: Money,
        recorded_by: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.into(),
            quantity,
            kind: MovementKind::StockIn,
            unit_price_paisa: unit_cost.paisa(),
            recorded_by: recorded_by.into(),
            occurred_at,
        }
    }

    /// Creates a stock_out entry (sale / wastage).
    pub fn stock_out(
        item_id: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        recorded_by: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.into(),
            quantity,
            kind: MovementKind::StockOut,
            unit_price_paisa: unit_price.paisa(),
            recorded_by: recorded_by.into(),
            occurred_at,
        }
    }

    /// The signed delta this entry applies to stock: +quantity for
    /// stock_in, −quantity for stock_out.
    #[inline]
    pub fn signed_quantity(&self) -> i64 {
        match self.kind {
            MovementKind::StockIn => self.quantity,
            MovementKind::StockOut => -self.quantity,
        }
    }

    /// Returns the unit price/cost as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paisa(self.unit_price_paisa)
    }
}

// =============================================================================
// Party Ledgers
// =============================================================================

/// A customer with a running udhaar (credit) balance.
///
/// ## Balance discipline
/// `outstanding_paisa` rises with credit-sale charges and falls with
/// recorded payments. It is its own append-and-update ledger, separate
/// from the stock ledger, and is never recomputed from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    /// What the customer currently owes, in paisa.
    pub outstanding_paisa: i64,
    /// Lifetime purchases, in paisa.
    pub total_purchases_paisa: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn outstanding(&self) -> Money {
        Money::from_paisa(self.outstanding_paisa)
    }

    /// True when the customer owes anything.
    #[inline]
    pub fn has_dues(&self) -> bool {
        self.outstanding_paisa > 0
    }
}

/// A supplier with a running payable balance. Mirrors the customer
/// ledger on the purchasing side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    /// What the shop currently owes this vendor, in paisa.
    pub payable_paisa: i64,
    /// Lifetime supplies received, in paisa.
    pub total_supplied_paisa: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recorded shop expense (rent, electricity, chai).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount_paisa: i64,
    /// Business date the expense belongs to.
    pub incurred_on: DateTime<Utc>,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Billing
// =============================================================================

/// Kind of bill produced at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    /// A real sale: moves stock, may charge a customer.
    Regular,
    /// A what-if bill: computed and saved, but touches no stock, no
    /// ledger, no balance. First-class mode, not an error path.
    Quotation,
}

impl BillType {
    /// True for quotation (dummy) bills.
    #[inline]
    pub const fn is_quotation(&self) -> bool {
        matches!(self, BillType::Quotation)
    }
}

/// How a regular bill is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paid at the counter.
    Cash,
    /// Udhaar: charged to the customer's outstanding balance.
    Credit,
}

/// A persisted POS bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: String,
    pub bill_number: String,
    pub bill_type: BillType,
    pub customer_id: Option<String>,
    pub subtotal_paisa: i64,
    pub discount_paisa: i64,
    pub total_paisa: i64,
    pub tendered_paisa: i64,
    pub change_paisa: i64,
    pub payment_method: PaymentMethod,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Returns the bill total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paisa(self.total_paisa)
    }

    /// True when this bill charged a customer balance.
    #[inline]
    pub fn is_credit(&self) -> bool {
        self.payment_method == PaymentMethod::Credit && !self.bill_type.is_quotation()
    }
}

/// A line item on a bill.
/// Uses the snapshot pattern to freeze item data at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillLine {
    pub id: String,
    pub bill_id: String,
    pub item_id: String,
    /// Item name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in paisa at time of sale (frozen).
    pub unit_price_paisa: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_paisa: i64,
}

impl BillLine {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paisa(self.line_total_paisa)
    }
}

// =============================================================================
// Application Context
// =============================================================================

/// Identity context passed explicitly to components that record an actor.
///
/// ## Why a value and not a global?
/// Checkout and seeding both need "who is doing this"; passing the
/// profile as a plain value keeps those paths testable and avoids a
/// module-level singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Operator id recorded on ledger entries and bills.
    pub user_id: String,
    /// Operator display name.
    pub user_name: String,
    /// Shop name for receipts and reports.
    pub store_name: String,
}

impl Profile {
    /// Creates a profile context.
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        store_name: impl Into<String>,
    ) -> Self {
        Profile {
            user_id: user_id.into(),
            user_name: user_name.into(),
            store_name: store_name.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_quantity() {
        let now = Utc::now();
        let inflow = StockMovement::stock_in("item-1", 10, Money::from_paisa(500), "u1", now);
        let outflow = StockMovement::stock_out("item-1", 4, Money::from_paisa(900), "u1", now);

        assert_eq!(inflow.signed_quantity(), 10);
        assert_eq!(outflow.signed_quantity(), -4);
        assert_eq!(inflow.kind, MovementKind::StockIn);
        assert_eq!(outflow.kind, MovementKind::StockOut);
    }

    #[test]
    fn test_item_has_stock() {
        let now = Utc::now();
        let item = Item {
            id: "i1".to_string(),
            name: "Sugar 1kg".to_string(),
            category_id: None,
            unit_price_paisa: 15000,
            current_stock: 5,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        assert!(item.has_stock(5));
        assert!(!item.has_stock(6));
    }

    #[test]
    fn test_bill_type_quotation() {
        assert!(BillType::Quotation.is_quotation());
        assert!(!BillType::Regular.is_quotation());
    }

    #[test]
    fn test_enum_spellings_match_storage() {
        // These spellings are the same strings the database CHECK
        // constraints accept; renaming a variant breaks stored rows.
        assert_eq!(
            serde_json::to_string(&MovementKind::StockIn).unwrap(),
            "\"stock_in\""
        );
        assert_eq!(
            serde_json::to_string(&MovementKind::StockOut).unwrap(),
            "\"stock_out\""
        );
        assert_eq!(
            serde_json::to_string(&BillType::Regular).unwrap(),
            "\"regular\""
        );
        assert_eq!(
            serde_json::to_string(&BillType::Quotation).unwrap(),
            "\"quotation\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cash).unwrap(),
            "\"cash\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Credit).unwrap(),
            "\"credit\""
        );
    }

    #[test]
    fn test_customer_dues() {
        let now = Utc::now();
        let customer = Customer {
            id: "c1".to_string(),
            name: "Bashir sahab".to_string(),
            phone: None,
            outstanding_paisa: 25000,
            total_purchases_paisa: 90000,
            created_at: now,
            updated_at: now,
        };

        assert!(customer.has_dues());
        assert_eq!(customer.outstanding(), Money::from_paisa(25000));
    }
}
