//! # Cart Module
//!
//! The in-progress sale being rung up at the counter.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Counter Action           Cart Method              State Change         │
//! │  ──────────────           ───────────              ────────────         │
//! │                                                                         │
//! │  Pick item ──────────────► add_item() ───────────► lines.push(line)    │
//! │                                      (same item merges into one line)   │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ────► lines[i].qty = n    │
//! │                                                                         │
//! │  Remove line ────────────► remove_line() ────────► lines.remove(i)     │
//! │                                                                         │
//! │  New sale ───────────────► clear() ──────────────► lines.clear()       │
//! │                                                                         │
//! │  Settle ─────────────────► totals(discount) ─────► (read only)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Freezing
//! A line snapshots the item's name and price at add time. Later catalog
//! edits do not reprice a cart that is already being rung up; the bill
//! line snapshot is taken from the cart line, not the live item.
//!
//! ## Stock Checks Are Soft Here
//! `add_item` rejects quantities the cached stock counter cannot cover,
//! which is a courtesy check for the counter UI. The authoritative check
//! runs inside the checkout transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Item;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the in-progress sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Item ID (UUID), for the checkout lookup.
    pub item_id: String,

    /// Item name at time of adding (frozen).
    pub name: String,

    /// Price in paisa at time of adding (frozen).
    pub unit_price_paisa: i64,

    /// Quantity on this line.
    pub quantity: i64,

    /// When this line was added.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a cart line from an item, freezing name and price.
    pub fn from_item(item: &Item, quantity: i64) -> Self {
        CartLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price_paisa: item.unit_price_paisa,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity) in paisa.
    #[inline]
    pub fn line_total_paisa(&self) -> i64 {
        self.unit_price_paisa * self.quantity
    }

    /// Line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paisa(self.line_total_paisa())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress sale.
///
/// ## Invariants
/// - Lines are unique by `item_id`; adding the same item merges into the
///   existing line.
/// - Quantities stay in `1..=MAX_LINE_QUANTITY`; setting a quantity to 0
///   removes the line.
/// - At most `MAX_CART_LINES` distinct lines.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Lines in the cart.
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds an item to the cart, merging with an existing line.
    ///
    /// ## Behavior
    /// - Item already in the cart: the quantities merge into one line.
    /// - New item: a fresh line is appended with frozen name and price.
    /// - The merged quantity must clear the soft stock check against the
    ///   item's cached counter.
    pub fn add_item(&mut self, item: &Item, quantity: i64) -> CoreResult<()> {
        crate::validation::validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item.id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            if !item.has_stock(new_qty) {
                return Err(CoreError::InsufficientStock {
                    name: item.name.clone(),
                    available: item.current_stock,
                    requested: new_qty,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        if !item.has_stock(quantity) {
            return Err(CoreError::InsufficientStock {
                name: item.name.clone(),
                available: item.current_stock,
                requested: quantity,
            });
        }

        self.lines.push(CartLine::from_item(item, quantity));
        Ok(())
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - Quantity 0 removes the line.
    /// - Item not in the cart: returns an error.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(item_id);
        }

        if quantity < 0 || quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            line.quantity = quantity;
            Ok(())
        } else {
            Err(CoreError::ItemNotFound(item_id.to_string()))
        }
    }

    /// Removes a line by item ID.
    pub fn remove_line(&mut self, item_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);

        if self.lines.len() == initial_len {
            Err(CoreError::ItemNotFound(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines for the next sale.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Subtotal (before discount) in paisa.
    pub fn subtotal_paisa(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_paisa()).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Computes settle-time totals with a flat discount applied.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] when there is nothing to settle.
    /// - [`CoreError::DiscountExceedsSubtotal`] when the discount would
    ///   push the total negative.
    pub fn totals(&self, discount_paisa: i64) -> CoreResult<CartTotals> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        crate::validation::validate_discount_paisa(discount_paisa)?;

        let subtotal_paisa = self.subtotal_paisa();
        if discount_paisa > subtotal_paisa {
            return Err(CoreError::DiscountExceedsSubtotal {
                discount: discount_paisa,
                subtotal: subtotal_paisa,
            });
        }

        Ok(CartTotals {
            line_count: self.line_count(),
            total_quantity: self.total_quantity(),
            subtotal_paisa,
            discount_paisa,
            total_paisa: subtotal_paisa - discount_paisa,
        })
    }
}

/// Settle-time totals summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_paisa: i64,
    pub discount_paisa: i64,
    pub total_paisa: i64,
}

impl CartTotals {
    /// Grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paisa(self.total_paisa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_item(id: &str, price_paisa: i64, stock: i64) -> Item {
        Item {
            id: id.to_string(),
            name: format!("Item {}", id),
            category_id: None,
            unit_price_paisa: price_paisa,
            current_stock: stock,
            is_archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        let item = test_item("1", 9900, 50); // Rs 99.00

        cart.add_item(&item, 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal_paisa(), 19800); // Rs 198.00
    }

    #[test]
    fn test_cart_add_same_item_merges_line() {
        let mut cart = Cart::new();
        let item = test_item("1", 9900, 50);

        cart.add_item(&item, 2).unwrap();
        cart.add_item(&item, 3).unwrap();

        assert_eq!(cart.line_count(), 1); // Still one line
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_soft_stock_check() {
        let mut cart = Cart::new();
        let item = test_item("1", 9900, 3);

        // 2 fits, merging to 4 does not
        cart.add_item(&item, 2).unwrap();
        let err = cart.add_item(&item, 2).unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(cart.total_quantity(), 2); // Unchanged
    }

    #[test]
    fn test_cart_price_frozen_at_add_time() {
        let mut cart = Cart::new();
        let mut item = test_item("1", 9900, 50);

        cart.add_item(&item, 1).unwrap();

        // Catalog edit after the fact does not reprice the cart
        item.unit_price_paisa = 12000;
        assert_eq!(cart.subtotal_paisa(), 9900);
    }

    #[test]
    fn test_cart_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        let item = test_item("1", 9900, 50);

        cart.add_item(&item, 2).unwrap();
        cart.update_quantity("1", 0).unwrap();

        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_remove_missing_line() {
        let mut cart = Cart::new();
        let err = cart.remove_line("nope").unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(_)));
    }

    #[test]
    fn test_cart_totals_with_discount() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", 5000, 50), 2).unwrap(); // 10000
        cart.add_item(&test_item("2", 2500, 50), 1).unwrap(); // 2500

        let totals = cart.totals(500).unwrap();

        assert_eq!(totals.subtotal_paisa, 12500);
        assert_eq!(totals.discount_paisa, 500);
        assert_eq!(totals.total_paisa, 12000);
        assert_eq!(totals.total(), Money::from_paisa(12000));
    }

    #[test]
    fn test_cart_totals_discount_exceeds_subtotal() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", 5000, 50), 1).unwrap();

        let err = cart.totals(6000).unwrap_err();
        assert!(matches!(err, CoreError::DiscountExceedsSubtotal { .. }));
    }

    #[test]
    fn test_empty_cart_cannot_settle() {
        let cart = Cart::new();
        assert!(matches!(cart.totals(0), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_cart_clear() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", 9900, 50), 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }
}
