//! # Checkout Coordinator
//!
//! Settles a cart into a bill inside a single database transaction.
//!
//! ## The Transaction Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CHECKOUT TRANSACTION                             │
//! │                                                                         │
//! │   BEGIN                                                                 │
//! │     1. allocate bill number (count of today's bills + 1)                │
//! │     2. INSERT bill + bill lines                                         │
//! │     3. per line:  re-check stock  →  counter -= qty  →  ledger row      │
//! │     4. credit sale:  customer.outstanding += total                      │
//! │   COMMIT                                                                │
//! │                                                                         │
//! │   Any failure before COMMIT rolls the whole sale back: no bill          │
//! │   without its stock movements, no charge without its bill.              │
//! │                                                                         │
//! │   Quotation bills stop after step 2. They never touch stock,            │
//! │   the ledger, or customer balances.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why One Transaction
//! A sale writes four tables. Writing them in separate statements means a
//! crash between any two leaves the books inconsistent: a bill with no
//! ledger rows, or a stock counter that moved for a sale that was never
//! recorded. The transaction makes the whole sale one atomic fact.

use sqlx::SqlitePool;
use tracing::{debug, info};

use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::repository::bill::{generate_bill_id, generate_bill_line_id, BillRepository};
use crate::repository::customer::CustomerRepository;
use crate::repository::item::ItemRepository;
use crate::repository::ledger::LedgerRepository;
use hisab_core::{
    Bill, BillLine, BillType, Cart, CoreError, Money, PaymentMethod, Profile, StockMovement,
};

// =============================================================================
// Request & Outcome Types
// =============================================================================

/// How the customer is paying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Tender {
    /// Cash across the counter. `tendered` is what the customer handed
    /// over; change is computed against the bill total.
    Cash { tendered: Money },
    /// Udhaar: the total goes on the customer's outstanding balance.
    Credit,
}

/// Parameters for settling a cart.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CheckoutRequest {
    pub bill_type: BillType,
    /// Required for credit sales; optional for cash (attaches the
    /// purchase to the customer's history without charging them).
    pub customer_id: Option<String>,
    pub discount_paisa: i64,
    pub tender: Tender,
}

impl CheckoutRequest {
    /// A regular cash sale.
    pub fn cash(tendered: Money) -> Self {
        CheckoutRequest {
            bill_type: BillType::Regular,
            customer_id: None,
            discount_paisa: 0,
            tender: Tender::Cash { tendered },
        }
    }

    /// A regular credit (udhaar) sale charged to `customer_id`.
    pub fn credit(customer_id: impl Into<String>) -> Self {
        CheckoutRequest {
            bill_type: BillType::Regular,
            customer_id: Some(customer_id.into()),
            discount_paisa: 0,
            tender: Tender::Credit,
        }
    }

    /// A quotation: the bill prints, nothing else moves.
    pub fn quotation() -> Self {
        CheckoutRequest {
            bill_type: BillType::Quotation,
            customer_id: None,
            discount_paisa: 0,
            tender: Tender::Cash {
                tendered: Money::zero(),
            },
        }
    }

    /// Sets a flat discount in paisa.
    pub fn with_discount(mut self, discount_paisa: i64) -> Self {
        self.discount_paisa = discount_paisa;
        self
    }

    /// Attaches a customer without changing the tender.
    pub fn for_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }
}

/// The settled sale: the bill as persisted plus its lines.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutOutcome {
    pub bill: Bill,
    pub lines: Vec<BillLine>,
}

impl CheckoutOutcome {
    /// Bill total.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paisa(self.bill.total_paisa)
    }

    /// Change due back to the customer.
    #[inline]
    pub fn change(&self) -> Money {
        Money::from_paisa(self.bill.change_paisa)
    }
}

/// Resolved payment fields, computed before any write.
#[derive(Debug)]
struct Payment {
    method: PaymentMethod,
    tendered_paisa: i64,
    change_paisa: i64,
}

// =============================================================================
// Checkout Coordinator
// =============================================================================

/// Coordinates the multi-table checkout write.
///
/// ## Usage
/// ```rust,ignore
/// let checkout = store.checkout();
/// let outcome = checkout
///     .settle(&cart, &CheckoutRequest::cash(Money::from_rupees(500)), &profile)
///     .await?;
/// println!("bill {} change {}", outcome.bill.bill_number, outcome.change());
/// ```
#[derive(Debug, Clone)]
pub struct Checkout {
    pool: SqlitePool,
    items: ItemRepository,
    ledger: LedgerRepository,
    customers: CustomerRepository,
    bills: BillRepository,
}

impl Checkout {
    /// Creates a new checkout coordinator.
    pub fn new(pool: SqlitePool) -> Self {
        Checkout {
            items: ItemRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            bills: BillRepository::new(pool.clone()),
            pool,
        }
    }

    /// Settles the cart: validates, then writes the whole sale or
    /// nothing.
    ///
    /// ## Rules
    /// - Empty carts and over-subtotal discounts are rejected before
    ///   any write.
    /// - Credit sales require a customer; cash sales must tender at
    ///   least the total.
    /// - Every line's stock is re-checked against the counter inside
    ///   the transaction; a short line aborts the entire sale.
    /// - Quotation bills persist the bill and lines only.
    ///
    /// ## Returns
    /// * `Ok(CheckoutOutcome)` - Bill and lines as persisted
    /// * `Err(StoreError::Domain)` - A business rule rejected the sale
    pub async fn settle(
        &self,
        cart: &Cart,
        request: &CheckoutRequest,
        profile: &Profile,
    ) -> StoreResult<CheckoutOutcome> {
        let totals = cart.totals(request.discount_paisa)?;
        let payment = resolve_payment(request, totals.total_paisa)?;

        // The named customer must exist before we reserve a bill number.
        if let Some(customer_id) = &request.customer_id {
            self.customers
                .get_by_id(customer_id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?;
        }

        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        let bill_number = self.bills.next_bill_number(&mut tx, now).await?;

        let bill = Bill {
            id: generate_bill_id(),
            bill_number,
            bill_type: request.bill_type,
            customer_id: request.customer_id.clone(),
            subtotal_paisa: totals.subtotal_paisa,
            discount_paisa: totals.discount_paisa,
            total_paisa: totals.total_paisa,
            tendered_paisa: payment.tendered_paisa,
            change_paisa: payment.change_paisa,
            payment_method: payment.method,
            created_by: profile.user_id.clone(),
            created_at: now,
        };

        let lines: Vec<BillLine> = cart
            .lines
            .iter()
            .map(|line| BillLine {
                id: generate_bill_line_id(),
                bill_id: bill.id.clone(),
                item_id: line.item_id.clone(),
                name_snapshot: line.name.clone(),
                unit_price_paisa: line.unit_price_paisa,
                quantity: line.quantity,
                line_total_paisa: line.line_total_paisa(),
            })
            .collect();

        self.bills.insert_bill(&mut tx, &bill).await?;
        for line in &lines {
            self.bills.insert_line(&mut tx, line).await?;
        }

        // Quotations are paper only: commit the bill, skip every side
        // effect.
        if bill.bill_type.is_quotation() {
            tx.commit()
                .await
                .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

            info!(
                bill_number = %bill.bill_number,
                total = %Money::from_paisa(bill.total_paisa),
                "Quotation saved"
            );

            return Ok(CheckoutOutcome { bill, lines });
        }

        for line in &cart.lines {
            let item = self
                .items
                .get_in_tx(&mut tx, &line.item_id)
                .await?
                .filter(|item| !item.is_archived)
                .ok_or_else(|| CoreError::ItemNotFound(line.name.clone()))?;

            // Stock may have moved since the line entered the cart.
            if item.current_stock < line.quantity {
                return Err(CoreError::InsufficientStock {
                    name: line.name.clone(),
                    available: item.current_stock,
                    requested: line.quantity,
                }
                .into());
            }

            self.items
                .deduct_stock(&mut tx, &line.item_id, line.quantity)
                .await?;

            let movement = StockMovement::stock_out(
                &line.item_id,
                line.quantity,
                Money::from_paisa(line.unit_price_paisa),
                &profile.user_id,
                now,
            );
            self.ledger.insert_movement(&mut tx, &movement).await?;

            debug!(
                item_id = %line.item_id,
                quantity = %line.quantity,
                "Line settled"
            );
        }

        // resolve_payment guarantees credit sales carry a customer.
        if let Some(customer_id) = &request.customer_id {
            match payment.method {
                PaymentMethod::Credit => {
                    self.customers
                        .apply_charge(&mut tx, customer_id, totals.total())
                        .await?;
                }
                PaymentMethod::Cash => {
                    self.customers
                        .apply_purchase_total(&mut tx, customer_id, totals.total())
                        .await?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        info!(
            bill_number = %bill.bill_number,
            total = %Money::from_paisa(bill.total_paisa),
            lines = lines.len(),
            method = ?payment.method,
            "Checkout settled"
        );

        Ok(CheckoutOutcome { bill, lines })
    }
}

// =============================================================================
// Payment Rules
// =============================================================================

/// Validates the tender against the bill total and resolves the fields
/// that land on the bill row.
///
/// ## Rules
/// - Quotations skip payment validation; tendered and change are zero.
/// - Credit requires a customer to charge.
/// - Cash must cover the total; change is the difference.
fn resolve_payment(request: &CheckoutRequest, total_paisa: i64) -> Result<Payment, CoreError> {
    if request.bill_type.is_quotation() {
        let method = match request.tender {
            Tender::Cash { .. } => PaymentMethod::Cash,
            Tender::Credit => PaymentMethod::Credit,
        };
        return Ok(Payment {
            method,
            tendered_paisa: 0,
            change_paisa: 0,
        });
    }

    match request.tender {
        Tender::Credit => {
            if request.customer_id.is_none() {
                return Err(CoreError::CustomerRequired);
            }
            Ok(Payment {
                method: PaymentMethod::Credit,
                tendered_paisa: 0,
                change_paisa: 0,
            })
        }
        Tender::Cash { tendered } => {
            if tendered.paisa() < total_paisa {
                return Err(CoreError::InsufficientTender {
                    tendered: tendered.paisa(),
                    total: total_paisa,
                });
            }
            Ok(Payment {
                method: PaymentMethod::Cash,
                tendered_paisa: tendered.paisa(),
                change_paisa: tendered.paisa() - total_paisa,
            })
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
    fn test_cash_payment_change() {
        let request = CheckoutRequest::cash(Money::from_paisa(10000));
        let payment = resolve_payment(&request, 7500).unwrap();

        assert_eq!(payment.method, PaymentMethod::Cash);
        assert_eq!(payment.tendered_paisa, 10000);
        assert_eq!(payment.change_paisa, 2500);
    }

    #[test]
    fn test_cash_insufficient_tender() {
        let request = CheckoutRequest::cash(Money::from_paisa(5000));
        let err = resolve_payment(&request, 7500).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientTender {
                tendered: 5000,
                total: 7500
            }
        ));
    }

    #[test]
    fn test_credit_requires_customer() {
        let request = CheckoutRequest {
            bill_type: BillType::Regular,
            customer_id: None,
            discount_paisa: 0,
            tender: Tender::Credit,
        };
        let err = resolve_payment(&request, 7500).unwrap_err();

        assert!(matches!(err, CoreError::CustomerRequired));
    }

    #[test]
    fn test_credit_with_customer() {
        let request = CheckoutRequest::credit("cust-1");
        let payment = resolve_payment(&request, 7500).unwrap();

        assert_eq!(payment.method, PaymentMethod::Credit);
        assert_eq!(payment.tendered_paisa, 0);
        assert_eq!(payment.change_paisa, 0);
    }

    #[test]
    fn test_quotation_skips_payment_validation() {
        // Zero tendered against a non-zero total would fail a regular
        // sale; a quotation sails through.
        let request = CheckoutRequest::quotation();
        let payment = resolve_payment(&request, 7500).unwrap();

        assert_eq!(payment.method, PaymentMethod::Cash);
        assert_eq!(payment.tendered_paisa, 0);
        assert_eq!(payment.change_paisa, 0);
    }

    // -------------------------------------------------------------------------
    // Store-level tests (in-memory SQLite, full transaction path)
    // -------------------------------------------------------------------------

    use crate::pool::{Store, StoreConfig};
    use crate::repository::customer::generate_customer_id;
    use crate::repository::item::generate_item_id;
    use hisab_core::{Customer, Item, MovementKind};

    fn counter_profile() -> Profile {
        Profile::new("op-1", "Counter One", "Test Store")
    }

    async fn open_store() -> Store {
        Store::open(StoreConfig::in_memory()).await.unwrap()
    }

    /// Inserts an item, stocks it through the ledger, and returns it
    /// re-fetched so the cart's soft check sees the fresh counter.
    async fn seed_item(store: &Store, name: &str, price_paisa: i64, opening_stock: i64) -> Item {
        let now = Utc::now();
        let item = Item {
            id: generate_item_id(),
            name: name.to_string(),
            category_id: None,
            unit_price_paisa: price_paisa,
            current_stock: 0,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        store.items().insert(&item).await.unwrap();
        store
            .ledger()
            .record_stock_in(
                &item.id,
                opening_stock,
                Money::from_paisa(price_paisa / 2),
                &counter_profile(),
            )
            .await
            .unwrap();
        store.items().get_by_id(&item.id).await.unwrap().unwrap()
    }

    async fn seed_customer(store: &Store, name: &str) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: generate_customer_id(),
            name: name.to_string(),
            phone: None,
            outstanding_paisa: 0,
            total_purchases_paisa: 0,
            created_at: now,
            updated_at: now,
        };
        store.customers().insert(&customer).await.unwrap()
    }

    #[tokio::test]
    async fn test_cash_checkout_settles_atomically() {
        let store = open_store().await;
        let item = seed_item(&store, "Basmati Rice 5kg", 10000, 10).await;

        let mut cart = Cart::new();
        cart.add_item(&item, 3).unwrap();

        let request = CheckoutRequest::cash(Money::from_paisa(50000)).with_discount(2000);
        let outcome = store
            .checkout()
            .settle(&cart, &request, &counter_profile())
            .await
            .unwrap();

        assert_eq!(outcome.bill.subtotal_paisa, 30000);
        assert_eq!(outcome.bill.discount_paisa, 2000);
        assert_eq!(outcome.bill.total_paisa, 28000);
        assert_eq!(outcome.bill.tendered_paisa, 50000);
        assert_eq!(outcome.bill.change_paisa, 22000);
        assert_eq!(outcome.bill.payment_method, PaymentMethod::Cash);

        // Bill and its lines are on file.
        let saved = store
            .bills()
            .get_by_id(&outcome.bill.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.bill_number, outcome.bill.bill_number);
        assert_eq!(saved.total_paisa, 28000);

        let lines = store.bills().get_lines(&outcome.bill.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].line_total_paisa, 30000);

        // Counter moved and the sale landed in the ledger.
        let after = store.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, 7);

        let movements = store.ledger().list_for_item(&item.id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[1].kind, MovementKind::StockOut);
        assert_eq!(movements[1].quantity, 3);
        assert_eq!(movements[1].unit_price_paisa, 10000);
    }

    #[tokio::test]
    async fn test_credit_checkout_charges_only_that_customer() {
        let store = open_store().await;
        let item = seed_item(&store, "Sugar 1kg", 15000, 10).await;
        let ahmed = seed_customer(&store, "Ahmed Bhai").await;
        let bilal = seed_customer(&store, "Bilal").await;

        let mut cart = Cart::new();
        cart.add_item(&item, 2).unwrap();

        let outcome = store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::credit(ahmed.id.clone()),
                &counter_profile(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.bill.payment_method, PaymentMethod::Credit);
        assert_eq!(outcome.bill.tendered_paisa, 0);
        assert_eq!(outcome.bill.change_paisa, 0);

        let ahmed = store
            .customers()
            .get_by_id(&ahmed.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ahmed.outstanding_paisa, 30000);
        assert_eq!(ahmed.total_purchases_paisa, 30000);

        let bilal = store
            .customers()
            .get_by_id(&bilal.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bilal.outstanding_paisa, 0);
        assert_eq!(bilal.total_purchases_paisa, 0);
    }

    #[tokio::test]
    async fn test_stock_shortfall_rolls_back_the_whole_sale() {
        let store = open_store().await;
        let rice = seed_item(&store, "Basmati Rice 5kg", 10000, 10).await;
        let oil = seed_item(&store, "Cooking Oil 1L", 20000, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&rice, 2).unwrap();
        cart.add_item(&oil, 5).unwrap();

        // Oil leaves the shelf between cart and counter; the in-tx
        // re-check must catch it even though add_item passed.
        store
            .ledger()
            .record_stock_out(&oil.id, 4, Money::from_paisa(20000), &counter_profile())
            .await
            .unwrap();

        let err = store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::cash(Money::from_paisa(200000)),
                &counter_profile(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Domain(CoreError::InsufficientStock {
                available: 1,
                requested: 5,
                ..
            })
        ));

        // The rice deduction rolled back with everything else.
        assert_eq!(store.bills().count().await.unwrap(), 0);
        let rice_after = store.items().get_by_id(&rice.id).await.unwrap().unwrap();
        assert_eq!(rice_after.current_stock, 10);
        // Two seed stock_ins plus the manual stock_out, nothing more.
        assert_eq!(store.ledger().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_quotation_moves_no_stock_and_charges_no_one() {
        let store = open_store().await;
        let item = seed_item(&store, "Tapal Danedar 190g", 60000, 10).await;
        let customer = seed_customer(&store, "Ahmed Bhai").await;

        let mut cart = Cart::new();
        cart.add_item(&item, 4).unwrap();

        let outcome = store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::quotation().for_customer(customer.id.clone()),
                &counter_profile(),
            )
            .await
            .unwrap();

        assert!(outcome.bill.bill_type.is_quotation());
        assert_eq!(outcome.bill.tendered_paisa, 0);
        assert_eq!(outcome.bill.change_paisa, 0);

        // The bill and its lines exist for the printout.
        assert!(store
            .bills()
            .get_by_id(&outcome.bill.id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(
            store.bills().get_lines(&outcome.bill.id).await.unwrap().len(),
            1
        );

        // Stock, ledger, and the customer's balance are untouched.
        let after = store.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, 10);
        assert_eq!(store.ledger().count().await.unwrap(), 1);

        let customer = store
            .customers()
            .get_by_id(&customer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.outstanding_paisa, 0);
        assert_eq!(customer.total_purchases_paisa, 0);
    }

    #[tokio::test]
    async fn test_bill_numbers_count_up_within_the_day() {
        let store = open_store().await;
        let item = seed_item(&store, "Lux Soap", 8000, 20).await;

        let mut cart = Cart::new();
        cart.add_item(&item, 1).unwrap();
        let first = store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::cash(Money::from_paisa(8000)),
                &counter_profile(),
            )
            .await
            .unwrap();

        let item = store.items().get_by_id(&item.id).await.unwrap().unwrap();
        let mut cart = Cart::new();
        cart.add_item(&item, 1).unwrap();
        let second = store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::cash(Money::from_paisa(8000)),
                &counter_profile(),
            )
            .await
            .unwrap();

        let prefix = first.bill.created_at.format("%Y%m%d").to_string();
        assert!(first.bill.bill_number.starts_with(&prefix));
        assert!(first.bill.bill_number.ends_with("-0001"));
        assert!(second.bill.bill_number.ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_cash_sale_with_customer_adds_history_not_debt() {
        let store = open_store().await;
        let item = seed_item(&store, "Surf Excel 500g", 35000, 8).await;
        let customer = seed_customer(&store, "Saleem").await;

        let mut cart = Cart::new();
        cart.add_item(&item, 2).unwrap();

        store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::cash(Money::from_paisa(70000))
                    .for_customer(customer.id.clone()),
                &counter_profile(),
            )
            .await
            .unwrap();

        let customer = store
            .customers()
            .get_by_id(&customer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.outstanding_paisa, 0);
        assert_eq!(customer.total_purchases_paisa, 70000);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected_before_any_write() {
        let store = open_store().await;
        let item = seed_item(&store, "Colgate 100g", 22000, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&item, 1).unwrap();

        let err = store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::credit("no-such-customer"),
                &counter_profile(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Domain(CoreError::CustomerNotFound(_))
        ));
        assert_eq!(store.bills().count().await.unwrap(), 0);
    }
}
