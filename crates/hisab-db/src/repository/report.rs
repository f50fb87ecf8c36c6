//! # Reports
//!
//! Read-only reporting over the store: inventory valuation, sales
//! summaries, and the stock history view. Nothing here writes.
//!
//! ## Valuation Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Reports::valuation(method)                         │
//! │                                                                         │
//! │   items.list_active() ──┐                                               │
//! │                         ├── tokio::try_join! ──► value_items(...)       │
//! │   ledger.load_all() ────┘        │                                      │
//! │                                  │ either side fails                    │
//! │                                  ▼                                      │
//! │                          whole report fails                             │
//! │                          (no partial result)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::StoreResult;
use crate::repository::item::ItemRepository;
use crate::repository::ledger::{LedgerRepository, MovementView};
use hisab_core::{value_items, CostMethod, Money, Valuation};

// =============================================================================
// Report Types
// =============================================================================

/// Sales figures for a time window. Quotation bills are excluded from
/// every field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SalesSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub bill_count: i64,
    /// Sum of subtotals before discount, in paisa.
    pub gross_paisa: i64,
    /// Sum of discounts given, in paisa.
    pub discount_paisa: i64,
    /// Sum of bill totals, in paisa.
    pub net_paisa: i64,
    /// Net taken as cash.
    pub cash_paisa: i64,
    /// Net put on customer balances.
    pub credit_paisa: i64,
}

impl SalesSummary {
    /// Net sales as Money.
    #[inline]
    pub fn net(&self) -> Money {
        Money::from_paisa(self.net_paisa)
    }

    /// Gross sales as Money.
    #[inline]
    pub fn gross(&self) -> Money {
        Money::from_paisa(self.gross_paisa)
    }
}

/// Raw aggregate row; SUM over zero rows is NULL in SQLite.
#[derive(sqlx::FromRow)]
struct SalesRow {
    bill_count: i64,
    gross_paisa: Option<i64>,
    discount_paisa: Option<i64>,
    net_paisa: Option<i64>,
    cash_paisa: Option<i64>,
    credit_paisa: Option<i64>,
}

// =============================================================================
// Reports
// =============================================================================

/// Read-only reporting facade.
///
/// ## Usage
/// ```rust,ignore
/// let reports = store.reports();
/// let valuation = reports.valuation(CostMethod::Fifo).await?;
/// println!("stock worth {}", valuation.total_value());
/// ```
#[derive(Debug, Clone)]
pub struct Reports {
    pool: SqlitePool,
    items: ItemRepository,
    ledger: LedgerRepository,
}

impl Reports {
    /// Creates a new reporting facade.
    pub fn new(pool: SqlitePool) -> Self {
        Reports {
            items: ItemRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool.clone()),
            pool,
        }
    }

    /// Values the inventory by full ledger replay.
    ///
    /// ## How It Works
    /// Loads the active item registry and the complete ledger in
    /// parallel, then folds the ledger through the batch queues. If
    /// either load fails the report fails whole; there is no partial
    /// valuation.
    ///
    /// Shortfalls (outflows past recorded inflows) are carried on the
    /// item lines and logged here, once per item.
    pub async fn valuation(&self, method: CostMethod) -> StoreResult<Valuation> {
        let (items, movements) =
            tokio::try_join!(self.items.list_active(), self.ledger.load_all())?;

        let valuation = value_items(&items, &movements, method);

        for line in &valuation.items {
            if line.shortfall > 0 {
                warn!(
                    item = %line.name,
                    shortfall = %line.shortfall,
                    "Ledger outflow exceeds recorded inflow; uncovered units dropped from value"
                );
            }
        }

        info!(
            method = %method.as_str(),
            items = valuation.items.len(),
            total_stock = %valuation.total_stock_units,
            total_value = %valuation.total_value(),
            "Inventory valued"
        );

        Ok(valuation)
    }

    /// Summarizes regular-bill sales in a time window.
    pub async fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<SalesSummary> {
        let row = sqlx::query_as::<_, SalesRow>(
            "SELECT
                COUNT(*) AS bill_count,
                SUM(subtotal_paisa) AS gross_paisa,
                SUM(discount_paisa) AS discount_paisa,
                SUM(total_paisa) AS net_paisa,
                SUM(CASE WHEN payment_method = 'cash' THEN total_paisa ELSE 0 END) AS cash_paisa,
                SUM(CASE WHEN payment_method = 'credit' THEN total_paisa ELSE 0 END) AS credit_paisa
             FROM bills
             WHERE bill_type = 'regular' AND created_at >= ?1 AND created_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesSummary {
            from,
            to,
            bill_count: row.bill_count,
            gross_paisa: row.gross_paisa.unwrap_or(0),
            discount_paisa: row.discount_paisa.unwrap_or(0),
            net_paisa: row.net_paisa.unwrap_or(0),
            cash_paisa: row.cash_paisa.unwrap_or(0),
            credit_paisa: row.credit_paisa.unwrap_or(0),
        })
    }

    /// The stock history view: ledger entries joined with item names.
    pub async fn stock_history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<MovementView>> {
        self.ledger.history(from, to).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pool::{Store, StoreConfig};
    use crate::repository::checkout::CheckoutRequest;
    use crate::repository::customer::generate_customer_id;
    use crate::repository::item::generate_item_id;
    use chrono::Duration;
    use hisab_core::{Cart, Customer, Item, Profile};

    fn reporter() -> Profile {
        Profile::new("op-1", "Counter One", "Test Store")
    }

    async fn open_store() -> Store {
        Store::open(StoreConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(store: &Store, name: &str, price_paisa: i64) -> Item {
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
        store.items().insert(&item).await.unwrap()
    }

    #[tokio::test]
    async fn test_valuation_follows_cost_method() {
        let store = open_store().await;
        let item = seed_item(&store, "Basmati Rice 5kg", 900).await;

        // Two deliveries at different costs, then one sale across them.
        let ledger = store.ledger();
        ledger
            .record_stock_in(&item.id, 10, Money::from_paisa(500), &reporter())
            .await
            .unwrap();
        ledger
            .record_stock_in(&item.id, 10, Money::from_paisa(700), &reporter())
            .await
            .unwrap();
        ledger
            .record_stock_out(&item.id, 12, Money::from_paisa(900), &reporter())
            .await
            .unwrap();

        // FIFO eats the 500-batch first: 8 left at 700.
        let fifo = store.reports().valuation(CostMethod::Fifo).await.unwrap();
        assert_eq!(fifo.total_stock_units, 8);
        assert_eq!(fifo.total_value_paisa, 5600);
        assert_eq!(fifo.items.len(), 1);
        assert_eq!(fifo.items[0].batches.len(), 1);
        assert_eq!(fifo.items[0].batches[0].unit_cost_paisa, 700);

        // LIFO eats the 700-batch first: 8 left at 500.
        let lifo = store.reports().valuation(CostMethod::Lifo).await.unwrap();
        assert_eq!(lifo.total_stock_units, 8);
        assert_eq!(lifo.total_value_paisa, 4000);
        assert_eq!(lifo.items[0].batches[0].unit_cost_paisa, 500);
    }

    #[tokio::test]
    async fn test_valuation_carries_shortfall_for_oversold_item() {
        let store = open_store().await;
        let item = seed_item(&store, "Cooking Oil 1L", 20000).await;

        store
            .ledger()
            .record_stock_in(&item.id, 5, Money::from_paisa(18000), &reporter())
            .await
            .unwrap();
        store
            .ledger()
            .record_stock_out(&item.id, 8, Money::from_paisa(20000), &reporter())
            .await
            .unwrap();

        let report = store.reports().valuation(CostMethod::Fifo).await.unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].stock, 0);
        assert_eq!(report.items[0].value_paisa, 0);
        assert_eq!(report.items[0].shortfall, 3);
        assert!(report.items[0].batches.is_empty());
        assert_eq!(report.total_value_paisa, 0);
    }

    #[tokio::test]
    async fn test_valuation_skips_archived_items() {
        let store = open_store().await;
        let rice = seed_item(&store, "Basmati Rice 5kg", 900).await;
        let retired = seed_item(&store, "Old Stock", 100).await;

        store
            .ledger()
            .record_stock_in(&rice.id, 4, Money::from_paisa(500), &reporter())
            .await
            .unwrap();
        store
            .ledger()
            .record_stock_in(&retired.id, 9, Money::from_paisa(100), &reporter())
            .await
            .unwrap();
        store.items().archive(&retired.id).await.unwrap();

        let report = store.reports().valuation(CostMethod::Fifo).await.unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].name, "Basmati Rice 5kg");
        assert_eq!(report.total_value_paisa, 2000);
    }

    #[tokio::test]
    async fn test_sales_summary_splits_tender_and_ignores_quotations() {
        let store = open_store().await;
        let item = seed_item(&store, "Sugar 1kg", 10000).await;
        store
            .ledger()
            .record_stock_in(&item.id, 20, Money::from_paisa(8000), &reporter())
            .await
            .unwrap();
        let item = store.items().get_by_id(&item.id).await.unwrap().unwrap();

        let now = Utc::now();
        let customer = Customer {
            id: generate_customer_id(),
            name: "Ahmed Bhai".to_string(),
            phone: None,
            outstanding_paisa: 0,
            total_purchases_paisa: 0,
            created_at: now,
            updated_at: now,
        };
        store.customers().insert(&customer).await.unwrap();

        let mut cart = Cart::new();
        cart.add_item(&item, 2).unwrap();
        store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::cash(Money::from_paisa(20000)),
                &reporter(),
            )
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_item(&item, 1).unwrap();
        store
            .checkout()
            .settle(
                &cart,
                &CheckoutRequest::credit(customer.id.clone()),
                &reporter(),
            )
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_item(&item, 4).unwrap();
        store
            .checkout()
            .settle(&cart, &CheckoutRequest::quotation(), &reporter())
            .await
            .unwrap();

        let summary = store
            .reports()
            .sales_summary(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();

        // The 40000-paisa quotation appears nowhere.
        assert_eq!(summary.bill_count, 2);
        assert_eq!(summary.gross_paisa, 30000);
        assert_eq!(summary.discount_paisa, 0);
        assert_eq!(summary.net_paisa, 30000);
        assert_eq!(summary.cash_paisa, 20000);
        assert_eq!(summary.credit_paisa, 10000);
    }

    #[tokio::test]
    async fn test_sales_summary_empty_window_is_all_zeros() {
        let store = open_store().await;

        let now = Utc::now();
        let summary = store
            .reports()
            .sales_summary(now - Duration::days(7), now - Duration::days(6))
            .await
            .unwrap();

        assert_eq!(summary.bill_count, 0);
        assert_eq!(summary.gross_paisa, 0);
        assert_eq!(summary.net_paisa, 0);
        assert_eq!(summary.cash_paisa, 0);
        assert_eq!(summary.credit_paisa, 0);
    }
}
