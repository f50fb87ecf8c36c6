//! # Stock Ledger Repository
//!
//! The append-only stock movement ledger and its reader.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stock Ledger Rules                                  │
//! │                                                                         │
//! │  APPEND-ONLY                                                           │
//! │  ├── Entries are inserted, never updated, never deleted                │
//! │  └── A mistake is corrected by a compensating entry                    │
//! │                                                                         │
//! │  TOTALLY ORDERED                                                       │
//! │  ├── occurred_at ascending                                             │
//! │  └── rowid breaks ties (insertion order within one timestamp)          │
//! │                                                                         │
//! │  COUNTER STAYS IN STEP                                                 │
//! │  ├── record_stock_in : INSERT entry + counter += qty   (one txn)       │
//! │  └── record_stock_out: INSERT entry + counter -= qty   (one txn)       │
//! │                                                                         │
//! │  The ledger accepts any positive outflow, even past zero; the          │
//! │  valuation replay is where uncovered units surface as shortfall.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use hisab_core::validation::{validate_price_paisa, validate_quantity};
use hisab_core::{Money, MovementKind, Profile, StockMovement};

const MOVEMENT_COLUMNS: &str =
    "id, item_id, quantity, kind, unit_price_paisa, recorded_by, occurred_at";

/// A ledger entry joined with its item's current name, for the stock
/// history report.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct MovementView {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub kind: MovementKind,
    pub unit_price_paisa: i64,
    pub recorded_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Repository for the stock movement ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Loads the complete ledger in replay order.
    ///
    /// ## Ordering
    /// `occurred_at ASC, rowid ASC`. Two entries stamped in the same
    /// second keep their insertion order, so a delivery recorded just
    /// before a sale replays as delivery-then-sale.
    ///
    /// ## Usage
    /// This is the input to valuation. It is deliberately unfiltered:
    /// valuation replays everything from the first entry.
    pub async fn load_all(&self) -> StoreResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             ORDER BY occurred_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = movements.len(), "Loaded stock ledger");
        Ok(movements)
    }

    /// Lists one item's movements in replay order, for history screens.
    pub async fn list_for_item(&self, item_id: &str) -> StoreResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE item_id = ?1 \
             ORDER BY occurred_at ASC, rowid ASC"
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists the most recent movements across all items, newest first.
    pub async fn list_recent(&self, limit: u32) -> StoreResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             ORDER BY occurred_at DESC, rowid DESC \
             LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists movements within a time window, in replay order.
    ///
    /// For reports only. Valuation never passes a window; it replays
    /// the whole ledger via [`LedgerRepository::load_all`].
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE occurred_at >= ?1 AND occurred_at < ?2 \
             ORDER BY occurred_at ASC, rowid ASC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists movements within a time window joined with the item name,
    /// for the stock history report.
    pub async fn history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<MovementView>> {
        let entries = sqlx::query_as::<_, MovementView>(
            "SELECT m.id, m.item_id, i.name AS item_name, m.quantity, m.kind,
                    m.unit_price_paisa, m.recorded_by, m.occurred_at
             FROM stock_movements m
             JOIN items i ON i.id = m.item_id
             WHERE m.occurred_at >= ?1 AND m.occurred_at < ?2
             ORDER BY m.occurred_at ASC, m.rowid ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Appends a single prepared ledger entry.
    ///
    /// The cached counter is not touched; use
    /// [`LedgerRepository::record_stock_in`] or
    /// [`LedgerRepository::record_stock_out`] when the counter must
    /// move in step. This path exists for corrections imported from a
    /// paper register, where the counter was adjusted separately.
    pub async fn append(&self, movement: &StockMovement) -> StoreResult<()> {
        debug!(
            id = %movement.id,
            item_id = %movement.item_id,
            kind = ?movement.kind,
            "Appending ledger entry"
        );

        sqlx::query(
            "INSERT INTO stock_movements (
                id, item_id, quantity, kind, unit_price_paisa, recorded_by, occurred_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&movement.id)
        .bind(&movement.item_id)
        .bind(movement.quantity)
        .bind(movement.kind)
        .bind(movement.unit_price_paisa)
        .bind(&movement.recorded_by)
        .bind(movement.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a stock inflow (delivery, restock) and bumps the item's
    /// cached counter, atomically.
    ///
    /// ## What Happens
    /// 1. Validate quantity and unit cost
    /// 2. In one transaction:
    ///    a. `current_stock += quantity` on the item
    ///    b. INSERT the stock_in ledger entry
    /// 3. Both land or neither does
    ///
    /// ## Arguments
    /// * `item_id` - Item receiving stock
    /// * `quantity` - Units received (positive)
    /// * `unit_cost` - Cost per unit; this opens a cost batch at replay
    /// * `profile` - Who is recording the delivery
    pub async fn record_stock_in(
        &self,
        item_id: &str,
        quantity: i64,
        unit_cost: Money,
        profile: &Profile,
    ) -> StoreResult<StockMovement> {
        validate_quantity(quantity).map_err(hisab_core::CoreError::from)?;
        validate_price_paisa(unit_cost.paisa()).map_err(hisab_core::CoreError::from)?;

        let movement =
            StockMovement::stock_in(item_id, quantity, unit_cost, &profile.user_id, Utc::now());

        debug!(
            item_id = %item_id,
            quantity = %quantity,
            unit_cost_paisa = %unit_cost.paisa(),
            "Recording stock_in"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE items SET current_stock = current_stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(item_id)
        .bind(quantity)
        .bind(movement.occurred_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", item_id));
        }

        self.insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        Ok(movement)
    }

    /// Records a stock outflow (wastage, breakage, manual correction)
    /// and decrements the item's cached counter, atomically.
    ///
    /// ## No Floor
    /// The ledger accepts any positive outflow; the counter may pass
    /// zero. Replay counts the uncovered units as shortfall rather than
    /// rejecting history that already happened on the shop floor.
    pub async fn record_stock_out(
        &self,
        item_id: &str,
        quantity: i64,
        unit_price: Money,
        profile: &Profile,
    ) -> StoreResult<StockMovement> {
        validate_quantity(quantity).map_err(hisab_core::CoreError::from)?;
        validate_price_paisa(unit_price.paisa()).map_err(hisab_core::CoreError::from)?;

        let movement =
            StockMovement::stock_out(item_id, quantity, unit_price, &profile.user_id, Utc::now());

        debug!(
            item_id = %item_id,
            quantity = %quantity,
            "Recording stock_out"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE items SET current_stock = current_stock - ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(item_id)
        .bind(quantity)
        .bind(movement.occurred_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", item_id));
        }

        self.insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        Ok(movement)
    }

    /// Inserts a ledger entry inside an existing transaction.
    ///
    /// Used by this repository's record methods and by the checkout
    /// coordinator, which appends sale outflows in its own transaction.
    pub(crate) async fn insert_movement(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        movement: &StockMovement,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO stock_movements (
                id, item_id, quantity, kind, unit_price_paisa, recorded_by, occurred_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&movement.id)
        .bind(&movement.item_id)
        .bind(movement.quantity)
        .bind(movement.kind)
        .bind(movement.unit_price_paisa)
        .bind(&movement.recorded_by)
        .bind(movement.occurred_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Counts ledger entries (for diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pool::{Store, StoreConfig};
    use crate::repository::item::generate_item_id;
    use chrono::Duration;
    use hisab_core::Item;

    fn storekeeper() -> Profile {
        Profile::new("op-1", "Counter One", "Test Store")
    }

    async fn open_store() -> Store {
        Store::open(StoreConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(store: &Store, name: &str) -> Item {
        let now = Utc::now();
        let item = Item {
            id: generate_item_id(),
            name: name.to_string(),
            category_id: None,
            unit_price_paisa: 10000,
            current_stock: 0,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        store.items().insert(&item).await.unwrap()
    }

    #[tokio::test]
    async fn test_stock_in_appends_entry_and_bumps_counter() {
        let store = open_store().await;
        let item = seed_item(&store, "Basmati Rice 5kg").await;

        let movement = store
            .ledger()
            .record_stock_in(&item.id, 10, Money::from_paisa(7000), &storekeeper())
            .await
            .unwrap();

        assert_eq!(movement.kind, MovementKind::StockIn);
        assert_eq!(movement.quantity, 10);
        assert_eq!(movement.unit_price_paisa, 7000);

        let after = store.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, 10);

        let entries = store.ledger().list_for_item(&item.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, movement.id);
    }

    #[tokio::test]
    async fn test_stock_out_may_pass_zero() {
        let store = open_store().await;
        let item = seed_item(&store, "Cooking Oil 1L").await;

        store
            .ledger()
            .record_stock_in(&item.id, 5, Money::from_paisa(18000), &storekeeper())
            .await
            .unwrap();

        // Wastage count exceeds what the books say is on the shelf.
        // The ledger takes it; valuation reports the shortfall later.
        store
            .ledger()
            .record_stock_out(&item.id, 8, Money::from_paisa(20000), &storekeeper())
            .await
            .unwrap();

        let after = store.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, -3);
        assert_eq!(store.ledger().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_against_missing_item_fails() {
        let store = open_store().await;

        let err = store
            .ledger()
            .record_stock_in("no-such-item", 5, Money::from_paisa(1000), &storekeeper())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replay_order_keeps_same_timestamp_entries_in_insert_order() {
        let store = open_store().await;
        let item = seed_item(&store, "Sugar 1kg").await;

        // Three rapid entries land within the same second; replay must
        // keep delivery-then-sale order.
        store
            .ledger()
            .record_stock_in(&item.id, 10, Money::from_paisa(5000), &storekeeper())
            .await
            .unwrap();
        store
            .ledger()
            .record_stock_out(&item.id, 4, Money::from_paisa(6000), &storekeeper())
            .await
            .unwrap();
        store
            .ledger()
            .record_stock_in(&item.id, 2, Money::from_paisa(5500), &storekeeper())
            .await
            .unwrap();

        let all = store.ledger().load_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].kind, MovementKind::StockIn);
        assert_eq!(all[1].kind, MovementKind::StockOut);
        assert_eq!(all[2].kind, MovementKind::StockIn);
        assert_eq!(all[2].unit_price_paisa, 5500);
    }

    #[tokio::test]
    async fn test_history_joins_item_names() {
        let store = open_store().await;
        let rice = seed_item(&store, "Basmati Rice 5kg").await;
        let oil = seed_item(&store, "Cooking Oil 1L").await;

        store
            .ledger()
            .record_stock_in(&rice.id, 10, Money::from_paisa(7000), &storekeeper())
            .await
            .unwrap();
        store
            .ledger()
            .record_stock_in(&oil.id, 6, Money::from_paisa(18000), &storekeeper())
            .await
            .unwrap();

        let now = Utc::now();
        let views = store
            .ledger()
            .history(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].item_name, "Basmati Rice 5kg");
        assert_eq!(views[1].item_name, "Cooking Oil 1L");

        // A window before the entries is empty.
        let earlier = store
            .ledger()
            .history(now - Duration::days(2), now - Duration::days(1))
            .await
            .unwrap();
        assert!(earlier.is_empty());
    }
}
