//! # Item Repository
//!
//! Database operations for the item catalog.
//!
//! ## Key Operations
//! - Name search for the counter screen
//! - CRUD with validation at the store boundary
//! - Delta-based stock counter updates
//!
//! ## The Two Stock Numbers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items.current_stock        vs        stock_movements replay            │
//! │  ───────────────────                  ──────────────────────            │
//! │  Cached running counter               Authoritative derivation          │
//! │  Fast reads for cart checks           Recomputed on every valuation     │
//! │  Updated by delta on checkout         Never mutated, only appended      │
//! │                                                                         │
//! │  The counter can drift (manual edits, crashes mid-flow in old          │
//! │  versions). Valuation therefore never trusts it.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use hisab_core::validation::{validate_item_name, validate_price_paisa, validate_search_query};
use hisab_core::Item;

const ITEM_COLUMNS: &str = "id, name, category_id, unit_price_paisa, current_stock, \
     is_archived, created_at, updated_at";

/// Repository for item catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ItemRepository::new(pool);
///
/// // Search items
/// let results = repo.search("chai", 20).await?;
///
/// // Get by ID
/// let item = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Searches items by name.
    ///
    /// ## How It Works
    /// A karyana catalog holds hundreds of items, not tens of thousands,
    /// so a LIKE scan over the name column is plenty. Matches anywhere in
    /// the name, case-insensitive per SQLite's LIKE.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial); empty lists active items
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> StoreResult<Vec<Item>> {
        let query = validate_search_query(query).map_err(hisab_core::CoreError::from)?;

        debug!(query = %query, limit = %limit, "Searching items");

        if query.is_empty() {
            let mut items = self.list_active().await?;
            items.truncate(limit as usize);
            return Ok(items);
        }

        let pattern = format!("%{}%", query);

        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE is_archived = 0 AND name LIKE ?1 \
             ORDER BY name \
             LIMIT ?2"
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = items.len(), "Search returned items");
        Ok(items)
    }

    /// Lists all active (non-archived) items, sorted by name.
    ///
    /// ## Usage
    /// This is the item registry valuation iterates over; archived items
    /// are excluded here and therefore never appear in a valuation.
    pub async fn list_active(&self) -> StoreResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE is_archived = 0 \
             ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets an item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found (archived or not)
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Inserts a new item.
    ///
    /// ## Validation
    /// Name and price are validated here, at the store boundary, so no
    /// loosely shaped record ever reaches the table.
    ///
    /// ## Returns
    /// * `Ok(Item)` - Inserted item
    /// * `Err(StoreError::Domain)` - Validation rejected the record
    pub async fn insert(&self, item: &Item) -> StoreResult<Item> {
        validate_item_name(&item.name).map_err(hisab_core::CoreError::from)?;
        validate_price_paisa(item.unit_price_paisa).map_err(hisab_core::CoreError::from)?;

        debug!(id = %item.id, name = %item.name, "Inserting item");

        sqlx::query(
            "INSERT INTO items (
                id, name, category_id, unit_price_paisa, current_stock,
                is_archived, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category_id)
        .bind(item.unit_price_paisa)
        .bind(item.current_stock)
        .bind(item.is_archived)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item.clone())
    }

    /// Updates an existing item's catalog fields.
    ///
    /// The stock counter is deliberately not written here; it only moves
    /// through [`ItemRepository::update_stock`] and the checkout
    /// transaction.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(StoreError::NotFound)` - Item doesn't exist
    pub async fn update(&self, item: &Item) -> StoreResult<()> {
        validate_item_name(&item.name).map_err(hisab_core::CoreError::from)?;
        validate_price_paisa(item.unit_price_paisa).map_err(hisab_core::CoreError::from)?;

        debug!(id = %item.id, "Updating item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE items SET
                name = ?2,
                category_id = ?3,
                unit_price_paisa = ?4,
                updated_at = ?5
             WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category_id)
        .bind(item.unit_price_paisa)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Adjusts the cached stock counter by a delta.
    ///
    /// ## Delta, Not Absolute
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ❌ WRONG: absolute write (loses concurrent updates)               │
    /// │     UPDATE items SET current_stock = 7 WHERE id = ?                │
    /// │                                                                     │
    /// │  ✅ CORRECT: delta write                                           │
    /// │     UPDATE items SET current_stock = current_stock - 3             │
    /// │                                                                     │
    /// │  Counter A: sells 3 → stock - 3                                    │
    /// │  Counter B: sells 2 → stock - 2                                    │
    /// │  Both land without clobbering each other: -5 total                 │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Arguments
    /// * `id` - Item ID
    /// * `delta` - Change in stock (negative for sales, positive for restocking)
    pub async fn update_stock(&self, id: &str, delta: i64) -> StoreResult<()> {
        debug!(id = %id, delta = %delta, "Updating stock counter");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE items SET
                current_stock = current_stock + ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", id));
        }

        Ok(())
    }

    /// Archives an item, hiding it from sale and valuation.
    ///
    /// ## Why Archive, Not Delete?
    /// - Historical bills still reference this item
    /// - Its ledger history must stay replayable
    /// - Can be restored if archived by mistake
    pub async fn archive(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Archiving item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE items SET is_archived = 1, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", id));
        }

        Ok(())
    }

    /// Restores an archived item to active duty.
    pub async fn unarchive(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Restoring item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE items SET is_archived = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", id));
        }

        Ok(())
    }

    // ========================================================================
    // Transaction-Scoped Operations (checkout only)
    // ========================================================================

    /// Reads an item inside `tx`, seeing the transaction's own writes.
    pub(crate) async fn get_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: &str,
    ) -> StoreResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(item)
    }

    /// Decrements the stock counter inside `tx`.
    ///
    /// Same delta discipline as [`ItemRepository::update_stock`], scoped
    /// to the checkout transaction so the write rolls back with it.
    pub(crate) async fn deduct_stock(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: &str,
        quantity: i64,
    ) -> StoreResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE items SET
                current_stock = current_stock - ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", id));
        }

        Ok(())
    }

    /// Counts active items (for diagnostics and seed checks).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE is_archived = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}
