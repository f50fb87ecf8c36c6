//! # Bill Repository
//!
//! Database operations for bills and their lines. Bills are written
//! exclusively through the checkout coordinator's transaction; this
//! repository owns the read paths and the `pub(crate)` insert helpers
//! that run inside that transaction.
//!
//! ## Bill Numbers
//!
//! Numbers are daily sequences in `YYYYMMDD-NNNN` form:
//!
//! ```text
//! 20260823-0001    first bill of August 23
//! 20260823-0002    second
//! 20260824-0001    counter resets next day
//! ```
//!
//! The sequence is derived from the count of today's bills inside the
//! same transaction that inserts the new bill, so concurrent checkouts
//! cannot claim the same number.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use hisab_core::{Bill, BillLine};

const BILL_COLUMNS: &str =
    "id, bill_number, bill_type, customer_id, subtotal_paisa, discount_paisa, \
     total_paisa, tendered_paisa, change_paisa, payment_method, created_by, created_at";

const LINE_COLUMNS: &str =
    "id, bill_id, item_id, name_snapshot, unit_price_paisa, quantity, line_total_paisa";

/// Repository for bill operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// Gets a bill by ID. Returns None if not found.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    /// Gets the lines of a bill, in insertion order.
    pub async fn get_lines(&self, bill_id: &str) -> StoreResult<Vec<BillLine>> {
        let lines = sqlx::query_as::<_, BillLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM bill_lines WHERE bill_id = ?1 ORDER BY rowid ASC"
        ))
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists the most recent bills, newest first.
    pub async fn list_recent(&self, limit: u32) -> StoreResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             ORDER BY created_at DESC, rowid DESC \
             LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// Lists bills for a customer, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> StoreResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE customer_id = ?1 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// Lists bills within a time window, oldest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE created_at >= ?1 AND created_at < ?2 \
             ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// Sums regular-bill totals within a time window, in paisa.
    ///
    /// Quotations are estimates, not revenue, so they are excluded.
    pub async fn sales_total_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_paisa) FROM bills \
             WHERE bill_type = 'regular' AND created_at >= ?1 AND created_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Counts regular bills within a time window.
    pub async fn count_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bills \
             WHERE bill_type = 'regular' AND created_at >= ?1 AND created_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Counts all bills.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // ========================================================================
    // Transaction-Scoped Writes (checkout only)
    // ========================================================================

    /// Allocates the next bill number for `at`'s date, inside `tx`.
    pub(crate) async fn next_bill_number(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        at: DateTime<Utc>,
    ) -> StoreResult<String> {
        let day_start = at.date_naive().and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bills WHERE created_at >= ?1 AND created_at < ?2",
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&mut **tx)
        .await?;

        Ok(format!("{}-{:04}", at.format("%Y%m%d"), today + 1))
    }

    /// Inserts a bill inside `tx`.
    pub(crate) async fn insert_bill(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        bill: &Bill,
    ) -> StoreResult<()> {
        debug!(
            id = %bill.id,
            bill_number = %bill.bill_number,
            total_paisa = %bill.total_paisa,
            "Inserting bill"
        );

        sqlx::query(
            "INSERT INTO bills (
                id, bill_number, bill_type, customer_id, subtotal_paisa, discount_paisa,
                total_paisa, tendered_paisa, change_paisa, payment_method, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&bill.id)
        .bind(&bill.bill_number)
        .bind(bill.bill_type)
        .bind(&bill.customer_id)
        .bind(bill.subtotal_paisa)
        .bind(bill.discount_paisa)
        .bind(bill.total_paisa)
        .bind(bill.tendered_paisa)
        .bind(bill.change_paisa)
        .bind(bill.payment_method)
        .bind(&bill.created_by)
        .bind(bill.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Inserts a bill line inside `tx`.
    pub(crate) async fn insert_line(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        line: &BillLine,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO bill_lines (
                id, bill_id, item_id, name_snapshot, unit_price_paisa, quantity, line_total_paisa
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&line.id)
        .bind(&line.bill_id)
        .bind(&line.item_id)
        .bind(&line.name_snapshot)
        .bind(line.unit_price_paisa)
        .bind(line.quantity)
        .bind(line.line_total_paisa)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

/// Helper to generate a new bill ID.
pub fn generate_bill_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new bill line ID.
pub fn generate_bill_line_id() -> String {
    Uuid::new_v4().to_string()
}
