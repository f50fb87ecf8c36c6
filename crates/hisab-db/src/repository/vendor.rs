//! # Vendor Repository
//!
//! Database operations for vendors and their payable balances. The
//! purchasing-side mirror of the customer udhaar ledger: `payable` rises
//! when goods arrive on credit and falls when the shop pays the vendor.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use hisab_core::validation::{validate_party_name, validate_payment_amount, validate_phone};
use hisab_core::{Money, Vendor};

const VENDOR_COLUMNS: &str =
    "id, name, phone, payable_paisa, total_supplied_paisa, created_at, updated_at";

/// Repository for vendor operations.
#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: SqlitePool,
}

impl VendorRepository {
    /// Creates a new VendorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VendorRepository { pool }
    }

    /// Lists all vendors, sorted by name.
    pub async fn list(&self) -> StoreResult<Vec<Vendor>> {
        let vendors = sqlx::query_as::<_, Vendor>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(vendors)
    }

    /// Gets a vendor by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vendor)
    }

    /// Inserts a new vendor.
    pub async fn insert(&self, vendor: &Vendor) -> StoreResult<Vendor> {
        validate_party_name(&vendor.name).map_err(hisab_core::CoreError::from)?;
        if let Some(phone) = &vendor.phone {
            validate_phone(phone).map_err(hisab_core::CoreError::from)?;
        }

        debug!(id = %vendor.id, name = %vendor.name, "Inserting vendor");

        sqlx::query(
            "INSERT INTO vendors (
                id, name, phone, payable_paisa, total_supplied_paisa,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&vendor.id)
        .bind(&vendor.name)
        .bind(&vendor.phone)
        .bind(vendor.payable_paisa)
        .bind(vendor.total_supplied_paisa)
        .bind(vendor.created_at)
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(vendor.clone())
    }

    /// Records goods received on credit from a vendor:
    /// `payable += amount`, `total_supplied += amount`.
    pub async fn record_supply(&self, id: &str, amount: Money) -> StoreResult<()> {
        validate_payment_amount(amount.paisa()).map_err(hisab_core::CoreError::from)?;

        debug!(vendor_id = %id, amount_paisa = %amount.paisa(), "Recording vendor supply");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE vendors SET
                payable_paisa = payable_paisa + ?2,
                total_supplied_paisa = total_supplied_paisa + ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(amount.paisa())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Vendor", id));
        }

        Ok(())
    }

    /// Records a payment made to a vendor: `payable -= amount`.
    pub async fn record_payment(&self, id: &str, amount: Money) -> StoreResult<()> {
        validate_payment_amount(amount.paisa()).map_err(hisab_core::CoreError::from)?;

        debug!(vendor_id = %id, amount_paisa = %amount.paisa(), "Recording vendor payment");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE vendors SET
                payable_paisa = payable_paisa - ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(amount.paisa())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Vendor", id));
        }

        Ok(())
    }

    /// Total payable across all vendors, in paisa.
    pub async fn total_payable(&self) -> StoreResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(payable_paisa) FROM vendors WHERE payable_paisa > 0")
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Helper to generate a new vendor ID.
pub fn generate_vendor_id() -> String {
    Uuid::new_v4().to_string()
}
