//! # Customer Repository
//!
//! Database operations for customers and their udhaar (credit) balances.
//!
//! ## Balance Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Customer Balance Flow                                 │
//! │                                                                         │
//! │  Credit sale at checkout          Payment at the counter                │
//! │  ───────────────────────          ──────────────────────                │
//! │  outstanding += bill total        outstanding -= amount                 │
//! │  total_purchases += bill total                                          │
//! │  (inside the checkout txn)        (standalone, validated)               │
//! │                                                                         │
//! │  The balance is a running counter adjusted by deltas. It is its own    │
//! │  ledger and is never derived from the stock ledger.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use hisab_core::validation::{validate_party_name, validate_payment_amount, validate_phone};
use hisab_core::{Customer, Money};

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, outstanding_paisa, total_purchases_paisa, created_at, updated_at";

/// Repository for customer operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists all customers, sorted by name.
    pub async fn list(&self) -> StoreResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Lists customers who owe money, largest balance first.
    ///
    /// ## Usage
    /// The udhaar register screen: who to remind on collection day.
    pub async fn list_with_dues(&self) -> StoreResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE outstanding_paisa > 0 \
             ORDER BY outstanding_paisa DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    ///
    /// Name and phone are validated at the store boundary.
    pub async fn insert(&self, customer: &Customer) -> StoreResult<Customer> {
        validate_party_name(&customer.name).map_err(hisab_core::CoreError::from)?;
        if let Some(phone) = &customer.phone {
            validate_phone(phone).map_err(hisab_core::CoreError::from)?;
        }

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (
                id, name, phone, outstanding_paisa, total_purchases_paisa,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.outstanding_paisa)
        .bind(customer.total_purchases_paisa)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    /// Updates a customer's name and phone.
    ///
    /// Balances are deliberately not written here; they only move
    /// through charges and payments.
    pub async fn update(&self, customer: &Customer) -> StoreResult<()> {
        validate_party_name(&customer.name).map_err(hisab_core::CoreError::from)?;
        if let Some(phone) = &customer.phone {
            validate_phone(phone).map_err(hisab_core::CoreError::from)?;
        }

        debug!(id = %customer.id, "Updating customer");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET
                name = ?2,
                phone = ?3,
                updated_at = ?4
             WHERE id = ?1",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Records a standalone charge against a customer: `outstanding +=
    /// amount`, `total_purchases += amount`.
    ///
    /// ## Usage
    /// Old udhaar carried over from the paper register, or a charge
    /// raised outside checkout. Checkout itself charges through its own
    /// transaction, not this method.
    pub async fn record_charge(&self, id: &str, amount: Money) -> StoreResult<()> {
        validate_payment_amount(amount.paisa()).map_err(hisab_core::CoreError::from)?;

        debug!(customer_id = %id, amount_paisa = %amount.paisa(), "Recording customer charge");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET
                outstanding_paisa = outstanding_paisa + ?2,
                total_purchases_paisa = total_purchases_paisa + ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(amount.paisa())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Records a payment against a customer's outstanding balance.
    ///
    /// ## Behavior
    /// `outstanding -= amount`. Paying more than is owed leaves a
    /// negative balance, which reads as an advance for the next bill.
    pub async fn record_payment(&self, id: &str, amount: Money) -> StoreResult<()> {
        validate_payment_amount(amount.paisa()).map_err(hisab_core::CoreError::from)?;

        debug!(customer_id = %id, amount_paisa = %amount.paisa(), "Recording customer payment");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET
                outstanding_paisa = outstanding_paisa - ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(amount.paisa())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Charges a credit sale to a customer inside the checkout
    /// transaction: `outstanding += total`, `total_purchases += total`.
    ///
    /// Applied exactly once per checkout; the caller owns the commit.
    pub(crate) async fn apply_charge(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: &str,
        total: Money,
    ) -> StoreResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET
                outstanding_paisa = outstanding_paisa + ?2,
                total_purchases_paisa = total_purchases_paisa + ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(total.paisa())
        .bind(now)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Adds a cash sale to a customer's lifetime purchases inside the
    /// checkout transaction. No outstanding change.
    pub(crate) async fn apply_purchase_total(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: &str,
        total: Money,
    ) -> StoreResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET
                total_purchases_paisa = total_purchases_paisa + ?2,
                updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(total.paisa())
        .bind(now)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Total outstanding across all customers, in paisa.
    pub async fn total_outstanding(&self) -> StoreResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(outstanding_paisa) FROM customers WHERE outstanding_paisa > 0",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}
