//! # Expense Repository
//!
//! Database operations for shop expenses: rent, electricity, the chai
//! that keeps the counter running. Expenses feed the day-book summary
//! alongside sales.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use hisab_core::validation::{validate_description, validate_payment_amount};
use hisab_core::Expense;

const EXPENSE_COLUMNS: &str = "id, description, amount_paisa, incurred_on, recorded_by, created_at";

/// Repository for expense operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a new expense.
    ///
    /// Description and amount are validated at the store boundary.
    pub async fn insert(&self, expense: &Expense) -> StoreResult<Expense> {
        validate_description(&expense.description).map_err(hisab_core::CoreError::from)?;
        validate_payment_amount(expense.amount_paisa).map_err(hisab_core::CoreError::from)?;

        debug!(
            id = %expense.id,
            amount_paisa = %expense.amount_paisa,
            "Inserting expense"
        );

        sqlx::query(
            "INSERT INTO expenses (
                id, description, amount_paisa, incurred_on, recorded_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(expense.amount_paisa)
        .bind(expense.incurred_on)
        .bind(&expense.recorded_by)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense.clone())
    }

    /// Lists expenses within a time window, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE incurred_on >= ?1 AND incurred_on < ?2 \
             ORDER BY incurred_on DESC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Sums expenses within a time window, in paisa.
    pub async fn total_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_paisa) FROM expenses \
             WHERE incurred_on >= ?1 AND incurred_on < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Helper to generate a new expense ID.
pub fn generate_expense_id() -> String {
    Uuid::new_v4().to_string()
}
