//! Customer repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::customer::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, user_id, phone, birth_date, membership, created_at";

/// Customer repository for database operations
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    /// Create a new customer repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// One window of customers, oldest first
    pub async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Customer>> {
        let query = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at, id LIMIT $1 OFFSET $2"
        );

        let customers = sqlx::query_as::<_, Customer>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");

        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Create a customer profile for an existing user
    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer> {
        let query = format!(
            r#"
            INSERT INTO customers (user_id, phone, birth_date, membership)
            VALUES ($1, $2, $3, $4)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(customer.user_id)
            .bind(&customer.phone)
            .bind(customer.birth_date)
            .bind(customer.membership.as_code())
            .fetch_one(&self.pool)
            .await?;

        Ok(customer)
    }
}
