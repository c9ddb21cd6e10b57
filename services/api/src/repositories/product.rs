//! Product repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::product::{NewProduct, Product, ProductPatch};

const PRODUCT_COLUMNS: &str =
    "id, title, slug, description, unit_price_cents, inventory, created_at, updated_at";

/// Product repository for database operations
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Total number of products
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// One window of products in title order
    pub async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Product>> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY title, id LIMIT $1 OFFSET $2"
        );

        let products = sqlx::query_as::<_, Product>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Get a product by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Create a product
    pub async fn create(&self, product: &NewProduct) -> Result<Product> {
        let query = format!(
            r#"
            INSERT INTO products (title, slug, description, unit_price_cents, inventory)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(&product.title)
            .bind(&product.slug)
            .bind(&product.description)
            .bind(product.unit_price_cents)
            .bind(product.inventory)
            .fetch_one(&self.pool)
            .await?;

        Ok(product)
    }

    /// Apply the present fields of `patch`
    pub async fn update(&self, id: Uuid, patch: &ProductPatch) -> Result<Option<Product>> {
        let query = format!(
            r#"
            UPDATE products SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                unit_price_cents = COALESCE($5, unit_price_cents),
                inventory = COALESCE($6, inventory),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&patch.title)
            .bind(&patch.slug)
            .bind(&patch.description)
            .bind(patch.unit_price_cents)
            .bind(patch.inventory)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Delete a product by ID
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
