//! Product models for the store API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Product row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub unit_price_cents: i64,
    pub inventory: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full product payload, used by `POST` and `PUT`
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub inventory: i32,
}

/// Partial product payload, used by `PATCH`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub inventory: Option<i32>,
}

impl From<NewProduct> for ProductPatch {
    fn from(product: NewProduct) -> Self {
        Self {
            title: Some(product.title),
            slug: Some(product.slug),
            description: Some(product.description),
            unit_price_cents: Some(product.unit_price_cents),
            inventory: Some(product.inventory),
        }
    }
}

impl ProductPatch {
    /// Reject values the table constraints would refuse
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("title must not be empty".to_string());
        }
        if self.slug.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err("slug must not be empty".to_string());
        }
        if self.unit_price_cents.is_some_and(|p| p < 0) {
            return Err("unit_price_cents must not be negative".to_string());
        }
        if self.inventory.is_some_and(|i| i < 0) {
            return Err("inventory must not be negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_payload_becomes_a_full_patch() {
        let patch = ProductPatch::from(NewProduct {
            title: "Tea".to_string(),
            slug: "tea".to_string(),
            description: String::new(),
            unit_price_cents: 450,
            inventory: 3,
        });
        assert_eq!(patch.title.as_deref(), Some("Tea"));
        assert_eq!(patch.inventory, Some(3));
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let negative = ProductPatch {
            unit_price_cents: Some(-1),
            ..ProductPatch::default()
        };
        assert!(negative.validate().is_err());

        let blank = ProductPatch {
            title: Some("  ".to_string()),
            ..ProductPatch::default()
        };
        assert!(blank.validate().is_err());

        assert!(ProductPatch::default().validate().is_ok());
    }
}
