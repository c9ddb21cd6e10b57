//! Customer models for the store API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Customer membership tier, stored as a one-letter code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    #[default]
    #[serde(rename = "B")]
    Bronze,
    #[serde(rename = "S")]
    Silver,
    #[serde(rename = "G")]
    Gold,
}

impl Membership {
    pub fn as_code(&self) -> &'static str {
        match self {
            Membership::Bronze => "B",
            Membership::Silver => "S",
            Membership::Gold => "G",
        }
    }
}

impl TryFrom<String> for Membership {
    type Error = String;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        match code.trim() {
            "B" => Ok(Membership::Bronze),
            "S" => Ok(Membership::Silver),
            "G" => Ok(Membership::Gold),
            other => Err(format!("unknown membership code {other:?}")),
        }
    }
}

/// Customer row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub membership: Membership,
    pub created_at: DateTime<Utc>,
}

/// Customer creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub user_id: Uuid,
    #[serde(default)]
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub membership: Membership,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_codes() {
        for tier in [Membership::Bronze, Membership::Silver, Membership::Gold] {
            assert_eq!(Membership::try_from(tier.as_code().to_string()), Ok(tier));
        }
        assert!(Membership::try_from("X".to_string()).is_err());
    }

    #[test]
    fn new_customer_defaults_to_bronze() {
        let json = serde_json::json!({ "user_id": Uuid::nil() });
        let customer: NewCustomer = serde_json::from_value(json).unwrap();
        assert_eq!(customer.membership, Membership::Bronze);
        assert!(customer.phone.is_empty());
        assert!(customer.birth_date.is_none());
    }
}
