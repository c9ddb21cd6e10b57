//! User model and related functionality

use chrono::{DateTime, Utc};
use common::error::IdentityResult;
use common::identity;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity. The email is the login identifier and is stored normalized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check a plain-text password against the stored hash
    pub fn verify_password(&self, password: &str) -> IdentityResult<bool> {
        identity::verify_password(&self.password_hash, password)
    }
}

/// New user creation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub email: String,
    /// Plain-text password, hashed by the store
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(skip)]
    pub is_staff: bool,
    #[serde(skip)]
    pub is_superuser: bool,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }

    /// Validate the payload and return the normalized email
    pub fn validate(&self) -> IdentityResult<String> {
        identity::validate_email(&self.email)?;
        identity::validate_password(&self.password)?;
        Ok(identity::normalize_email(&self.email))
    }
}

/// User update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl UpdateUser {
    /// Validate the changed fields. Returns the normalized email, if one was
    /// given.
    pub fn validate(&self) -> IdentityResult<Option<String>> {
        if let Some(password) = &self.password {
            identity::validate_password(password)?;
        }

        match &self.email {
            Some(email) => {
                identity::validate_email(email)?;
                Ok(Some(identity::normalize_email(email)))
            }
            None => Ok(None),
        }
    }
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::IdentityError;

    #[test]
    fn new_user_validation_normalizes_email() {
        let user = NewUser::new(" Ada@Example.com ", "Sup3r$ecret");
        assert_eq!(user.validate().unwrap(), "ada@example.com");
    }

    #[test]
    fn new_user_validation_reports_the_first_problem() {
        assert!(matches!(
            NewUser::new("", "Sup3r$ecret").validate(),
            Err(IdentityError::InvalidEmail(_))
        ));
        assert!(matches!(
            NewUser::new("ada@example.com", "short").validate(),
            Err(IdentityError::WeakPassword(_))
        ));
    }

    #[test]
    fn privilege_flags_cannot_be_deserialized() {
        let json = serde_json::json!({
            "email": "ada@example.com",
            "password": "Sup3r$ecret",
            "is_staff": true,
            "is_superuser": true,
        });
        let user: NewUser = serde_json::from_value(json).unwrap();
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[test]
    fn update_validation_only_checks_present_fields() {
        assert_eq!(UpdateUser::default().validate().unwrap(), None);

        let update = UpdateUser {
            email: Some("NEW@example.com".to_string()),
            ..UpdateUser::default()
        };
        assert_eq!(
            update.validate().unwrap(),
            Some("new@example.com".to_string())
        );

        let update = UpdateUser {
            password: Some("weak".to_string()),
            ..UpdateUser::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            last_login: None,
            date_joined: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }
}
