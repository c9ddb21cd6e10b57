//! PostgreSQL user store

use async_trait::async_trait;
use common::database::is_unique_violation;
use common::error::{DatabaseError, IdentityError, IdentityResult};
use common::identity::{hash_password, normalize_email};
use sqlx::PgPool;
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, UpdateUser, User};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, is_staff, \
     is_superuser, is_active, last_login, date_joined, updated_at";

/// User repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The unique index on `lower(email)` catches writers racing past the
/// pre-check.
fn map_write_error(err: sqlx::Error) -> IdentityError {
    if is_unique_violation(&err) {
        IdentityError::DuplicateEmail
    } else {
        IdentityError::Database(DatabaseError::Query(err))
    }
}

fn map_read_error(err: sqlx::Error) -> IdentityError {
    IdentityError::Database(DatabaseError::Query(err))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: &NewUser) -> IdentityResult<User> {
        let email = new_user.validate()?;
        info!("Creating new user: {}", email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail);
        }

        let password_hash = hash_password(&new_user.password)?;

        let query = format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&email)
            .bind(&password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(new_user.is_staff)
            .bind(new_user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)
    }

    async fn find_by_id(&self, id: Uuid) -> IdentityResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)
    }

    async fn update(&self, id: Uuid, changes: &UpdateUser) -> IdentityResult<User> {
        let email = changes.validate()?;

        if let Some(email) = &email {
            if let Some(holder) = self.find_by_email(email).await? {
                if holder.id != id {
                    return Err(IdentityError::DuplicateEmail);
                }
            }
        }

        let password_hash = changes
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let query = format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(email)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(IdentityError::NotFound)
    }

    async fn deactivate(&self, id: Uuid) -> IdentityResult<User> {
        info!("Deactivating user {}", id);

        let query = format!(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(IdentityError::NotFound)
    }

    async fn record_login(&self, id: Uuid) -> IdentityResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn permissions_for(&self, id: Uuid) -> IdentityResult<BTreeSet<String>> {
        let codenames: Vec<String> =
            sqlx::query_scalar("SELECT codename FROM user_permissions WHERE user_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_read_error)?;

        Ok(codenames.into_iter().collect())
    }

    async fn grant_permission(&self, id: Uuid, codename: &str) -> IdentityResult<()> {
        if self.find_by_id(id).await?.is_none() {
            return Err(IdentityError::NotFound);
        }

        info!("Granting {} to user {}", codename, id);

        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, codename)
            VALUES ($1, $2)
            ON CONFLICT (user_id, codename) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(codename)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }
}
