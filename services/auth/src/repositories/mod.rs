//! User stores
//!
//! [`UserStore`] is implemented by [`PgUserStore`] for PostgreSQL and by
//! [`MemoryUserStore`] for tests and throwaway deployments. Both normalize
//! emails before storing or comparing them and both reject a second account
//! for the same address with [`IdentityError::DuplicateEmail`].

use async_trait::async_trait;
use common::error::{IdentityError, IdentityResult};
use common::identity::normalize_email;
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

use crate::models::{LoginCredentials, NewUser, UpdateUser, User};

pub mod memory;
pub mod user;

pub use memory::MemoryUserStore;
pub use user::PgUserStore;

/// Durable storage for users and their permission grants
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. Fails with `DuplicateEmail` if the normalized email is
    /// taken.
    async fn create(&self, new_user: &NewUser) -> IdentityResult<User>;

    /// Find a user by email, compared case-insensitively
    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> IdentityResult<Option<User>>;

    /// Apply a profile update. Fails with `DuplicateEmail` if another user
    /// holds the new email.
    async fn update(&self, id: Uuid, changes: &UpdateUser) -> IdentityResult<User>;

    /// Clear the active flag. Users are never deleted.
    async fn deactivate(&self, id: Uuid) -> IdentityResult<User>;

    /// Stamp the last successful login
    async fn record_login(&self, id: Uuid) -> IdentityResult<()>;

    async fn permissions_for(&self, id: Uuid) -> IdentityResult<BTreeSet<String>>;

    /// Grant a permission codename. Granting twice is a no-op.
    async fn grant_permission(&self, id: Uuid, codename: &str) -> IdentityResult<()>;
}

/// Check credentials and return the matching active user
pub async fn authenticate(
    store: &dyn UserStore,
    credentials: &LoginCredentials,
) -> IdentityResult<User> {
    let email = normalize_email(&credentials.email);

    let user = store
        .find_by_email(&email)
        .await?
        .ok_or(IdentityError::InvalidCredentials)?;

    if !user.verify_password(&credentials.password)? {
        info!("Rejected login for {}", email);
        return Err(IdentityError::InvalidCredentials);
    }

    if !user.is_active {
        info!("Rejected login for inactive user {}", user.id);
        return Err(IdentityError::Inactive);
    }

    store.record_login(user.id).await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn authenticate_by_email_any_case() {
        let store = MemoryUserStore::new();
        let user = store
            .create(&NewUser::new("ada@example.com", "Sup3r$ecret"))
            .await
            .unwrap();

        let found = authenticate(&store, &credentials("ADA@example.com", "Sup3r$ecret"))
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        let stamped = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stamped.last_login.is_some());
    }

    #[tokio::test]
    async fn authenticate_rejects_bad_credentials() {
        let store = MemoryUserStore::new();
        store
            .create(&NewUser::new("ada@example.com", "Sup3r$ecret"))
            .await
            .unwrap();

        assert!(matches!(
            authenticate(&store, &credentials("ada@example.com", "Wr0ng$pass")).await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, &credentials("bob@example.com", "Sup3r$ecret")).await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_inactive_users() {
        let store = MemoryUserStore::new();
        let user = store
            .create(&NewUser::new("ada@example.com", "Sup3r$ecret"))
            .await
            .unwrap();
        store.deactivate(user.id).await.unwrap();

        assert!(matches!(
            authenticate(&store, &credentials("ada@example.com", "Sup3r$ecret")).await,
            Err(IdentityError::Inactive)
        ));
    }
}
