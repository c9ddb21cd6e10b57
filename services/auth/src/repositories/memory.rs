//! In-process user store

use async_trait::async_trait;
use chrono::Utc;
use common::error::{IdentityError, IdentityResult};
use common::identity::{hash_password, normalize_email};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, UpdateUser, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    permissions: HashMap<Uuid, BTreeSet<String>>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// User store kept in memory. Uniqueness checks and writes happen under one
/// write lock.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: &NewUser) -> IdentityResult<User> {
        let email = new_user.validate()?;
        let password_hash = hash_password(&new_user.password)?;

        let mut tables = self.tables.write().await;
        if tables.email_taken(&email, None) {
            return Err(IdentityError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
            is_active: true,
            last_login: None,
            date_joined: now,
            updated_at: now,
        };

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<User>> {
        let email = normalize_email(email);
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> IdentityResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: &UpdateUser) -> IdentityResult<User> {
        let email = changes.validate()?;
        let password_hash = changes
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let mut tables = self.tables.write().await;
        if let Some(email) = &email {
            if tables.email_taken(email, Some(id)) {
                return Err(IdentityError::DuplicateEmail);
            }
        }

        let user = tables.users.get_mut(&id).ok_or(IdentityError::NotFound)?;
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(first_name) = &changes.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(password_hash) = password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn deactivate(&self, id: Uuid) -> IdentityResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(IdentityError::NotFound)?;
        user.is_active = false;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn record_login(&self, id: Uuid) -> IdentityResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(IdentityError::NotFound)?;
        user.last_login = Some(Utc::now());
        Ok(())
    }

    async fn permissions_for(&self, id: Uuid) -> IdentityResult<BTreeSet<String>> {
        let tables = self.tables.read().await;
        Ok(tables.permissions.get(&id).cloned().unwrap_or_default())
    }

    async fn grant_permission(&self, id: Uuid, codename: &str) -> IdentityResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(IdentityError::NotFound);
        }
        tables
            .permissions
            .entry(id)
            .or_default()
            .insert(codename.to_string());
        Ok(())
    }
}
