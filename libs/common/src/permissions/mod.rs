//! Access policies evaluated before a request reaches its handler
//!
//! Every policy answers one question: may this principal call this method on
//! this kind of resource? Policies hold no mutable state and can be shared
//! across worker threads as `Arc<dyn AccessPolicy>`. They compose with
//! [`AccessPolicyExt::and`], [`AccessPolicyExt::or`] and
//! [`AccessPolicyExt::not`].

use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::AccessDenied;

mod model;
mod staff;

pub use model::{ModelPermissions, PermissionMap};
pub use staff::{IsStaff, IsStaffOrReadOnly};

/// Methods that never mutate server state
pub const SAFE_METHODS: [Method; 3] = [Method::GET, Method::HEAD, Method::OPTIONS];

/// Whether `method` is one of [`SAFE_METHODS`]
pub fn is_safe_method(method: &Method) -> bool {
    SAFE_METHODS.contains(method)
}

/// The actor behind a request, authenticated or anonymous
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub permissions: BTreeSet<String>,
}

impl Principal {
    /// A caller that presented no credentials
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An active user with no flags and no permissions
    pub fn user(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            email: Some(email.into()),
            is_active: true,
            ..Self::default()
        }
    }

    pub fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Whether the principal holds `codename`. Active superusers hold every
    /// permission, inactive principals hold none.
    pub fn has_perm(&self, codename: &str) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_superuser || self.permissions.contains(codename)
    }

    /// Whether the principal holds every codename in `codenames`
    pub fn has_perms<'a, I>(&self, codenames: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        codenames.into_iter().all(|c| self.has_perm(c))
    }
}

/// The kind of resource a request targets, e.g. `store.product`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceType {
    pub app_label: String,
    pub model_name: String,
}

impl ResourceType {
    /// Model names are lower-cased, so `("catalog", "Product")` and
    /// `("catalog", "product")` are the same resource.
    pub fn new(app_label: impl Into<String>, model_name: impl AsRef<str>) -> Self {
        Self {
            app_label: app_label.into(),
            model_name: model_name.as_ref().to_lowercase(),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

/// A per-request access decision
pub trait AccessPolicy: Send + Sync {
    /// Whether `principal` may call `method` on `resource`
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool;

    /// Like [`AccessPolicy::allow`], as a `Result`
    fn check(
        &self,
        principal: &Principal,
        method: &Method,
        resource: &ResourceType,
    ) -> Result<(), AccessDenied> {
        if self.allow(principal, method, resource) {
            Ok(())
        } else {
            Err(AccessDenied)
        }
    }
}

impl<P: AccessPolicy + ?Sized> AccessPolicy for std::sync::Arc<P> {
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool {
        (**self).allow(principal, method, resource)
    }
}

impl<P: AccessPolicy + ?Sized> AccessPolicy for Box<P> {
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool {
        (**self).allow(principal, method, resource)
    }
}

/// Combinators for building policies out of smaller ones
pub trait AccessPolicyExt: AccessPolicy + Sized {
    /// Both policies must allow
    fn and<R: AccessPolicy>(self, other: R) -> And<Self, R> {
        And(self, other)
    }

    /// Either policy may allow
    fn or<R: AccessPolicy>(self, other: R) -> Or<Self, R> {
        Or(self, other)
    }

    /// Allow exactly what this policy denies
    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<P: AccessPolicy> AccessPolicyExt for P {}

#[derive(Debug, Clone, Copy)]
pub struct And<L, R>(pub L, pub R);

impl<L: AccessPolicy, R: AccessPolicy> AccessPolicy for And<L, R> {
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool {
        self.0.allow(principal, method, resource) && self.1.allow(principal, method, resource)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Or<L, R>(pub L, pub R);

impl<L: AccessPolicy, R: AccessPolicy> AccessPolicy for Or<L, R> {
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool {
        self.0.allow(principal, method, resource) || self.1.allow(principal, method, resource)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Not<P>(pub P);

impl<P: AccessPolicy> AccessPolicy for Not<P> {
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool {
        !self.0.allow(principal, method, resource)
    }
}

/// Allows every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAny;

impl AccessPolicy for AllowAny {
    fn allow(&self, _principal: &Principal, _method: &Method, _resource: &ResourceType) -> bool {
        true
    }
}

/// Allows any authenticated principal
#[derive(Debug, Clone, Copy, Default)]
pub struct IsAuthenticated;

impl AccessPolicy for IsAuthenticated {
    fn allow(&self, principal: &Principal, _method: &Method, _resource: &ResourceType) -> bool {
        principal.is_authenticated()
    }
}
