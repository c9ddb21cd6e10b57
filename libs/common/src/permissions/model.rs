//! Per-model CRUD permissions
//!
//! A [`PermissionMap`] says which permission codenames a method needs on a
//! resource type. Templates name the resource with `{app_label}` and
//! `{model_name}`, so `{app_label}.add_{model_name}` on `store.product`
//! becomes `store.add_product`.

use http::Method;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::{AccessPolicy, Principal, ResourceType};

/// Immutable mapping from method to required permission templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMap {
    entries: HashMap<Method, Vec<String>>,
}

impl PermissionMap {
    /// An empty map: every method is unmapped
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Reads need nothing; create, change and delete need the matching
    /// model permission
    pub fn model_defaults() -> Self {
        let none: [&str; 0] = [];
        Self::empty()
            .with_override(Method::GET, none)
            .with_override(Method::OPTIONS, none)
            .with_override(Method::HEAD, none)
            .with_override(Method::POST, ["{app_label}.add_{model_name}"])
            .with_override(Method::PUT, ["{app_label}.change_{model_name}"])
            .with_override(Method::PATCH, ["{app_label}.change_{model_name}"])
            .with_override(Method::DELETE, ["{app_label}.delete_{model_name}"])
    }

    /// A copy of this map with `method` mapped to `templates`
    pub fn with_override<I, S>(mut self, method: Method, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(method, templates.into_iter().map(Into::into).collect());
        self
    }

    /// Codenames `method` needs on `resource`, or `None` if the method is
    /// not mapped
    pub fn required_permissions(
        &self,
        method: &Method,
        resource: &ResourceType,
    ) -> Option<BTreeSet<String>> {
        self.entries.get(method).map(|templates| {
            templates
                .iter()
                .map(|t| {
                    t.replace("{app_label}", &resource.app_label)
                        .replace("{model_name}", &resource.model_name)
                })
                .collect()
        })
    }
}

impl Default for PermissionMap {
    fn default() -> Self {
        Self::model_defaults()
    }
}

/// Requires an authenticated principal holding every codename the map
/// names for the request method
#[derive(Debug, Clone, Default)]
pub struct ModelPermissions {
    map: Arc<PermissionMap>,
}

impl ModelPermissions {
    pub fn new(map: PermissionMap) -> Self {
        Self { map: Arc::new(map) }
    }

    /// The default map plus a view permission for `GET`
    pub fn full() -> Self {
        Self::new(
            PermissionMap::model_defaults()
                .with_override(Method::GET, ["{app_label}.view_{model_name}"]),
        )
    }

    pub fn map(&self) -> &PermissionMap {
        &self.map
    }

    pub fn required_permissions(
        &self,
        method: &Method,
        resource: &ResourceType,
    ) -> Option<BTreeSet<String>> {
        self.map.required_permissions(method, resource)
    }
}

impl AccessPolicy for ModelPermissions {
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool {
        if !principal.is_authenticated() || !principal.is_active {
            return false;
        }

        match self.required_permissions(method, resource) {
            Some(required) => principal.has_perms(&required),
            // An unmapped method is a 403 denial here, never a 405.
            None => {
                tracing::debug!(%method, %resource, "method has no permission mapping");
                false
            }
        }
    }
}
