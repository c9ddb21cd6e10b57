use http::Method;

use super::{AccessPolicy, Principal, ResourceType, is_safe_method};

/// Allows active, authenticated staff members only
#[derive(Debug, Clone, Copy, Default)]
pub struct IsStaff;

impl AccessPolicy for IsStaff {
    fn allow(&self, principal: &Principal, _method: &Method, _resource: &ResourceType) -> bool {
        principal.is_authenticated() && principal.is_active && principal.is_staff
    }
}

/// Anyone may read; only authenticated staff may write
#[derive(Debug, Clone, Copy, Default)]
pub struct IsStaffOrReadOnly;

impl AccessPolicy for IsStaffOrReadOnly {
    fn allow(&self, principal: &Principal, method: &Method, resource: &ResourceType) -> bool {
        is_safe_method(method) || IsStaff.allow(principal, method, resource)
    }
}
