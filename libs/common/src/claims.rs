//! Access token claims shared by the token issuer and its verifiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::permissions::Principal;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Login email
    pub email: String,
    /// Staff flag at issue time
    #[serde(default)]
    pub is_staff: bool,
    /// Superuser flag at issue time
    #[serde(default)]
    pub is_superuser: bool,
    /// Active flag at issue time. Absent means inactive.
    #[serde(default)]
    pub is_active: bool,
    /// Granted permission codenames
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal::user(claims.sub, claims.email)
            .with_staff(claims.is_staff)
            .with_superuser(claims.is_superuser)
            .with_active(claims.is_active)
            .with_permissions(claims.permissions)
    }
}
