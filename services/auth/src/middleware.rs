//! Bearer token authentication for the identity endpoints

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::claims::Claims;
use tracing::warn;

use crate::{routes::AuthError, state::AppState};

/// The caller identified by a valid access token. Flags in the claims
/// are as of issue time; handlers that act on them reload the user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::Unauthorized)?;

        let claims = state
            .jwt_service
            .validate_token(bearer.token())
            .map_err(|e| {
                warn!("Failed to validate token: {}", e);
                AuthError::Unauthorized
            })?;

        Ok(CurrentUser(claims))
    }
}
