//! Authentication and authorization middleware
//!
//! [`authenticate`] turns an optional bearer token into a [`Principal`] in
//! the request extensions; a request without a token proceeds as anonymous.
//! [`authorize`] then runs the route's access policy before the handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common::claims::Claims;
use common::keys::read_key;
use common::permissions::{AccessPolicy, Principal, ResourceType};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::ApiError;

/// Verifies access tokens issued by the authentication service. Only the
/// public half of the signing key pair is needed here.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from `JWT_PUBLIC_KEY`, inline PEM or a path to one
    pub fn from_env() -> anyhow::Result<Self> {
        let setting = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;
        let pem = read_key(&setting)
            .map_err(|e| anyhow::anyhow!("Failed to read JWT_PUBLIC_KEY: {}", e))?;
        Ok(Self::new(&pem)?)
    }

    pub fn new(public_key_pem: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }
}

/// Resolve the caller and store it as a [`Principal`] extension
pub async fn authenticate(
    State(verifier): State<TokenVerifier>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = match req.headers().get(axum::http::header::AUTHORIZATION) {
        None => Principal::anonymous(),
        Some(value) => {
            let token = value
                .to_str()
                .ok()
                .and_then(|header| header.strip_prefix("Bearer "))
                .ok_or(ApiError::Unauthorized)?;

            let claims = verifier.verify(token).map_err(|e| {
                warn!("Failed to validate token: {}", e);
                ApiError::Unauthorized
            })?;

            Principal::from(claims)
        }
    };

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// The access policy guarding one resource type
#[derive(Clone)]
pub struct Guard {
    policy: Arc<dyn AccessPolicy>,
    resource: ResourceType,
}

impl Guard {
    pub fn new(policy: impl AccessPolicy + 'static, resource: ResourceType) -> Self {
        Self {
            policy: Arc::new(policy),
            resource,
        }
    }
}

/// Reject the request before dispatch unless the guard's policy allows it
pub async fn authorize(
    State(guard): State<Guard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(principal) = req.extensions().get::<Principal>() else {
        error!("authorize ran without authenticate");
        return Err(ApiError::InternalServerError);
    };

    if let Err(denied) = guard.policy.check(principal, req.method(), &guard.resource) {
        debug!(
            method = %req.method(),
            resource = %guard.resource,
            user = ?principal.user_id,
            "request denied"
        );
        return Err(denied.into());
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::any};
    use common::permissions::{IsStaffOrReadOnly, ModelPermissions};
    use jsonwebtoken::{EncodingKey, Header};
    use std::collections::BTreeSet;
    use tower::ServiceExt as _;
    use uuid::Uuid;

    pub(crate) fn test_verifier() -> TokenVerifier {
        TokenVerifier::new(include_str!("../../../fixtures/jwt/test_public.pem"))
            .expect("test key is valid")
    }

    pub(crate) fn claims_for(is_staff: bool, permissions: &[&str]) -> Claims {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        Claims {
            sub: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            is_staff,
            is_superuser: false,
            is_active: true,
            permissions: permissions
                .iter()
                .map(|p| p.to_string())
                .collect::<BTreeSet<_>>(),
            iat: now,
            exp: now + 300,
        }
    }

    pub(crate) fn sign(claims: &Claims) -> String {
        let key =
            EncodingKey::from_rsa_pem(include_str!("../../../fixtures/jwt/test_private.pem").as_bytes())
                .unwrap();
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    pub(crate) fn token_for(is_staff: bool, permissions: &[&str]) -> String {
        sign(&claims_for(is_staff, permissions))
    }

    fn guarded(guard: Guard) -> Router {
        Router::new()
            .route("/resource", any(|| async { "handled" }))
            .route_layer(middleware::from_fn_with_state(guard, authorize))
            .layer(middleware::from_fn_with_state(test_verifier(), authenticate))
    }

    async fn call(app: Router, method: &str, token: Option<&str>) -> StatusCode {
        let mut request = axum::http::Request::builder().method(method).uri("/resource");
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    fn product_guard() -> Guard {
        Guard::new(IsStaffOrReadOnly, ResourceType::new("store", "product"))
    }

    #[tokio::test]
    async fn anonymous_delete_is_denied_and_get_is_allowed() {
        assert_eq!(
            call(guarded(product_guard()), "DELETE", None).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            call(guarded(product_guard()), "GET", None).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn staff_token_may_write() {
        let staff = token_for(true, &[]);
        let customer = token_for(false, &[]);

        assert_eq!(
            call(guarded(product_guard()), "POST", Some(&staff)).await,
            StatusCode::OK
        );
        assert_eq!(
            call(guarded(product_guard()), "POST", Some(&customer)).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn view_permission_is_needed_to_read() {
        let guard = || Guard::new(ModelPermissions::full(), ResourceType::new("store", "customer"));
        let viewer = token_for(false, &["store.view_customer"]);
        let stranger = token_for(false, &[]);

        assert_eq!(
            call(guarded(guard()), "GET", Some(&viewer)).await,
            StatusCode::OK
        );
        assert_eq!(
            call(guarded(guard()), "GET", Some(&stranger)).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(call(guarded(guard()), "GET", None).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn bad_tokens_are_unauthorized() {
        assert_eq!(
            call(guarded(product_guard()), "GET", Some("garbage")).await,
            StatusCode::UNAUTHORIZED
        );

        let request = axum::http::Request::builder()
            .uri("/resource")
            .header("authorization", "Basic abc")
            .body(Body::empty())
            .unwrap();
        let status = guarded(product_guard())
            .oneshot(request)
            .await
            .unwrap()
            .status();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }


    #[tokio::test]
    async fn inactive_claims_are_denied() {
        let staff = sign(&Claims {
            is_active: false,
            ..claims_for(true, &[])
        });
        assert_eq!(
            call(guarded(product_guard()), "DELETE", Some(&staff)).await,
            StatusCode::FORBIDDEN
        );
        // Reads stay open, as for anyone else
        assert_eq!(
            call(guarded(product_guard()), "GET", Some(&staff)).await,
            StatusCode::OK
        );

        let viewer = sign(&Claims {
            is_active: false,
            ..claims_for(false, &["store.view_customer"])
        });
        let customers = Guard::new(ModelPermissions::full(), ResourceType::new("store", "customer"));
        assert_eq!(
            call(guarded(customers), "GET", Some(&viewer)).await,
            StatusCode::FORBIDDEN
        );
    }
}
