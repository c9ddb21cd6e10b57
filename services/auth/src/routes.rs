//! Authentication service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::error::{AccessDenied, IdentityError};
use common::permissions::{
    AccessPolicy, AccessPolicyExt, IsAuthenticated, IsStaff, ModelPermissions, Principal,
    ResourceType,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    middleware::CurrentUser,
    models::{LoginCredentials, NewUser, UpdateUser, User},
    repositories::authenticate,
    state::AppState,
};

/// Response for token generation
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request for a permission grant
#[derive(Deserialize)]
pub struct GrantPermissionRequest {
    pub codename: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/users", post(register))
        .route("/auth/users/:id/deactivate", post(deactivate_user))
        .route("/auth/users/:id/permissions", post(grant_permission))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me).patch(update_me))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state.users.create(&payload).await?;
    info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Login attempt for user: {}", payload.email);

    let user = authenticate(state.users.as_ref(), &payload).await?;
    let permissions = state.users.permissions_for(user.id).await?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user, &permissions)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    let response = TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

async fn load_active(state: &AppState, id: Uuid) -> Result<User, AuthError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AuthError::NotFound)?;

    if !user.is_active {
        return Err(IdentityError::Inactive.into());
    }

    Ok(user)
}

/// The caller as currently stored, so a deactivation or a changed flag takes
/// effect before the token expires
async fn actor_principal(state: &AppState, current: &CurrentUser) -> Result<Principal, AuthError> {
    let user = load_active(state, current.0.sub).await?;
    let permissions = state.users.permissions_for(user.id).await?;

    Ok(Principal::user(user.id, user.email)
        .with_staff(user.is_staff)
        .with_superuser(user.is_superuser)
        .with_active(user.is_active)
        .with_permissions(permissions))
}

/// Current user's profile
pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AuthError> {
    let user = load_active(&state, current.0.sub).await?;
    Ok(Json(user))
}

/// Update the current user's profile
pub async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<UpdateUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = load_active(&state, current.0.sub).await?;
    let user = state.users.update(user.id, &payload).await?;
    Ok(Json(user))
}

/// Deactivate a user. Staff only.
pub async fn deactivate_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    let principal = actor_principal(&state, &current).await?;
    IsAuthenticated.and(IsStaff).check(
        &principal,
        &Method::POST,
        &ResourceType::new("auth", "user"),
    )?;

    let user = state.users.deactivate(id).await?;
    info!("User {} deactivated by {}", id, current.0.sub);

    Ok(Json(user))
}

/// Grant a permission codename to a user. Needs `auth.add_permission`.
pub async fn grant_permission(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<GrantPermissionRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let principal = actor_principal(&state, &current).await?;
    ModelPermissions::default().check(
        &principal,
        &Method::POST,
        &ResourceType::new("auth", "permission"),
    )?;

    let codename = payload.codename.trim();
    if codename.is_empty() || !codename.contains('.') {
        return Err(AuthError::BadRequest(
            "codename must look like <app>.<action>_<model>".to_string(),
        ));
    }

    state.users.grant_permission(id, codename).await?;
    let permissions = state.users.permissions_for(id).await?;

    Ok(Json(json!({
        "user_id": id,
        "permissions": permissions,
    })))
}

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({"error": "Unauthorized"})),
            AuthError::Forbidden(denied) => {
                (StatusCode::FORBIDDEN, json!({"error": denied.to_string()}))
            }
            AuthError::NotFound => (StatusCode::NOT_FOUND, json!({"error": "Not found"})),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            AuthError::Identity(err) => identity_response(err),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Internal server error"}),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn identity_response(err: IdentityError) -> (StatusCode, serde_json::Value) {
    let message = err.to_string();

    if let Some(field) = err.field() {
        return (
            StatusCode::BAD_REQUEST,
            json!({"error": message.clone(), "fields": {field: [message]}}),
        );
    }

    match err {
        IdentityError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, json!({"error": message}))
        }
        IdentityError::Inactive => (StatusCode::FORBIDDEN, json!({"error": message})),
        IdentityError::NotFound => (StatusCode::NOT_FOUND, json!({"error": message})),
        other => {
            error!("Identity store failure: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Internal server error"}),
            )
        }
    }
}
