//! Application state shared across handlers

use std::sync::Arc;

use crate::{jwt::JwtService, repositories::UserStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub jwt_service: JwtService,
}
