//! API models for request and response payloads

use serde::Deserialize;

pub mod customer;
pub mod product;

/// Query parameters accepted by paginated listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-based) or `last`
    pub page: Option<String>,
}
