//! Application state shared across handlers

use common::pagination::PageNumberPagination;
use url::Url;

use crate::repositories::{CustomerRepository, ProductRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub product_repository: ProductRepository,
    pub customer_repository: CustomerRepository,
    pub pagination: PageNumberPagination,
    pub public_base_url: Url,
}
