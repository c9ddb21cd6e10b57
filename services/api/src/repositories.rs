//! Repositories for database operations

pub mod customer;
pub mod product;

pub use customer::CustomerRepository;
pub use product::ProductRepository;
