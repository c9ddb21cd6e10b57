//! Common library for the storefront services
//!
//! This crate provides the policy units shared by the services: the
//! email-based identity rules, page-number pagination and the access
//! policies evaluated before a handler runs. It also carries database
//! connectivity and the shared error types.

pub mod claims;
pub mod database;
pub mod error;
pub mod identity;
pub mod keys;
pub mod pagination;
pub mod permissions;
