//! Custom error types for the common library
//!
//! This module defines the error types shared by the storefront services:
//! database plumbing, identity rules, pagination and access decisions.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised while creating, updating or authenticating a user
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The email is empty or not a valid address
    #[error("{0}")]
    InvalidEmail(String),

    /// The password does not meet the strength rules
    #[error("{0}")]
    WeakPassword(String),

    /// Another user already holds this email
    #[error("user with this email already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account has been deactivated
    #[error("user account is disabled")]
    Inactive,

    /// No user with the given id
    #[error("user not found")]
    NotFound,

    /// Password hashing failed
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Underlying store failure
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl IdentityError {
    /// Name of the input field the error belongs to, if it is field-level
    pub fn field(&self) -> Option<&'static str> {
        match self {
            IdentityError::InvalidEmail(_) | IdentityError::DuplicateEmail => {
                Some(crate::identity::USERNAME_FIELD)
            }
            IdentityError::WeakPassword(_) => Some("password"),
            _ => None,
        }
    }
}

/// Type alias for Result with IdentityError
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors raised while resolving a page of a listing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    /// The requested page is not a number, is below 1 or past the last page
    #[error("Invalid page.")]
    InvalidPage,
}

/// An access policy refused the request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("You do not have permission to perform this action.")]
pub struct AccessDenied;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_errors_report_their_field() {
        assert_eq!(IdentityError::DuplicateEmail.field(), Some("email"));
        assert_eq!(
            IdentityError::InvalidEmail("Email is required".to_string()).field(),
            Some("email")
        );
        assert_eq!(
            IdentityError::WeakPassword("too short".to_string()).field(),
            Some("password")
        );
        assert_eq!(IdentityError::InvalidCredentials.field(), None);
        assert_eq!(IdentityError::Inactive.field(), None);
    }

    #[test]
    fn invalid_page_message() {
        assert_eq!(PaginationError::InvalidPage.to_string(), "Invalid page.");
    }
}
