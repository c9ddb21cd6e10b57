//! JWT service for access token generation and validation
//!
//! Tokens are signed with RS256. The private key stays with this service;
//! other services only need the public key to verify what it issues.

use anyhow::Result;
use common::claims::Claims;
use common::keys::read_key;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key for signing tokens (PEM format) or path to private key file
    /// - `JWT_PUBLIC_KEY`: Public key for verifying tokens (PEM format) or path to public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var("JWT_PRIVATE_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PRIVATE_KEY environment variable not set"))?;
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let private_key = read_key(&private_key)
            .map_err(|e| anyhow::anyhow!("Failed to read JWT_PRIVATE_KEY: {}", e))?;
        let public_key = read_key(&public_key)
            .map_err(|e| anyhow::anyhow!("Failed to read JWT_PUBLIC_KEY: {}", e))?;

        Ok(JwtConfig {
            private_key,
            public_key,
            access_token_expiry,
        })
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            access_token_expiry: config.access_token_expiry,
        })
    }

    /// Generate an access token carrying the user's flags and permissions
    pub fn generate_access_token(
        &self,
        user: &User,
        permissions: &BTreeSet<String>,
    ) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            is_active: user.is_active,
            permissions: permissions.clone(),
            iat: now,
            exp: now + self.access_token_expiry,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.access_token_expiry
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn test_service() -> JwtService {
        JwtService::new(JwtConfig {
            private_key: include_str!("../../../fixtures/jwt/test_private.pem").to_string(),
            public_key: include_str!("../../../fixtures/jwt/test_public.pem").to_string(),
            access_token_expiry: 900,
        })
        .expect("test keys are valid")
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            is_staff: true,
            is_superuser: false,
            is_active: true,
            last_login: None,
            date_joined: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_tokens_validate() {
        let service = test_service();
        let user = user();
        let perms: BTreeSet<String> = ["store.view_customer".to_string()].into();

        let token = service.generate_access_token(&user, &perms).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ada@example.com");
        assert!(claims.is_staff);
        assert!(claims.is_active);
        assert_eq!(claims.permissions, perms);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let service = test_service();
        let token = service
            .generate_access_token(&user(), &BTreeSet::new())
            .unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(service.validate_token(&tampered).is_err());
        assert!(service.validate_token("not.a.token").is_err());
    }
}
