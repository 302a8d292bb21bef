//! JWT issuance and verification.
//!
//! Access and refresh tokens are signed with two distinct asymmetric key
//! pairs, read once from PEM files at startup. There is no revocation list:
//! an issued access token stays valid until its natural expiry.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Claims, User},
};

#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenService {
    /// Load the four key files named in the configuration. Any missing or
    /// malformed key is fatal here, before the server starts listening.
    pub fn from_config(config: &AuthConfig) -> AppResult<Self> {
        let algorithm: Algorithm = config
            .algorithm
            .parse()
            .map_err(|e| AppError::Internal(format!("Unknown token algorithm: {}", e)))?;

        let read = |path: &str| {
            std::fs::read(path)
                .map_err(|e| AppError::Internal(format!("Failed to read key file {}: {}", path, e)))
        };

        Self::from_pems(
            &read(&config.access_private_key)?,
            &read(&config.access_public_key)?,
            &read(&config.refresh_private_key)?,
            &read(&config.refresh_public_key)?,
            algorithm,
            chrono::Duration::minutes(config.access_expiry_minutes),
            chrono::Duration::days(config.refresh_expiry_days),
        )
    }

    pub fn from_pems(
        access_private: &[u8],
        access_public: &[u8],
        refresh_private: &[u8],
        refresh_public: &[u8],
        algorithm: Algorithm,
        access_ttl: chrono::Duration,
        refresh_ttl: chrono::Duration,
    ) -> AppResult<Self> {
        let key_error = |e: jsonwebtoken::errors::Error| {
            AppError::Internal(format!("Invalid PEM key material: {}", e))
        };

        Ok(Self {
            algorithm,
            access_encoding: EncodingKey::from_rsa_pem(access_private).map_err(key_error)?,
            access_decoding: DecodingKey::from_rsa_pem(access_public).map_err(key_error)?,
            refresh_encoding: EncodingKey::from_rsa_pem(refresh_private).map_err(key_error)?,
            refresh_decoding: DecodingKey::from_rsa_pem(refresh_public).map_err(key_error)?,
            access_ttl,
            refresh_ttl,
        })
    }

    /// Sign a short-lived access token for a user
    pub fn sign_access_token(&self, user: &User) -> AppResult<String> {
        self.sign(&Claims::new(user, self.access_ttl), &self.access_encoding)
    }

    /// Sign a long-lived refresh token for a user
    pub fn sign_refresh_token(&self, user: &User) -> AppResult<String> {
        self.sign(&Claims::new(user, self.refresh_ttl), &self.refresh_encoding)
    }

    /// Verify signature and expiry of an access token
    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, &self.access_decoding, "access")
    }

    /// Verify signature and expiry of a refresh token
    pub fn verify_refresh_token(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, &self.refresh_decoding, "refresh")
    }

    fn sign(&self, claims: &Claims, key: &EncodingKey) -> AppResult<String> {
        encode(&Header::new(self.algorithm), claims, key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str, key: &DecodingKey, kind: &str) -> AppResult<Claims> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, key, &validation).map_err(|e| {
            tracing::warn!("Invalid {} token: {}", kind, e);
            AppError::Authentication("invalid or expired token".to_string())
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::Utc;
    use uuid::Uuid;

    const ACCESS_PRIVATE: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/keys/access_private.pem"));
    const ACCESS_PUBLIC: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/keys/access_public.pem"));
    const REFRESH_PRIVATE: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/keys/refresh_private.pem"));
    const REFRESH_PUBLIC: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/keys/refresh_public.pem"));

    fn service() -> TokenService {
        TokenService::from_pems(
            ACCESS_PRIVATE,
            ACCESS_PUBLIC,
            REFRESH_PRIVATE,
            REFRESH_PUBLIC,
            Algorithm::RS256,
            chrono::Duration::minutes(15),
            chrono::Duration::days(7),
        )
        .unwrap()
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            password: "hash".to_string(),
            role: Role::Member,
            loan_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trip() {
        let service = service();
        let user = sample_user();

        let token = service.sign_access_token(&user).unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::Member);
    }

    #[test]
    fn refresh_token_is_not_a_valid_access_token() {
        let service = service();
        let user = sample_user();

        let refresh = service.sign_refresh_token(&user).unwrap();
        assert!(service.verify_refresh_token(&refresh).is_ok());
        // Signed with the refresh key pair, must not verify as access.
        assert!(service.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = service();
        let token = service.sign_access_token(&sample_user()).unwrap();

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(service.verify_access_token(&tampered).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::from_pems(
            ACCESS_PRIVATE,
            ACCESS_PUBLIC,
            REFRESH_PRIVATE,
            REFRESH_PUBLIC,
            Algorithm::RS256,
            // Already expired, beyond the default validation leeway.
            chrono::Duration::minutes(-5),
            chrono::Duration::days(7),
        )
        .unwrap();

        let token = service.sign_access_token(&sample_user()).unwrap();
        assert!(service.verify_access_token(&token).is_err());
    }
}
