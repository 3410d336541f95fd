use anyhow::{Context, bail};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::JwtSettings,
    dto::account::Claims,
    error::{AppError, AppResult},
};

const REFRESH_TOKEN_BYTES: usize = 64;
const ONE_TIME_TOKEN_BYTES: usize = 32;

/// Mints and verifies bearer credentials.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
}

impl TokenService {
    pub fn new(settings: &JwtSettings) -> anyhow::Result<Self> {
        if settings.key.trim().is_empty() {
            bail!("JWT signing key is not configured");
        }
        if settings.issuer.is_empty() || settings.audience.is_empty() {
            bail!("JWT issuer and audience must be configured");
        }
        let access_token_ttl = Duration::try_minutes(settings.access_token_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .context("JWT access token lifetime is invalid")?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.key.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.key.as_bytes()),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            access_token_ttl,
        })
    }

    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
    ) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.access_token_ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Opaque random secret with no embedded claims.
    pub fn generate_refresh_token(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// URL-safe secret for emailed links (confirmation, password reset).
    pub fn generate_one_time_token(&self) -> String {
        let mut bytes = [0u8; ONE_TIME_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Checks signature, issuer, audience and expiry.
    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["sub", "iss", "aud", "exp"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::bad_request("Invalid or expired token"))
    }
}

/// Digest under which secrets are persisted; the clear value never hits the store.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            key: "unit-test-signing-key-with-enough-length".into(),
            issuer: "dealer-adapt".into(),
            audience: "dealer-adapt-clients".into(),
            access_token_minutes: 60,
        }
    }

    #[test]
    fn missing_key_is_a_startup_error() {
        let mut bad = settings();
        bad.key = "  ".into();
        assert!(TokenService::new(&bad).is_err());
    }

    #[test]
    fn access_token_round_trips_identity_and_role() {
        let tokens = TokenService::new(&settings()).unwrap();
        let user_id = Uuid::new_v4();
        let token = tokens
            .generate_access_token(user_id, "owner@example.com", "BusinessOwner")
            .unwrap();

        let claims = tokens.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "owner@example.com");
        assert_eq!(claims.role, "BusinessOwner");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_wrong_audience_and_issuer() {
        let tokens = TokenService::new(&settings()).unwrap();
        let token = tokens
            .generate_access_token(Uuid::new_v4(), "a@example.com", "")
            .unwrap();

        let mut other_audience = settings();
        other_audience.audience = "someone-else".into();
        let verifier = TokenService::new(&other_audience).unwrap();
        assert!(verifier.verify_access_token(&token).is_err());

        let mut other_issuer = settings();
        other_issuer.issuer = "impostor".into();
        let verifier = TokenService::new(&other_issuer).unwrap();
        assert!(verifier.verify_access_token(&token).is_err());
    }

    #[test]
    fn rejects_expired_and_tampered_tokens() {
        let cfg = settings();
        let tokens = TokenService::new(&cfg).unwrap();
        let past = Utc::now().timestamp() - 3600;
        let expired = encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: Uuid::new_v4().to_string(),
                email: "a@example.com".into(),
                role: String::new(),
                iss: cfg.issuer.clone(),
                aud: cfg.audience.clone(),
                iat: past - 60,
                exp: past,
            },
            &EncodingKey::from_secret(cfg.key.as_bytes()),
        )
        .unwrap();
        assert!(tokens.verify_access_token(&expired).is_err());

        let valid = tokens
            .generate_access_token(Uuid::new_v4(), "a@example.com", "")
            .unwrap();
        let mut tampered = valid.clone();
        tampered.push('x');
        assert!(tokens.verify_access_token(&tampered).is_err());
        assert!(tokens.verify_access_token("not-a-jwt").is_err());
    }

    #[test]
    fn refresh_tokens_are_random_and_opaque() {
        let tokens = TokenService::new(&settings()).unwrap();
        let first = tokens.generate_refresh_token();
        let second = tokens.generate_refresh_token();
        assert_ne!(first, second);
        assert_eq!(STANDARD.decode(&first).unwrap().len(), REFRESH_TOKEN_BYTES);
        assert!(tokens.verify_access_token(&first).is_err());

        let link_token = tokens.generate_one_time_token();
        assert!(link_token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn secrets_are_stored_as_hex_digests() {
        let digest = hash_secret("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_secret("abc"));
        assert_ne!(digest, hash_secret("abd"));
    }
}
