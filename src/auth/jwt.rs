//! JWT Token Handler
//! Mission: Issue and verify signed, 24-hour session tokens

use crate::auth::models::{Claims, Identity};
use crate::clock::{Clock, SystemClock};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Fixed validity window for every issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Signing configuration, built once at startup.
///
/// Rotating the secret invalidates every token issued under the old one.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed token, wrong secret, or any altered byte.
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64, // seconds until expiration
}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_hours: i64,
    clock: Arc<dyn Clock>,
}

impl JwtHandler {
    /// Create a handler on the system clock
    pub fn new(config: TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            expiration_hours: TOKEN_TTL_HOURS,
            clock,
        }
    }

    /// Sign a token for an already-verified identity
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let ttl = Duration::hours(self.expiration_hours);
        let iat = now.timestamp();

        let claims = Claims {
            id: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            iat,
            exp: iat + ttl.num_seconds(),
        };

        debug!(
            "Issuing JWT for user {} ({}), expires in {}h",
            identity.email, identity.id, self.expiration_hours
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: ttl.num_seconds(),
        })
    }

    /// Check signature, then expiry, and hand back the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("JWT rejected: {}", e);
            TokenError::InvalidSignature
        })?;

        let claims = decoded.claims;
        if self.clock.now().timestamp() > claims.exp {
            debug!("JWT for user {} expired at {}", claims.id, claims.exp);
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    const ISSUED_AT: i64 = 1_700_000_000;

    fn config(secret: &str) -> TokenConfig {
        TokenConfig {
            secret: secret.to_string(),
        }
    }

    fn identity() -> Identity {
        Identity {
            id: 42,
            email: "student@ku.edu.np".to_string(),
            name: "Test Student".to_string(),
        }
    }

    fn fixed_handler(secret: &str) -> (JwtHandler, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::from_unix_secs(ISSUED_AT));
        let handler = JwtHandler::with_clock(config(secret), clock.clone());
        (handler, clock)
    }

    /// Replace the byte at `index` with a different base64url character.
    fn flip_at(token: &str, index: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let handler = JwtHandler::new(config("test-secret-key-12345"));
        let issued = handler.issue(&identity()).unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(issued.expires_in, 24 * 3600);

        let claims = handler.verify(&issued.token).unwrap();
        assert_eq!(claims.identity(), identity());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_claims_carry_issue_and_expiry_times() {
        let (handler, _clock) = fixed_handler("secret");
        let issued = handler.issue(&identity()).unwrap();
        let claims = handler.verify(&issued.token).unwrap();
        assert_eq!(claims.iat, ISSUED_AT);
        assert_eq!(claims.exp, ISSUED_AT + 24 * 3600);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let handler = JwtHandler::new(config("test-secret-key-12345"));
        assert_eq!(
            handler.verify("invalid.token.here"),
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(handler.verify(""), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new(config("secret1"));
        let handler2 = JwtHandler::new(config("secret2"));

        let issued = handler1.issue(&identity()).unwrap();
        assert_eq!(
            handler2.verify(&issued.token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_any_altered_payload_or_signature_byte_rejected() {
        let (handler, _clock) = fixed_handler("secret");
        let token = handler.issue(&identity()).unwrap().token;
        let header_end = token.find('.').unwrap();

        // Every position after the header, skipping the separator dot
        for index in header_end + 1..token.len() {
            if token.as_bytes()[index] == b'.' {
                continue;
            }
            let tampered = flip_at(&token, index);
            assert_eq!(
                handler.verify(&tampered),
                Err(TokenError::InvalidSignature),
                "byte {} altered but token still accepted",
                index
            );
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let (handler, clock) = fixed_handler("secret");
        let token = handler.issue(&identity()).unwrap().token;

        clock.advance(Duration::hours(24) - Duration::seconds(1));
        assert!(handler.verify(&token).is_ok());

        clock.advance(Duration::seconds(2));
        assert_eq!(handler.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_expired_token_reports_signature_first() {
        let (handler, clock) = fixed_handler("secret");
        let token = handler.issue(&identity()).unwrap().token;
        clock.advance(Duration::hours(48));

        let signature_start = token.rfind('.').unwrap() + 1;
        let tampered = flip_at(&token, signature_start + 5);
        assert_eq!(handler.verify(&tampered), Err(TokenError::InvalidSignature));
        assert_eq!(handler.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_config_debug_redacts_secret() {
        let debug = format!("{:?}", config("hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
