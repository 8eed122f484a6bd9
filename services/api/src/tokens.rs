//! services/api/src/tokens.rs
//!
//! The session issuer: mints and validates the bearer tokens that every
//! authenticated endpoint requires. Tokens are self-contained signed claims
//! of `{subject, expiry}`; nothing is stored server-side.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The signature did not verify, the token has expired, or the subject
    /// is missing. Deliberately carries no further detail.
    #[error("invalid authentication credentials")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues and validates signed bearer tokens bound to a username.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer from the configured signing secret and lifetime.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Produces a signed token encoding `{subject: username, expires_at: now + ttl}`.
    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        let claims = Claims {
            sub: username.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Resolves a token back to its username.
    ///
    /// Fails if the signature does not verify, the expiry has passed, or the
    /// subject is empty. Expiry is checked with zero leeway.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.sub.is_empty() {
            return Err(TokenError::Invalid);
        }
        Ok(data.claims.sub)
    }
}
