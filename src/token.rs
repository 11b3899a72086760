use anyhow::Result;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: i32,

    pub email: String,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Outcome of verifying a presented token. Expiry is reported separately
/// from a bad signature or malformed token so the API can say why the
/// credential was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Valid(Claims),
    Expired,
    Invalid,
}

/// HS256 signing/verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenKeys {
    #[must_use]
    pub fn new(auth: &AuthConfig) -> Self {
        let hours = i64::try_from(auth.token_ttl_hours).unwrap_or(i64::MAX / 3600);
        Self {
            encoding: EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            ttl: chrono::Duration::hours(hours),
        }
    }

    pub fn issue(&self, user_id: i32, email: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    #[must_use]
    pub fn verify(&self, token: &str) -> TokenOutcome {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token one second past exp is expired.
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => TokenOutcome::Valid(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => TokenOutcome::Expired,
            Err(_) => TokenOutcome::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
        })
    }

    #[test]
    fn test_round_trip() {
        let keys = keys();
        let token = keys.issue(42, "amir@example.com").unwrap();

        match keys.verify(&token) {
            TokenOutcome::Valid(claims) => {
                assert_eq!(claims.sub, 42);
                assert_eq!(claims.email, "amir@example.com");
                assert!(claims.exp > claims.iat);
            }
            other => panic!("expected valid token, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_token() {
        let keys = keys();
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: 7,
            email: "old@example.com".to_string(),
            iat: (now - chrono::Duration::hours(2)).timestamp(),
            exp: (now - chrono::Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(keys.verify(&token), TokenOutcome::Expired);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let other = TokenKeys::new(&AuthConfig {
            jwt_secret: "different".to_string(),
            token_ttl_hours: 1,
        });
        let token = other.issue(1, "x@example.com").unwrap();

        assert_eq!(keys().verify(&token), TokenOutcome::Invalid);
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(keys().verify("not-a-token"), TokenOutcome::Invalid);
    }
}
