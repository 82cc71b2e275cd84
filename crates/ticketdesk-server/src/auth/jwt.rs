//! Session token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use ticketdesk_core::db::unix_timestamp;

use super::claims::Claims;

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: i64,
    pub ttl_secs: i64,
}

/// Manages session token creation and validation (HS256).
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtManager {
    /// Create a new `JwtManager` with the given secret and validity window.
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a session token for the given user.
    pub fn issue(&self, user_id: i64) -> Result<SessionToken, jsonwebtoken::errors::Error> {
        let now = unix_timestamp();
        let exp = now + self.ttl_secs;

        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(SessionToken {
            token,
            expires_at: exp,
            ttl_secs: self.ttl_secs,
        })
    }

    /// Validate a token's signature and expiry and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_jwt() -> JwtManager {
        JwtManager::new(b"test-secret-key-for-testing", 3600)
    }

    #[test]
    fn issue_and_validate_token() {
        let jwt = test_jwt();
        let session = jwt.issue(42).unwrap();
        assert_eq!(session.ttl_secs, 3600);

        let claims = jwt.validate(&session.token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.exp, session.expires_at);
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let jwt = test_jwt();
        let a = jwt.issue(1).unwrap();
        let b = jwt.issue(1).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn invalid_token_fails_validation() {
        let jwt = test_jwt();
        assert!(jwt.validate("not-a-valid-token").is_err());
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let jwt1 = test_jwt();
        let jwt2 = JwtManager::new(b"different-secret", 3600);

        let session = jwt1.issue(1).unwrap();
        assert!(jwt2.validate(&session.token).is_err());
    }

    #[test]
    fn expired_token_fails_validation() {
        // Well past the default 60s leeway.
        let jwt = JwtManager::new(b"test-secret-key-for-testing", -3600);
        let session = jwt.issue(1).unwrap();
        assert!(jwt.validate(&session.token).is_err());
    }
}
