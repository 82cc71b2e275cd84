//! JWT claims structure for session tokens.

use serde::{Deserialize, Serialize};

/// Claims embedded in a session token. Only the user id is bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (user ID).
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// The user id in `sub`, if it is numeric.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}
