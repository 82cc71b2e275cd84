//! Authentication and authorization of callers.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use super::jwt::{JwtManager, SessionToken};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{DatabaseError, TicketDatabase};

const NOT_AUTHORIZED: &str = "Not authorized. Try login again.";

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
}

/// Filter in front of every ticket operation. Reads users, never writes them.
#[derive(Clone)]
pub struct AccessGuard {
    db: TicketDatabase,
    jwt: Arc<JwtManager>,
}

impl AccessGuard {
    pub const fn new(db: TicketDatabase, jwt: Arc<JwtManager>) -> Self {
        Self { db, jwt }
    }

    /// Sign a time-limited session token binding only `user_id`.
    pub fn issue_session(&self, user_id: i64) -> ServiceResult<SessionToken> {
        self.jwt
            .issue(user_id)
            .map_err(|e| ServiceError::Internal(format!("Token creation failed: {e}")))
    }

    /// Resolve the caller from a session token.
    ///
    /// The principal is re-read from the store on every call, so deleting,
    /// deactivating, promoting, or demoting a user applies to the very next
    /// request.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: Option<&str>) -> ServiceResult<Principal> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::unauthorized(NOT_AUTHORIZED))?;

        let claims = self.jwt.validate(token).map_err(|e| {
            debug!(error = %e, "Session token rejected");
            ServiceError::unauthorized(NOT_AUTHORIZED)
        })?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| ServiceError::unauthorized(NOT_AUTHORIZED))?;

        let user = match self.db.get_user(user_id).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => {
                debug!(user_id, "Session subject no longer exists");
                return Err(ServiceError::unauthorized(
                    "User not found. Try login again.",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            return Err(ServiceError::unauthorized(
                "User account has been deactivated, contact the administrator",
            ));
        }

        Ok(Principal {
            user_id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        })
    }

    /// Reject principals without admin rights. No store access.
    pub fn authorize_admin(principal: &Principal) -> ServiceResult<()> {
        if principal.is_admin {
            Ok(())
        } else {
            Err(ServiceError::forbidden(
                "Not authorized as admin. Try login as admin.",
            ))
        }
    }
}
