//! Request extractors for the session principal and for input bodies whose
//! rejections should use the API error shape.

use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::http::request::Parts;

use super::error::ApiError;
use super::state::AppState;
use crate::auth::{AccessGuard, Principal};

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = state.cookies.token_from(&parts.headers);
        let principal = state.guard.authenticate(token.as_deref()).await?;
        Ok(Self(principal))
    }
}

/// An authenticated caller with admin rights.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        AccessGuard::authorize_admin(&principal)?;
        Ok(Self(principal))
    }
}

/// The caller if a valid session is presented; anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Principal>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Some(token) = state.cookies.token_from(&parts.headers) else {
            return Ok(Self(None));
        };
        Ok(Self(state.guard.authenticate(Some(token.as_str())).await.ok()))
    }
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
