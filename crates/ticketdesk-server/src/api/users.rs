//! `/api/user` handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use serde_json::{Value, json};

use super::error::ApiError;
use super::extract::{AdminUser, ApiJson, ApiPath, AuthUser, MaybeAuthUser};
use super::state::AppState;
use crate::accounts::{
    ActivationInput, ChangePasswordInput, LoginInput, ProfileInput, RegisterInput,
};

type ApiResult = Result<Json<Value>, ApiError>;

pub async fn register(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.register(input, caller.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": true, "user": user })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.accounts.login(input).await?;
    let cookie = state.cookies.issue(&session);
    Ok((
        [(SET_COOKIE, cookie.to_string())],
        Json(json!({
            "status": true,
            "user": user,
            "token": session.token,
            "expiresAt": session.expires_at,
        })),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, state.cookies.clear().to_string())],
        Json(json!({ "status": true, "message": "Logout successful" })),
    )
}

pub async fn team(State(state): State<AppState>, _user: AuthUser) -> ApiResult {
    let users = state.accounts.list_team().await?;
    Ok(Json(json!({ "status": true, "users": users })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(input): ApiJson<ProfileInput>,
) -> ApiResult {
    let user = state.accounts.update_profile(&principal, input).await?;
    Ok(Json(json!({
        "status": true,
        "user": user,
        "message": "Profile updated successfully.",
    })))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(input): ApiJson<ChangePasswordInput>,
) -> ApiResult {
    state.accounts.change_password(&principal, input).await?;
    Ok(Json(json!({
        "status": true,
        "message": "Password changed successfully.",
    })))
}

pub async fn set_active(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ActivationInput>,
) -> ApiResult {
    let user = state.accounts.set_active(id, input.is_active).await?;
    let message = if user.is_active {
        "User account has been activated"
    } else {
        "User account has been disabled"
    };
    Ok(Json(json!({ "status": true, "user": user, "message": message })))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult {
    state.accounts.delete_user(id).await?;
    Ok(Json(json!({
        "status": true,
        "message": "User deleted successfully.",
    })))
}
