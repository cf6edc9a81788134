use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header},
    response::Json as ResponseJson,
};
use db::models::admin::Admin;
use serde::{Deserialize, Serialize};
use services::services::auth::password;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub admin: Admin,
}

/// One-time bootstrap: creates the first admin account. Refused as soon as
/// any admin exists.
pub async fn setup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    if Admin::any_exists(&state.db().conn).await? {
        return Err(ApiError::Forbidden(
            "Admin account already exists".to_string(),
        ));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let admin = Admin::create(
        &state.db().conn,
        &payload.email,
        &password::hash(&payload.password),
    )
    .await?;
    let token = state.admin_tokens().issue(admin.id);

    tracing::info!(email = %admin.email, "Admin account created");
    Ok(ResponseJson(ApiResponse::success(LoginResponse {
        token,
        admin,
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let admin = Admin::find_by_email(&state.db().conn, &payload.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !password::verify(&payload.password, &admin.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = state.admin_tokens().issue(admin.id);
    Ok(ResponseJson(ApiResponse::success(LoginResponse {
        token,
        admin,
    })))
}

pub async fn me(
    Extension(admin): Extension<Admin>,
) -> Result<ResponseJson<ApiResponse<Admin>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(admin)))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        state.admin_tokens().revoke(token.trim());
    }
    Ok(ResponseJson(ApiResponse::success(())))
}
