//! Authentication Handlers

use axum::{Json, extract::State, http::HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ConfirmRequest;
use crate::auth::extractor::bearer_token;
use crate::auth::{CurrentUser, Session};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub email: String,
}

/// Login form prefill
#[derive(Debug, Serialize)]
pub struct LoginHints {
    pub saved_email: Option<String>,
    pub last_access: Option<DateTime<Utc>>,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<Session>>> {
    let session = state
        .auth
        .sign_in(&req.email, &req.password, req.remember)
        .await
        .inspect_err(|e| tracing::warn!(email = %req.email.trim(), error = %e, "Login failed"))?;

    tracing::info!(uid = %session.user.uid, "Admin signed in");
    Ok(ok(session))
}

/// POST /api/auth/password-reset
pub async fn password_reset(
    State(state): State<ServerState>,
    Json(req): Json<PasswordResetRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.auth.request_password_reset(&req.email).await?;
    Ok(ok_with_message(
        (),
        "E-mail de recuperação enviado! Verifique sua caixa de entrada.",
    ))
}

/// GET /api/auth/hints
pub async fn hints(State(state): State<ServerState>) -> Json<ApiResponse<LoginHints>> {
    ok(LoginHints {
        saved_email: state.auth.saved_email(),
        last_access: state.auth.last_access(),
    })
}

/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> Json<ApiResponse<CurrentUser>> {
    ok(user)
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<ServerState>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(req): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let token = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(AppError::not_authenticated)?;

    if !state.auth.sign_out(token, &req.provider()).await? {
        return Err(AppError::declined());
    }
    tracing::info!(uid = %user.uid, "Admin signed out");
    Ok(ok_with_message((), "Sessão encerrada"))
}
