use axum::{
    Extension, Form, Json, Router,
    routing::{get, post},
};
use chrono::Utc;

use juris_auth::{ANY_ROLE, Principal};

use crate::app::dto::{
    LoginForm, LoginRequest, MessageResponse, RefreshResponse, TokenResponse,
    VerifyTokenResponse,
};
use crate::app::{AppState, errors::ApiError};
use crate::authz::guard;
use crate::context::Session;

pub fn public_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/login/form", post(login_form))
        .route("/logout", post(logout))
}

pub fn router() -> Router {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .route("/verify-token", post(verify_token))
}

pub async fn login(
    Extension(state): Extension<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let outcome = state.auth.login(&body.email, &body.password, Utc::now()).await?;
    Ok(Json(outcome.into()))
}

/// OAuth2 password flow: `username` is the email.
pub async fn login_form(
    Extension(state): Extension<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let outcome = state
        .auth
        .login(&form.username, &form.password, Utc::now())
        .await?;
    Ok(Json(outcome.into()))
}

/// Tokens are not revoked server-side; the client discards its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout realizado com sucesso",
        detail: "Token descartado. Para garantir, remova o token do lado do cliente.",
    })
}

pub async fn refresh(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let principal = guard(&session, ANY_ROLE)?;
    let access_token = state.auth.refresh(principal, Utc::now())?;
    Ok(Json(RefreshResponse {
        access_token,
        token_type: "bearer",
    }))
}

pub async fn me(Extension(session): Extension<Session>) -> Result<Json<Principal>, ApiError> {
    Ok(Json(guard(&session, ANY_ROLE)?.clone()))
}

pub async fn verify_token(
    Extension(session): Extension<Session>,
) -> Result<Json<VerifyTokenResponse>, ApiError> {
    Ok(Json(guard(&session, ANY_ROLE)?.into()))
}
