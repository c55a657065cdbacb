//! HTTP error mapping.
//!
//! | error | status | code |
//! |---|---|---|
//! | `InvalidCredentials` | 401 | `invalid_credentials` |
//! | `InactiveAccount` | 401 | `inactive_account` |
//! | `Unauthenticated` | 401 | `unauthenticated` |
//! | `Forbidden` | 403 | `insufficient_permissions` |
//! | `NotFound` | 404 | `not_found` |
//! | `Validation` | 400 | `validation_error` |
//! | `Conflict` | 409 | `conflict` |
//! | `Unavailable` | 503 | `unavailable` (+ `retryable: true`) |
//! | `Internal` | 500 | `internal_error` |
//!
//! Every 401 carries `WWW-Authenticate: Bearer`.

use axum::http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use juris_auth::{AuthError, UnauthenticatedReason};
use juris_core::DomainError;
use juris_infra::StoreError;

pub const INVALID_CREDENTIALS: &str = "Email ou senha incorretos";
pub const INACTIVE_ACCOUNT: &str = "Usuário inativo. Contate o administrador.";
pub const UNAUTHENTICATED: &str = "Não foi possível validar as credenciais";
pub const FORBIDDEN: &str = "Permissão insuficiente";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("inactive account")]
    InactiveAccount,

    /// The reason is logged, never returned.
    #[error("unauthenticated: {0}")]
    Unauthenticated(UnauthenticatedReason),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials
            | ApiError::InactiveAccount
            | ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::InactiveAccount => "inactive_account",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "insufficient_permissions",
            ApiError::NotFound => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidCredentials => INVALID_CREDENTIALS.into(),
            ApiError::InactiveAccount => INACTIVE_ACCOUNT.into(),
            ApiError::Unauthenticated(_) => UNAUTHENTICATED.into(),
            ApiError::Forbidden(_) => FORBIDDEN.into(),
            ApiError::NotFound => "Recurso não encontrado".into(),
            ApiError::Validation(msg) | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Unavailable(_) => "Serviço temporariamente indisponível".into(),
            ApiError::Internal(_) => "Erro interno do servidor".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unavailable(detail) => warn!(%detail, "request failed: backend unavailable"),
            ApiError::Internal(detail) => error!(%detail, "request failed: internal error"),
            _ => {}
        }

        let status = self.status();
        let mut body = json!({
            "error": self.code(),
            "message": self.message(),
        });
        if status == StatusCode::SERVICE_UNAVAILABLE {
            body["retryable"] = json!(true);
        }

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::InactiveAccount => ApiError::InactiveAccount,
            AuthError::Unauthenticated(reason) => ApiError::Unauthenticated(reason),
            e @ AuthError::InsufficientPermissions { .. } => ApiError::Forbidden(e.to_string()),
            AuthError::Unavailable(msg) => ApiError::Unavailable(msg),
            AuthError::Crypto(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Validation(msg) => ApiError::Validation(msg),
            StoreError::Unavailable(msg) => ApiError::Unavailable(msg),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => ApiError::NotFound,
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::Validation(msg),
        }
    }
}
