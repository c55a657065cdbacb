use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::context::Session;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn whoami(Extension(session): Extension<Session>) -> impl IntoResponse {
    let principal = session.principal();
    Json(json!({
        "firm_id": principal.firm_id.to_string(),
        "user_id": principal.id.to_string(),
        "role": principal.role.as_str(),
    }))
}
