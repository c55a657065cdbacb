//! HTTP application wiring (axum router + shared state).
//!
//! - `services.rs`: store selection and startup seeding
//! - `routes/`: handlers, one file per resource
//! - `dto.rs`: request/response bodies and query strings
//! - `errors.rs`: the error-to-status table

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use juris_auth::{AuthConfig, AuthService};
use juris_infra::SharedStore;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<SharedStore>>,
    pub store: SharedStore,
    pub auth_config: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(store: SharedStore, auth_config: AuthConfig) -> Self {
        Self {
            auth: Arc::new(AuthService::new(store.clone(), &auth_config)),
            store,
            auth_config: Arc::new(auth_config),
        }
    }
}

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        auth: state.auth.clone(),
    };

    // Protected routes: a resolved session is required.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_log))
                .layer(Extension(state)),
        )
}
