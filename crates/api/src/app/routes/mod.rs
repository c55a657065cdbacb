use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod case_records;
pub mod cases;
pub mod clients;
pub mod common;
pub mod firms;
pub mod system;
pub mod tasks;
pub mod users;

/// Endpoints reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/law_firms", post(firms::create_firm))
        .nest("/auth", auth::public_router())
}

/// Router for all authenticated (firm-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/law_firms", firms::router())
        .nest("/users", users::router())
        .nest("/clients", clients::router())
        .nest("/cases", cases::router().merge(case_records::router()))
        .nest("/tasks", tasks::router())
}
