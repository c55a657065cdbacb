//! HTTP API: routing, session middleware and error mapping.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
