//! `juris-auth`: authentication, authorization and tenant scoping.
//!
//! This crate is intentionally decoupled from HTTP and storage: storage is
//! reached through [`PrincipalDirectory`], and failures are plain error
//! values that the API layer maps to status codes.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod error;
pub mod password;
pub mod principal;
pub mod roles;
pub mod scope;
pub mod service;
pub mod session;
pub mod token;

pub use authorize::{ADMIN_ONLY, ANY_ROLE, LAWYER_OR_ADMIN, Predicate, require};
pub use claims::{Claims, validate_claims};
pub use config::{AuthConfig, MAX_ACCESS_TOKEN_LIFETIME_SECS};
pub use error::{AuthError, UnauthenticatedReason};
pub use password::{hash_password, verify_password};
pub use principal::{DirectoryError, Principal, PrincipalDirectory, PrincipalRecord, normalize_email};
pub use roles::{Role, UnknownRole};
pub use scope::{TenantScope, scope_of};
pub use service::{AuthService, LoginOutcome};
pub use session::SessionResolver;
pub use token::{TokenCodec, TokenError};
