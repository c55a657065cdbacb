//! Infrastructure layer: storage, configuration and demo data.
//!
//! Storage is split into one async trait per record family, all taking a
//! [`juris_auth::TenantScope`]. [`MemoryStore`] backs tests and local runs;
//! [`PgStore`] backs deployments.

pub mod config;
pub mod error;
pub mod seed;
pub mod store;

pub use config::{AppConfig, DatabaseConfig, Environment};
pub use error::{StoreError, StoreResult};
pub use seed::seed_demo_data;
pub use store::{
    CaseRecordStore, CaseStore, ClientStore, FirmStore, MemoryStore, PgStore, SharedStore, Store,
    TaskStore, UserStore,
};
