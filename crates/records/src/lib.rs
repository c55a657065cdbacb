//! Records owned by a law firm, and the inputs that create or change them.
//!
//! Pure data and validation: no IO, no HTTP, no storage. Every tenant-owned
//! record is constructed from a [`juris_auth::TenantScope`], so its `firm_id`
//! can never come from a request body.

pub mod case;
pub mod client;
pub mod detail;
pub mod document;
pub mod financial;
pub mod firm;
pub mod hearing;
pub mod money;
pub mod movement;
pub mod note;
pub mod party;
pub mod task;
pub mod text;
pub mod user;

pub use case::{CLOSED_STATUSES, Case, CaseFilter, CaseUpdate, NewCase, is_closed_status};
pub use client::{Client, ClientFilter, ClientKind, ClientUpdate, NewClient};
pub use detail::{CaseDetail, ClientWithCases};
pub use document::{Document, NewDocument};
pub use financial::{FinancialKind, FinancialRecord, FinancialRecordUpdate, NewFinancialRecord};
pub use firm::{Firm, FirmUpdate, NewFirm};
pub use hearing::{Hearing, NewHearing};
pub use money::Money;
pub use movement::{CaseMovement, NewCaseMovement};
pub use note::{NewNote, Note};
pub use party::{CaseParty, NewCaseParty};
pub use task::{NewTask, Task, TaskFilter, TaskStatus, TaskUpdate};
pub use user::{NewUser, PasswordChange, User, UserUpdate};
