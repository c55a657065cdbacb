//! `juris-core`: shared domain building blocks.
//!
//! Typed identifiers, the domain error model, pagination and the tenant
//! ownership contract. No IO, no HTTP.

pub mod error;
pub mod id;
pub mod page;
pub mod tenant;

pub use error::{DomainError, DomainResult};
pub use id::{
    CaseId, CaseMovementId, CasePartyId, ClientId, DocumentId, FinancialRecordId, FirmId,
    HearingId, NoteId, TaskId, UserId,
};
pub use page::Page;
pub use tenant::FirmOwned;
