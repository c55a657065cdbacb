//! Documents attached to a case. Only the file reference is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, DocumentId, DomainResult, FirmId, FirmOwned, UserId};

use crate::text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub firm_id: FirmId,
    pub case_id: CaseId,
    pub uploaded_by: Option<UserId>,
    pub file_name: String,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

impl FirmOwned for Document {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl Document {
    /// `uploaded_by` is always the acting user.
    pub fn create(
        scope: &TenantScope,
        case_id: CaseId,
        uploaded_by: UserId,
        input: NewDocument,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            firm_id: scope.firm_id(),
            case_id,
            uploaded_by: Some(uploaded_by),
            file_name: input.file_name,
            file_url: input.file_url,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewDocument {
    pub file_name: String,
    pub file_url: String,
}

impl NewDocument {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            file_name: text::required("file_name", self.file_name, Some(255))?,
            file_url: text::required("file_url", self.file_url, None)?,
        })
    }
}
