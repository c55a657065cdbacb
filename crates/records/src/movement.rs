//! Docket movements (andamentos) of a case. Append-only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, CaseMovementId, DomainResult, FirmId, FirmOwned};

use crate::text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseMovement {
    pub id: CaseMovementId,
    pub firm_id: FirmId,
    pub case_id: CaseId,
    pub movement_date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FirmOwned for CaseMovement {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl CaseMovement {
    pub fn create(
        scope: &TenantScope,
        case_id: CaseId,
        input: NewCaseMovement,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CaseMovementId::new(),
            firm_id: scope.firm_id(),
            case_id,
            movement_date: input.movement_date,
            description: input.description,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCaseMovement {
    pub movement_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCaseMovement {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            movement_date: self.movement_date,
            description: text::optional("description", self.description, None)?,
        })
    }
}
