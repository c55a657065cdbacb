//! Parties to a case (autor, réu, terceiro).

use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, CasePartyId, DomainResult, FirmId, FirmOwned};

use crate::text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseParty {
    pub id: CasePartyId,
    pub firm_id: FirmId,
    pub case_id: CaseId,
    pub name: String,
    pub role: Option<String>,
    pub document: Option<String>,
}

impl FirmOwned for CaseParty {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl CaseParty {
    pub fn create(scope: &TenantScope, case_id: CaseId, input: NewCaseParty) -> Self {
        Self {
            id: CasePartyId::new(),
            firm_id: scope.firm_id(),
            case_id,
            name: input.name,
            role: input.role,
            document: input.document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCaseParty {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
}

impl NewCaseParty {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: text::required("name", self.name, Some(255))?,
            role: text::optional("role", self.role, Some(50))?,
            document: text::optional("document", self.document, Some(20))?,
        })
    }
}
