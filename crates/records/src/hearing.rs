//! Scheduled hearings (audiências).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, DomainResult, FirmId, FirmOwned, HearingId};

use crate::text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hearing {
    pub id: HearingId,
    pub firm_id: FirmId,
    pub case_id: CaseId,
    pub hearing_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl FirmOwned for Hearing {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl Hearing {
    pub fn create(scope: &TenantScope, case_id: CaseId, input: NewHearing) -> Self {
        Self {
            id: HearingId::new(),
            firm_id: scope.firm_id(),
            case_id,
            hearing_date: input.hearing_date,
            kind: input.kind,
            location: input.location,
            notes: input.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewHearing {
    pub hearing_date: DateTime<Utc>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewHearing {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            hearing_date: self.hearing_date,
            kind: text::optional("type", self.kind, Some(100))?,
            location: text::optional("location", self.location, Some(255))?,
            notes: text::optional("notes", self.notes, None)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rfc3339_with_offset() {
        let body = r#"{"hearing_date":"2024-03-10T14:30:00-03:00","type":"conciliação"}"#;
        let input: NewHearing = serde_json::from_str(body).unwrap();
        assert_eq!(input.hearing_date.to_rfc3339(), "2024-03-10T17:30:00+00:00");
        assert_eq!(input.kind.as_deref(), Some("conciliação"));
    }
}
