//! Legal cases (processos).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, ClientId, DomainError, DomainResult, FirmId, FirmOwned, UserId};

use crate::{Money, text};

/// Statuses that mark a case as closed. Anything else, including no status
/// at all, is an active case.
pub const CLOSED_STATUSES: [&str; 3] = ["arquivado", "encerrado", "finalizado"];

pub fn is_closed_status(status: Option<&str>) -> bool {
    status.is_some_and(|s| {
        let s = s.trim().to_lowercase();
        CLOSED_STATUSES.contains(&s.as_str())
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Case {
    pub id: CaseId,
    pub firm_id: FirmId,
    pub client_id: ClientId,
    pub case_number: Option<String>,
    pub court: Option<String>,
    pub area: Option<String>,
    pub status: Option<String>,
    pub distribution_date: Option<NaiveDate>,
    pub value: Option<Money>,
    pub description: Option<String>,
    pub responsible_lawyer_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FirmOwned for Case {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl Case {
    /// The caller must have verified `client_id` and `responsible_lawyer_id`
    /// under the same scope.
    pub fn create(scope: &TenantScope, input: NewCase, now: DateTime<Utc>) -> Self {
        Self {
            id: CaseId::new(),
            firm_id: scope.firm_id(),
            client_id: input.client_id,
            case_number: input.case_number,
            court: input.court,
            area: input.area,
            status: input.status,
            distribution_date: input.distribution_date,
            value: input.value,
            description: input.description,
            responsible_lawyer_id: input.responsible_lawyer_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        !is_closed_status(self.status.as_deref())
    }

    pub fn apply(&mut self, update: CaseUpdate, now: DateTime<Utc>) {
        if update.case_number.is_some() {
            self.case_number = update.case_number;
        }
        if update.court.is_some() {
            self.court = update.court;
        }
        if update.area.is_some() {
            self.area = update.area;
        }
        if update.status.is_some() {
            self.status = update.status;
        }
        if update.distribution_date.is_some() {
            self.distribution_date = update.distribution_date;
        }
        if update.value.is_some() {
            self.value = update.value;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if update.responsible_lawyer_id.is_some() {
            self.responsible_lawyer_id = update.responsible_lawyer_id;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCase {
    pub client_id: ClientId,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub court: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub distribution_date: Option<NaiveDate>,
    #[serde(default)]
    pub value: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub responsible_lawyer_id: Option<UserId>,
}

impl NewCase {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            client_id: self.client_id,
            case_number: text::optional("case_number", self.case_number, Some(50))?,
            court: text::optional("court", self.court, Some(255))?,
            area: text::optional("area", self.area, Some(100))?,
            status: text::optional("status", self.status, Some(50))?,
            distribution_date: self.distribution_date,
            value: self.value.map(|v| v.non_negative("value")).transpose()?,
            description: text::optional("description", self.description, None)?,
            responsible_lawyer_id: self.responsible_lawyer_id,
        })
    }
}

/// Partial update; `None` keeps the stored value. The client is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaseUpdate {
    pub case_number: Option<String>,
    pub court: Option<String>,
    pub area: Option<String>,
    pub status: Option<String>,
    pub distribution_date: Option<NaiveDate>,
    pub value: Option<Money>,
    pub description: Option<String>,
    pub responsible_lawyer_id: Option<UserId>,
}

impl CaseUpdate {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            case_number: text::optional("case_number", self.case_number, Some(50))?,
            court: text::optional("court", self.court, Some(255))?,
            area: text::optional("area", self.area, Some(100))?,
            status: text::optional("status", self.status, Some(50))?,
            distribution_date: self.distribution_date,
            value: self.value.map(|v| v.non_negative("value")).transpose()?,
            description: text::optional("description", self.description, None)?,
            responsible_lawyer_id: self.responsible_lawyer_id,
        })
    }
}

/// `GET /cases` filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaseFilter {
    pub client_id: Option<ClientId>,
    pub status: Option<String>,
}

impl CaseFilter {
    pub fn matches(&self, case: &Case) -> bool {
        self.client_id.is_none_or(|id| case.client_id == id)
            && self
                .status
                .as_deref()
                .is_none_or(|s| case.status.as_deref() == Some(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_case(status: Option<&str>) -> NewCase {
        NewCase {
            client_id: ClientId::new(),
            case_number: Some("1234567-89.2023.8.26.0000".into()),
            court: Some("1ª Vara Cível".into()),
            area: Some("cível".into()),
            status: status.map(Into::into),
            distribution_date: NaiveDate::from_ymd_opt(2023, 1, 15),
            value: Some(Money::from_cents(5_000_000)),
            description: Some("Ação de cobrança".into()),
            responsible_lawyer_id: None,
        }
    }

    #[test]
    fn closed_statuses_are_not_active() {
        let scope = TenantScope::for_new_firm(FirmId::new());
        let now = Utc::now();
        for status in CLOSED_STATUSES {
            assert!(!Case::create(&scope, new_case(Some(status)), now).is_active());
        }
        assert!(!Case::create(&scope, new_case(Some(" Arquivado ")), now).is_active());
        assert!(Case::create(&scope, new_case(Some("em andamento")), now).is_active());
        assert!(Case::create(&scope, new_case(None), now).is_active());
    }

    #[test]
    fn long_case_number_is_rejected() {
        let mut input = new_case(None);
        input.case_number = Some("9".repeat(51));
        assert!(input.validate().is_err());
    }

    #[test]
    fn negative_value_is_rejected() {
        let mut input = new_case(None);
        input.value = Some(Money::from_cents(-1));
        assert_eq!(
            input.validate().unwrap_err(),
            DomainError::Validation("value must not be negative".into())
        );

        let update = CaseUpdate {
            value: Some(Money::from_cents(-500)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let zero = CaseUpdate {
            value: Some(Money::ZERO),
            ..Default::default()
        };
        assert_eq!(zero.validate().unwrap().value, Some(Money::ZERO));
    }

    #[test]
    fn value_is_exchanged_as_a_decimal() {
        let body = serde_json::json!({
            "client_id": ClientId::new().to_string(),
            "value": 50000.0,
            "distribution_date": "2023-01-15",
        });
        let input: NewCase = serde_json::from_value(body).unwrap();
        assert_eq!(input.value, Some(Money::from_cents(5_000_000)));

        let case = Case::create(&TenantScope::for_new_firm(FirmId::new()), input, Utc::now());
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["value"], 50000.0);
        assert_eq!(json["distribution_date"], "2023-01-15");
    }

    #[test]
    fn filter_by_client_and_status() {
        let scope = TenantScope::for_new_firm(FirmId::new());
        let case = Case::create(&scope, new_case(Some("em andamento")), Utc::now());

        assert!(CaseFilter::default().matches(&case));
        assert!(
            CaseFilter {
                client_id: Some(case.client_id),
                status: Some("em andamento".into()),
            }
            .matches(&case)
        );
        assert!(
            !CaseFilter {
                client_id: Some(ClientId::new()),
                status: None,
            }
            .matches(&case)
        );
        assert!(
            !CaseFilter {
                client_id: None,
                status: Some("arquivado".into()),
            }
            .matches(&case)
        );
    }

    #[test]
    fn update_keeps_unset_fields() {
        let scope = TenantScope::for_new_firm(FirmId::new());
        let mut case = Case::create(&scope, new_case(Some("em andamento")), Utc::now());
        case.apply(
            CaseUpdate {
                status: Some("arquivado".into()),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(!case.is_active());
        assert_eq!(case.court.as_deref(), Some("1ª Vara Cível"));
    }
}
