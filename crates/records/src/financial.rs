//! Fees and payments recorded against a case.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, DomainResult, FinancialRecordId, FirmId, FirmOwned};

use crate::{Money, text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialKind {
    /// Honorários owed to the firm.
    Fee,
    Payment,
}

impl FinancialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialKind::Fee => "fee",
            FinancialKind::Payment => "payment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fee" => Some(FinancialKind::Fee),
            "payment" => Some(FinancialKind::Payment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialRecord {
    pub id: FinancialRecordId,
    pub firm_id: FirmId,
    pub case_id: CaseId,
    #[serde(rename = "type")]
    pub kind: FinancialKind,
    pub description: Option<String>,
    pub amount: Money,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<NaiveDate>,
}

impl FirmOwned for FinancialRecord {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl FinancialRecord {
    pub fn create(scope: &TenantScope, case_id: CaseId, input: NewFinancialRecord) -> Self {
        Self {
            id: FinancialRecordId::new(),
            firm_id: scope.firm_id(),
            case_id,
            kind: input.kind,
            description: input.description,
            amount: input.amount,
            due_date: input.due_date,
            paid_at: input.paid_at,
        }
    }

    pub fn apply(&mut self, update: FinancialRecordUpdate) {
        if update.description.is_some() {
            self.description = update.description;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if update.due_date.is_some() {
            self.due_date = update.due_date;
        }
        if update.paid_at.is_some() {
            self.paid_at = update.paid_at;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewFinancialRecord {
    #[serde(rename = "type")]
    pub kind: FinancialKind,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Money,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_at: Option<NaiveDate>,
}

impl NewFinancialRecord {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            amount: self.amount.non_negative("amount")?,
            description: text::optional("description", self.description, None)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FinancialRecordUpdate {
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<NaiveDate>,
}

impl FinancialRecordUpdate {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            amount: self.amount.map(|a| a.non_negative("amount")).transpose()?,
            description: text::optional("description", self.description, None)?,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_is_required() {
        let body = r#"{"type":"fee","description":"Honorários iniciais"}"#;
        assert!(serde_json::from_str::<NewFinancialRecord>(body).is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let body = r#"{"type":"payment","amount":-10.5}"#;
        let input: NewFinancialRecord = serde_json::from_str(body).unwrap();
        assert!(input.validate().is_err());

        let update = FinancialRecordUpdate {
            amount: Some(Money::from_cents(-1)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn marking_as_paid_keeps_the_amount() {
        let body = r#"{"type":"fee","amount":"1500.00","due_date":"2024-02-01"}"#;
        let input: NewFinancialRecord = serde_json::from_str(body).unwrap();
        let scope = TenantScope::for_new_firm(FirmId::new());
        let mut record = FinancialRecord::create(&scope, CaseId::new(), input.validate().unwrap());

        record.apply(FinancialRecordUpdate {
            paid_at: NaiveDate::from_ymd_opt(2024, 2, 3),
            ..Default::default()
        });
        assert_eq!(record.amount, Money::from_cents(150_000));
        assert_eq!(record.paid_at, NaiveDate::from_ymd_opt(2024, 2, 3));
    }
}
