//! Law firms: the unit of tenant isolation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use juris_core::{DomainResult, FirmId, FirmOwned};

use crate::text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Firm {
    pub id: FirmId,
    pub name: String,
    /// Brazilian company registry number, unique across all firms.
    pub cnpj: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A firm is owned by itself, so it passes through the same scope checks as
/// any other record.
impl FirmOwned for Firm {
    fn firm_id(&self) -> FirmId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewFirm {
    pub name: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewFirm {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: text::required("name", self.name, Some(255))?,
            cnpj: text::optional("cnpj", self.cnpj, Some(18))?,
            email: text::optional_email("email", self.email)?,
            phone: text::optional("phone", self.phone, Some(20))?,
        })
    }
}

/// Partial update; `None` keeps the stored value. The fiscal id is immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FirmUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl FirmUpdate {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: self
                .name
                .map(|n| text::required("name", n, Some(255)))
                .transpose()?,
            email: text::optional_email("email", self.email)?,
            phone: text::optional("phone", self.phone, Some(20))?,
        })
    }
}

impl Firm {
    pub fn create(input: NewFirm, now: DateTime<Utc>) -> Self {
        Self {
            id: FirmId::new(),
            name: input.name,
            cnpj: input.cnpj,
            email: input.email,
            phone: input.phone,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: FirmUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_firm() -> NewFirm {
        NewFirm {
            name: " Escritório Modelo Advocacia ".into(),
            cnpj: Some("12.345.678/0001-90".into()),
            email: Some("Contato@EscritorioModelo.com".into()),
            phone: Some("".into()),
        }
    }

    #[test]
    fn validation_normalizes_fields() {
        let firm = new_firm().validate().unwrap();
        assert_eq!(firm.name, "Escritório Modelo Advocacia");
        assert_eq!(firm.email.as_deref(), Some("contato@escritoriomodelo.com"));
        assert_eq!(firm.phone, None);
    }

    #[test]
    fn cnpj_is_limited_to_eighteen_characters() {
        let mut input = new_firm();
        input.cnpj = Some("12.345.678/0001-901".into());
        assert!(input.validate().is_err());
    }

    #[test]
    fn update_keeps_unset_fields() {
        let now = Utc::now();
        let mut firm = Firm::create(new_firm().validate().unwrap(), now);
        let update = FirmUpdate {
            phone: Some("(11) 99999-9999".into()),
            ..Default::default()
        };
        firm.apply(update.validate().unwrap(), now);
        assert_eq!(firm.name, "Escritório Modelo Advocacia");
        assert_eq!(firm.phone.as_deref(), Some("(11) 99999-9999"));
        assert_eq!(firm.cnpj.as_deref(), Some("12.345.678/0001-90"));
    }
}
