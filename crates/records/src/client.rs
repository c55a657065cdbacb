//! Clients of a firm (people or companies).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{ClientId, DomainResult, FirmId, FirmOwned};

use crate::text;

/// `pf` (pessoa física) for people, `pj` (pessoa jurídica) for companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Pf,
    Pj,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Pf => "pf",
            ClientKind::Pj => "pj",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pf" => Some(ClientKind::Pf),
            "pj" => Some(ClientKind::Pj),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub firm_id: FirmId,
    #[serde(rename = "type")]
    pub kind: ClientKind,
    pub name: String,
    /// CPF or CNPJ; unique within the firm when present.
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Two-letter state code, e.g. `SP`.
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FirmOwned for Client {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl Client {
    pub fn create(scope: &TenantScope, input: NewClient, now: DateTime<Utc>) -> Self {
        Self {
            id: ClientId::new(),
            firm_id: scope.firm_id(),
            kind: input.kind,
            name: input.name,
            document: input.document,
            email: input.email,
            phone: input.phone,
            address: input.address,
            state: input.state,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: ClientUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if update.address.is_some() {
            self.address = update.address;
        }
        if update.state.is_some() {
            self.state = update.state;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewClient {
    #[serde(rename = "type")]
    pub kind: ClientKind,
    pub name: String,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "estado")]
    pub state: Option<String>,
}

impl NewClient {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            kind: self.kind,
            name: text::required("name", self.name, Some(255))?,
            document: text::optional("document", self.document, Some(20))?,
            email: text::optional_email("email", self.email)?,
            phone: text::optional("phone", self.phone, Some(20))?,
            address: text::optional("address", self.address, None)?,
            state: text::optional("state", self.state, Some(10))?,
        })
    }
}

/// Partial update; `None` keeps the stored value. Kind and document are
/// fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "estado")]
    pub state: Option<String>,
}

impl ClientUpdate {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: self
                .name
                .map(|n| text::required("name", n, Some(255)))
                .transpose()?,
            email: text::optional_email("email", self.email)?,
            phone: text::optional("phone", self.phone, Some(20))?,
            address: text::optional("address", self.address, None)?,
            state: text::optional("state", self.state, Some(10))?,
        })
    }
}

/// `GET /clients` search: case-insensitive substring of name, document or
/// email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientFilter {
    pub search: Option<String>,
}

impl ClientFilter {
    /// The trimmed, lower-cased search term, if any.
    pub fn term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    pub fn matches(&self, client: &Client) -> bool {
        let Some(term) = self.term() else {
            return true;
        };
        text::contains_ci(&client.name, &term)
            || client
                .document
                .as_deref()
                .is_some_and(|d| text::contains_ci(d, &term))
            || client
                .email
                .as_deref()
                .is_some_and(|e| text::contains_ci(e, &term))
    }
}
