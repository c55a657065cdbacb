//! Request and response bodies that are not records themselves.

use serde::{Deserialize, Serialize};

use juris_auth::{LoginOutcome, Principal, Role};
use juris_core::{CaseId, ClientId, FirmId, Page, UserId};
use juris_records::{CaseFilter, ClientFilter, Firm, NewFirm, TaskFilter, TaskStatus, User};

// -------------------------
// Auth
// -------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-flow form; `username` carries the email.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user_id: UserId,
    pub firm_id: FirmId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<LoginOutcome> for TokenResponse {
    fn from(outcome: LoginOutcome) -> Self {
        let p = outcome.principal;
        Self {
            access_token: outcome.access_token,
            token_type: "bearer",
            expires_in: outcome.expires_in,
            user_id: p.id,
            firm_id: p.firm_id,
            email: p.email,
            name: p.name,
            role: p.role,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub user_id: UserId,
    pub firm_id: FirmId,
    pub email: String,
    pub role: Role,
}

impl From<&Principal> for VerifyTokenResponse {
    fn from(p: &Principal) -> Self {
        Self {
            valid: true,
            user_id: p.id,
            firm_id: p.firm_id,
            email: p.email.clone(),
            role: p.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    pub detail: &'static str,
}

// -------------------------
// Firms
// -------------------------

/// Firm bootstrap: the firm plus its first admin.
#[derive(Deserialize)]
pub struct CreateFirmRequest {
    #[serde(flatten)]
    pub firm: NewFirm,
    pub admin: FirmAdmin,
}

#[derive(Deserialize)]
pub struct FirmAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct FirmCreated {
    pub firm: Firm,
    pub admin: User,
}

// -------------------------
// Query strings
// -------------------------

/// `skip` / `limit`. Kept as plain fields: flattening breaks numeric
/// parsing in query strings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        page(self.skip, self.limit)
    }
}

fn page(skip: Option<u32>, limit: Option<u32>) -> Page {
    Page::new(skip.unwrap_or(0), limit.unwrap_or(Page::DEFAULT_LIMIT))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ClientListQuery {
    pub fn split(self) -> (ClientFilter, Page) {
        (
            ClientFilter {
                search: self.search,
            },
            page(self.skip, self.limit),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientGetQuery {
    #[serde(default)]
    pub include_cases: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaseListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub client_id: Option<ClientId>,
    pub status: Option<String>,
}

impl CaseListQuery {
    pub fn split(self) -> (CaseFilter, Page) {
        (
            CaseFilter {
                client_id: self.client_id,
                status: self.status,
            },
            page(self.skip, self.limit),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TaskStatus>,
    pub case_id: Option<CaseId>,
    pub assigned_to: Option<UserId>,
}

impl TaskListQuery {
    pub fn split(self) -> (TaskFilter, Page) {
        (
            TaskFilter {
                status: self.status,
                case_id: self.case_id,
                assigned_to: self.assigned_to,
            },
            page(self.skip, self.limit),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(PageQuery::default().page(), Page::default());
        let q = PageQuery {
            skip: Some(5),
            limit: Some(10_000),
        };
        assert_eq!(q.page(), Page::new(5, Page::MAX_LIMIT));
    }

    #[test]
    fn firm_request_flattens_the_firm_fields() {
        let req: CreateFirmRequest = serde_json::from_value(serde_json::json!({
            "name": "Silva & Souza",
            "cnpj": "11.222.333/0001-44",
            "admin": {"name": "Ana", "email": "ana@silva.com", "password": "secret1"}
        }))
        .unwrap();
        assert_eq!(req.firm.name, "Silva & Souza");
        assert_eq!(req.firm.cnpj.as_deref(), Some("11.222.333/0001-44"));
        assert_eq!(req.admin.email, "ana@silva.com");
    }
}
