//! Users of a firm.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::{Principal, Role, TenantScope};
use juris_core::{DomainError, DomainResult, FirmId, FirmOwned, UserId};

use crate::text;

/// A stored user, without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub firm_id: FirmId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FirmOwned for User {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl User {
    pub fn create(scope: &TenantScope, input: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            firm_id: scope.firm_id(),
            name: input.name,
            email: input.email,
            role: input.role,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: UserUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            firm_id: self.firm_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            is_active: self.is_active,
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl NewUser {
    pub fn validate(self, min_password_length: usize) -> DomainResult<Self> {
        check_password("password", &self.password, min_password_length)?;
        Ok(Self {
            name: text::required("name", self.name, Some(255))?,
            email: text::email("email", self.email)?,
            password: self.password,
            role: self.role,
            is_active: self.is_active,
        })
    }
}

/// Admin-side partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: self
                .name
                .map(|n| text::required("name", n, Some(255)))
                .transpose()?,
            email: self.email.map(|e| text::email("email", e)).transpose()?,
            role: self.role,
            is_active: self.is_active,
        })
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl core::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

impl PasswordChange {
    pub fn validate(self, min_password_length: usize) -> DomainResult<Self> {
        check_password("new_password", &self.new_password, min_password_length)?;
        Ok(self)
    }
}

fn check_password(field: &str, password: &str, min: usize) -> DomainResult<()> {
    if password.chars().count() < min {
        return Err(DomainError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(password: &str) -> NewUser {
        NewUser {
            name: "Dr. João Advogado".into(),
            email: " Joao@Escritorio.com".into(),
            password: password.into(),
            role: Role::Lawyer,
            is_active: true,
        }
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(new_user("12345").validate(6).is_err());
        assert!(new_user("123456").validate(6).is_ok());
    }

    #[test]
    fn created_user_belongs_to_the_scope() {
        let scope = TenantScope::for_new_firm(FirmId::new());
        let user = User::create(&scope, new_user("advogado123").validate(6).unwrap(), Utc::now());
        assert_eq!(user.firm_id, scope.firm_id());
        assert_eq!(user.email, "joao@escritorio.com");
        assert_eq!(user.principal().role, Role::Lawyer);
    }

    #[test]
    fn unknown_role_fails_to_parse() {
        let body = r#"{"name":"X","email":"x@y.com","password":"secret1","role":"owner"}"#;
        assert!(serde_json::from_str::<NewUser>(body).is_err());
    }

    #[test]
    fn debug_never_prints_passwords() {
        let change = PasswordChange {
            current_password: "admin123".into(),
            new_password: "hunter22".into(),
        };
        assert!(!format!("{change:?}").contains("hunter22"));
        assert!(!format!("{:?}", new_user("advogado123")).contains("advogado123"));
    }

    #[test]
    fn update_applies_role_and_activity() {
        let scope = TenantScope::for_new_firm(FirmId::new());
        let mut user = User::create(&scope, new_user("advogado123").validate(6).unwrap(), Utc::now());
        let update = UserUpdate {
            role: Some(Role::Assistant),
            is_active: Some(false),
            ..Default::default()
        };
        user.apply(update.validate().unwrap(), Utc::now());
        assert_eq!(user.role, Role::Assistant);
        assert!(!user.is_active);
        assert_eq!(user.name, "Dr. João Advogado");
    }
}
