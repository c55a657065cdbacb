use juris_auth::{Principal, TenantScope};
use juris_core::UserId;

/// The resolved caller of a request.
///
/// Inserted by the session middleware; the scope is derived from the
/// principal and cannot be set any other way.
#[derive(Debug, Clone)]
pub struct Session {
    principal: Principal,
    scope: TenantScope,
}

impl Session {
    pub fn new(principal: Principal) -> Self {
        let scope = TenantScope::of(&principal);
        Self { principal, scope }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn scope(&self) -> &TenantScope {
        &self.scope
    }

    pub fn user_id(&self) -> UserId {
        self.principal.id
    }
}
