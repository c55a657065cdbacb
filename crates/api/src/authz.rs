//! Role guard applied by handlers before they touch storage.

use juris_auth::{Predicate, Principal, Role, require};

use crate::app::errors::ApiError;
use crate::context::Session;

/// Require an active principal whose role is in `allowed`.
pub fn guard<'s>(session: &'s Session, allowed: &'static [Role]) -> Result<&'s Principal, ApiError> {
    Ok(require(
        session.principal(),
        &[Predicate::IsActive, Predicate::HasRole(allowed)],
    )?)
}

#[cfg(test)]
mod tests {
    use juris_auth::{ADMIN_ONLY, LAWYER_OR_ADMIN};
    use juris_core::{FirmId, UserId};

    use super::*;

    fn session(role: Role) -> Session {
        Session::new(Principal {
            id: UserId::new(),
            firm_id: FirmId::new(),
            name: "Ana".into(),
            email: "ana@escritorio.com".into(),
            role,
            is_active: true,
        })
    }

    #[test]
    fn roles_are_enforced() {
        assert!(guard(&session(Role::Admin), ADMIN_ONLY).is_ok());
        assert!(guard(&session(Role::Lawyer), LAWYER_OR_ADMIN).is_ok());
        assert!(matches!(
            guard(&session(Role::Assistant), LAWYER_OR_ADMIN),
            Err(ApiError::Forbidden(_))
        ));
    }
}
