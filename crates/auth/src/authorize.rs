//! Authorization gate: role and liveness predicates checked before a handler runs.

use crate::{AuthError, Principal, Role};

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const LAWYER_OR_ADMIN: &[Role] = &[Role::Admin, Role::Lawyer];
pub const ANY_ROLE: &[Role] = &Role::ALL;

/// A condition a principal must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The account is still active.
    IsActive,
    /// The principal's role is one of the listed roles.
    HasRole(&'static [Role]),
}

impl Predicate {
    fn check(&self, principal: &Principal) -> Result<(), AuthError> {
        match self {
            Predicate::IsActive if !principal.is_active => Err(AuthError::InactiveAccount),
            Predicate::HasRole(allowed) if !allowed.contains(&principal.role) => {
                Err(AuthError::InsufficientPermissions {
                    role: principal.role,
                    allowed: allowed.to_vec(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Check every predicate in order; the first failure wins.
///
/// - No IO
/// - No panics
pub fn require<'p>(
    principal: &'p Principal,
    predicates: &[Predicate],
) -> Result<&'p Principal, AuthError> {
    for predicate in predicates {
        predicate.check(principal)?;
    }
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use juris_core::{FirmId, UserId};

    fn principal(role: Role, is_active: bool) -> Principal {
        Principal {
            id: UserId::new(),
            firm_id: FirmId::new(),
            name: "x".into(),
            email: "x@x.com".into(),
            role,
            is_active,
        }
    }

    #[test]
    fn admin_only_rejects_other_roles() {
        let assistant = principal(Role::Assistant, true);
        let err = require(&assistant, &[Predicate::HasRole(ADMIN_ONLY)]).unwrap_err();
        assert_eq!(
            err,
            AuthError::InsufficientPermissions {
                role: Role::Assistant,
                allowed: vec![Role::Admin],
            }
        );

        let admin = principal(Role::Admin, true);
        assert!(require(&admin, &[Predicate::HasRole(ADMIN_ONLY)]).is_ok());
    }

    #[test]
    fn lawyer_or_admin() {
        for (role, ok) in [
            (Role::Admin, true),
            (Role::Lawyer, true),
            (Role::Assistant, false),
        ] {
            let p = principal(role, true);
            assert_eq!(require(&p, &[Predicate::HasRole(LAWYER_OR_ADMIN)]).is_ok(), ok);
        }
    }

    #[test]
    fn inactive_fails_before_role_check() {
        let p = principal(Role::Assistant, false);
        let err = require(&p, &[Predicate::IsActive, Predicate::HasRole(ADMIN_ONLY)]).unwrap_err();
        assert_eq!(err, AuthError::InactiveAccount);
    }

    #[test]
    fn no_predicates_always_pass() {
        let p = principal(Role::Assistant, false);
        assert_eq!(require(&p, &[]).unwrap(), &p);
    }
}
