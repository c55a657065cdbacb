//! Tenant scope: the mandatory firm filter for tenant-owned data.

use juris_core::{FirmId, FirmOwned};

use crate::Principal;

/// The firm every tenant-owned read and write of a request is confined to.
///
/// Storage APIs take a `&TenantScope` instead of a raw [`FirmId`], so a scope
/// can only come from a resolved principal ([`TenantScope::of`]) or from a
/// firm created in the same flow ([`TenantScope::for_new_firm`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TenantScope {
    firm_id: FirmId,
}

impl TenantScope {
    pub fn of(principal: &Principal) -> Self {
        Self {
            firm_id: principal.firm_id,
        }
    }

    /// Scope of a firm that was just created (bootstrap and seeding only).
    pub fn for_new_firm(firm_id: FirmId) -> Self {
        Self { firm_id }
    }

    pub fn firm_id(&self) -> FirmId {
        self.firm_id
    }

    pub fn contains<T: FirmOwned + ?Sized>(&self, record: &T) -> bool {
        record.firm_id() == self.firm_id
    }

    /// `Some(record)` only when it belongs to this scope.
    pub fn admit<T: FirmOwned>(&self, record: T) -> Option<T> {
        self.contains(&record).then_some(record)
    }

    /// Keep only the records that belong to this scope.
    pub fn retain<T: FirmOwned>(&self, records: impl IntoIterator<Item = T>) -> Vec<T> {
        records.into_iter().filter(|r| self.contains(r)).collect()
    }
}

pub fn scope_of(principal: &Principal) -> TenantScope {
    TenantScope::of(principal)
}
