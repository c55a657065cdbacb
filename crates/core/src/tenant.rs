use crate::FirmId;

/// A record that belongs to exactly one firm.
///
/// Every tenant-owned record implements this so scope checks can be written
/// once, generically, instead of per entity.
pub trait FirmOwned {
    fn firm_id(&self) -> FirmId;
}
