use rmem_addresses::RemoteAddress;
use rmem_protection::PageProtectionBits;

/// State of the pages in a queried region.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RegionState {
    /// Not reserved by anything.
    Free,
    /// Address range is reserved, but has no backing storage.
    Reserved,
    /// Reserved and backed; accessible subject to protection.
    Committed,
}

/// Result of querying an address in the remote address space.
///
/// Describes the run of pages starting at the page containing the queried
/// address that share the same state, protection and allocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegionInfo {
    /// Page-aligned start of the run.
    pub base: RemoteAddress,
    /// Base of the allocation the run belongs to (zero for free regions).
    pub allocation_base: RemoteAddress,
    /// Length of the run in bytes.
    pub size: u64,
    /// Current protection of the run. Empty for free and reserved regions.
    pub protection: PageProtectionBits,
    pub state: RegionState,
}

impl RegionInfo {
    #[inline]
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self.state, RegionState::Free)
    }
}
