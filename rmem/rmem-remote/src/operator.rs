use crate::{RegionInfo, Status};
use rmem_addresses::RemoteAddress;
use rmem_protection::{PageProtectionBits, PageProtectionTranslator, ProtectionTranslator};

/// How [`RemoteMemory::free`] gives memory back.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FreeMode {
    /// Drop the backing storage but keep the address range reserved.
    Decommit,
    /// Give the address range back entirely.
    Release,
}

/// Operator that services memory of one target address space.
///
/// Every call is a synchronous round trip into the target. Methods take
/// `&self` since the operator usually wraps an OS handle; implementations
/// that keep local state must synchronize it themselves.
pub trait RemoteMemory {
    /// Identity of the target, as understood by a [`PhysicalMemoryChannel`](crate::PhysicalMemoryChannel).
    fn process_id(&self) -> u32;

    /// Whether data-execution-prevention is enforced in the target.
    fn dep_enabled(&self) -> bool;

    /// Translator used to encode protections for this operator.
    fn translator(&self) -> &dyn ProtectionTranslator {
        &PageProtectionTranslator
    }

    /// Reserve and commit `size` bytes.
    ///
    /// A zero `hint` lets the target choose the address; otherwise the
    /// allocation must start at `hint` or fail.
    ///
    /// # Errors
    /// The target's status, e.g. [`Status::CONFLICTING_ADDRESSES`] if the
    /// hinted range is in use or [`Status::NO_MEMORY`].
    fn allocate(
        &self,
        hint: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<RemoteAddress, Status>;

    /// Change the protection of `[address, address + size)`, returning the
    /// previous protection of the first page.
    ///
    /// # Errors
    /// The target's status, e.g. [`Status::NOT_COMMITTED`].
    fn protect(
        &self,
        address: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<PageProtectionBits, Status>;

    /// Decommit or release `[address, address + size)`.
    ///
    /// # Errors
    /// The target's status, e.g. [`Status::MEMORY_NOT_ALLOCATED`].
    fn free(&self, address: RemoteAddress, size: u64, mode: FreeMode) -> Result<(), Status>;

    /// Read `dest.len()` bytes starting at `address`.
    ///
    /// With `handle_holes` set, pages that cannot be read (uncommitted or
    /// inaccessible) are zero-filled in `dest` and the rest is still read;
    /// otherwise any such page fails the whole read.
    ///
    /// # Errors
    /// The target's status, e.g. [`Status::PARTIAL_COPY`].
    fn read(&self, address: RemoteAddress, dest: &mut [u8], handle_holes: bool)
    -> Result<(), Status>;

    /// Write `src` starting at `address`.
    ///
    /// # Errors
    /// The target's status, e.g. [`Status::ACCESS_VIOLATION`].
    fn write(&self, address: RemoteAddress, src: &[u8]) -> Result<(), Status>;

    /// Describe the region around `address`.
    ///
    /// # Errors
    /// The target's status, e.g. [`Status::INVALID_PARAMETER`] for addresses
    /// outside the target's address range.
    fn query(&self, address: RemoteAddress) -> Result<RegionInfo, Status>;
}
