use crate::{FreeMode, Status};
use rmem_addresses::RemoteAddress;
use rmem_protection::PageProtectionBits;

/// Privileged side channel to memory of a target process.
///
/// Mirrors the protect and free primitives of [`RemoteMemory`](crate::RemoteMemory),
/// addressing the target by process id instead of through an open handle.
pub trait PhysicalMemoryChannel {
    /// # Errors
    /// The channel's status.
    fn protect(
        &self,
        process_id: u32,
        address: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<(), Status>;

    /// # Errors
    /// The channel's status.
    fn free(
        &self,
        process_id: u32,
        address: RemoteAddress,
        size: u64,
        mode: FreeMode,
    ) -> Result<(), Status>;
}
