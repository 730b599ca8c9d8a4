use rmem_addresses::RemoteAddress;
use rmem_protection::Protection;
use utils_accessors_derive::Setters;

/// Parameters of an allocation in the remote address space.
///
/// ```rust
/// # use rmem_block::{AllocationRequest, Protection, RemoteAddress};
/// let request = AllocationRequest::new(0x2000)
///     .with_desired(0x4000_0000_u64)
///     .with_protection(Protection::READ_WRITE);
/// assert_eq!(request.desired, RemoteAddress::new(0x4000_0000));
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Setters)]
pub struct AllocationRequest {
    /// Bytes to commit.
    pub size: u64,
    /// Preferred base address; zero lets the target choose.
    #[setters(into)]
    pub desired: RemoteAddress,
    pub protection: Protection,
}

impl AllocationRequest {
    /// `size` bytes anywhere, readable, writable and executable.
    #[must_use]
    pub const fn new(size: u64) -> Self {
        Self {
            size,
            desired: RemoteAddress::zero(),
            protection: Protection::EXECUTE_READ_WRITE,
        }
    }
}
