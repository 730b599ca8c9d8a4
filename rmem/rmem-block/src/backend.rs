use core::fmt;
use rmem_addresses::RemoteAddress;
use rmem_remote::PhysicalMemoryChannel;

/// Which collaborator services protection changes and releases of a block.
///
/// Fixed when the block is constructed.
#[derive(Copy, Clone, Default)]
pub enum Backend<'m> {
    /// The block's [`RemoteMemory`](rmem_remote::RemoteMemory) operator.
    #[default]
    Virtual,
    /// A privileged physical-memory channel, addressing the target by the
    /// operator's process id.
    Physical(&'m dyn PhysicalMemoryChannel),
}

impl Backend<'_> {
    #[inline]
    #[must_use]
    pub const fn is_physical(&self) -> bool {
        matches!(self, Self::Physical(_))
    }
}

impl fmt::Debug for Backend<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual => f.write_str("Virtual"),
            Self::Physical(_) => f.write_str("Physical"),
        }
    }
}

/// Where an allocation ended up relative to where it was asked for.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Placement {
    /// At the requested address, or anywhere if no address was requested.
    #[default]
    Requested,
    /// The requested address was unavailable; the block lives elsewhere.
    Relocated { requested: RemoteAddress },
}

impl Placement {
    #[inline]
    #[must_use]
    pub const fn is_relocated(&self) -> bool {
        matches!(self, Self::Relocated { .. })
    }
}
