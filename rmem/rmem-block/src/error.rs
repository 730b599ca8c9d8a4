use rmem_addresses::RemoteAddress;
use rmem_remote::Status;

/// Why an operation on a [`MemoryBlock`](crate::MemoryBlock) failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BlockError {
    /// The block is empty, or an address computed from it overflows.
    #[error("block is empty or its address range is invalid")]
    InvalidRegion,
    /// The requested range does not lie within the block.
    #[error("range {offset:#x}+{len:#x} exceeds block of {size:#x} bytes")]
    OutOfBounds { offset: u64, len: u64, size: u64 },
    #[error("failed to query region: {0}")]
    QueryFailed(Status),
    /// Both the requested and the fallback placement failed.
    #[error("failed to allocate {size:#x} bytes at {desired}: {status}")]
    AllocationFailed {
        size: u64,
        desired: RemoteAddress,
        status: Status,
    },
    #[error("failed to change protection: {0}")]
    ProtectionFailed(Status),
    #[error("failed to release memory: {0}")]
    ReleaseFailed(Status),
    #[error("failed to read memory: {0}")]
    ReadFailed(Status),
    #[error("failed to write memory: {0}")]
    WriteFailed(Status),
    /// A partial release, rounded up to whole pages, is larger than the block.
    #[error("cannot release {requested:#x} bytes of a block owning {owned:#x} bytes")]
    SizeRoundingViolation { requested: u64, owned: u64 },
}

impl BlockError {
    /// The status reported by the operator or channel, if the failure came from there.
    #[must_use]
    pub const fn status(&self) -> Option<Status> {
        match *self {
            Self::QueryFailed(status)
            | Self::AllocationFailed { status, .. }
            | Self::ProtectionFailed(status)
            | Self::ReleaseFailed(status)
            | Self::ReadFailed(status)
            | Self::WriteFailed(status) => Some(status),
            Self::InvalidRegion | Self::OutOfBounds { .. } | Self::SizeRoundingViolation { .. } => {
                None
            }
        }
    }

    /// The status recorded in the last-status slot for this failure.
    pub(crate) const fn recorded_status(&self) -> Status {
        match self.status() {
            Some(status) => status,
            None => Status::INVALID_PARAMETER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_backend_failures() {
        let e = BlockError::ReleaseFailed(Status::UNABLE_TO_FREE_VM);
        assert_eq!(e.status(), Some(Status::UNABLE_TO_FREE_VM));
        assert_eq!(e.recorded_status(), Status::UNABLE_TO_FREE_VM);

        let e = BlockError::SizeRoundingViolation {
            requested: 0x3000,
            owned: 0x2000,
        };
        assert_eq!(e.status(), None);
        assert_eq!(e.recorded_status(), Status::INVALID_PARAMETER);
    }

    #[test]
    fn messages_carry_context() {
        let e = BlockError::AllocationFailed {
            size: 0x2000,
            desired: RemoteAddress::new(0x40_0000),
            status: Status::NO_MEMORY,
        };
        assert_eq!(
            e.to_string(),
            "failed to allocate 0x2000 bytes at 0x0000000000400000: NO_MEMORY (0xC0000017)"
        );
    }
}
