use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// A 32-bit status code as reported by remote memory operators.
///
/// The two most significant bits carry the severity:
///
/// | Bits 31–30 | Severity      | Counts as success |
/// |------------|---------------|-------------------|
/// | `00`       | success       | yes               |
/// | `01`       | informational | yes               |
/// | `10`       | warning       | no                |
/// | `11`       | error         | no                |
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Status(u32);

impl Status {
    pub const SUCCESS: Self = Self(0x0000_0000);
    /// The operation succeeded, but not at the requested base address.
    pub const IMAGE_NOT_AT_BASE: Self = Self(0x4000_0003);
    /// Only part of a read or write request was completed.
    pub const PARTIAL_COPY: Self = Self(0x8000_000D);
    pub const UNSUCCESSFUL: Self = Self(0xC000_0001);
    pub const ACCESS_VIOLATION: Self = Self(0xC000_0005);
    pub const INVALID_PARAMETER: Self = Self(0xC000_000D);
    pub const NO_MEMORY: Self = Self(0xC000_0017);
    pub const CONFLICTING_ADDRESSES: Self = Self(0xC000_0018);
    pub const UNABLE_TO_FREE_VM: Self = Self(0xC000_001A);
    pub const NOT_COMMITTED: Self = Self(0xC000_002D);
    pub const INVALID_PAGE_PROTECTION: Self = Self(0xC000_0045);
    pub const MEMORY_NOT_ALLOCATED: Self = Self(0xC000_00A0);
    pub const INVALID_ADDRESS: Self = Self(0xC000_0141);

    #[inline]
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        Self(code)
    }

    #[inline]
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn severity(self) -> u32 {
        self.0 >> 30
    }

    /// Success or informational.
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.severity() <= 1
    }

    #[inline]
    #[must_use]
    pub const fn is_informational(self) -> bool {
        self.severity() == 1
    }

    #[inline]
    #[must_use]
    pub const fn is_warning(self) -> bool {
        self.severity() == 2
    }

    #[inline]
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.severity() == 3
    }

    /// Symbolic name of well-known codes.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "SUCCESS",
            Self::IMAGE_NOT_AT_BASE => "IMAGE_NOT_AT_BASE",
            Self::PARTIAL_COPY => "PARTIAL_COPY",
            Self::UNSUCCESSFUL => "UNSUCCESSFUL",
            Self::ACCESS_VIOLATION => "ACCESS_VIOLATION",
            Self::INVALID_PARAMETER => "INVALID_PARAMETER",
            Self::NO_MEMORY => "NO_MEMORY",
            Self::CONFLICTING_ADDRESSES => "CONFLICTING_ADDRESSES",
            Self::UNABLE_TO_FREE_VM => "UNABLE_TO_FREE_VM",
            Self::NOT_COMMITTED => "NOT_COMMITTED",
            Self::INVALID_PAGE_PROTECTION => "INVALID_PAGE_PROTECTION",
            Self::MEMORY_NOT_ALLOCATED => "MEMORY_NOT_ALLOCATED",
            Self::INVALID_ADDRESS => "INVALID_ADDRESS",
            _ => return None,
        })
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({self})")
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({:#010X})", self.0),
            None => write!(f, "{:#010X}", self.0),
        }
    }
}

impl core::error::Error for Status {}

impl From<u32> for Status {
    #[inline]
    fn from(code: u32) -> Self {
        Self(code)
    }
}

static LAST_STATUS: AtomicU32 = AtomicU32::new(0);

/// The status most recently recorded by any operation in this process.
///
/// This is a diagnostic slot only. Operations report their outcome through
/// their return value; nothing should branch on this.
#[must_use]
pub fn last_status() -> Status {
    Status(LAST_STATUS.load(Ordering::Relaxed))
}

/// Record `status` as the last status and hand it back.
pub fn set_last_status(status: Status) -> Status {
    LAST_STATUS.store(status.0, Ordering::Relaxed);
    status
}
