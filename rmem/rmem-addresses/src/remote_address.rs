use crate::{PageOffset, PageSize, RemotePage};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Address inside the remote address space.
///
/// A plain `u64` carrying the *kind* of address at the type level, so values
/// read from the target are never confused with local pointers or sizes.
/// Address `0` is the null address; an allocation that could not be placed
/// is reported as [`RemoteAddress::zero`].
///
/// ### Examples
/// ```rust
/// # use rmem_addresses::*;
/// let a = RemoteAddress::new(0x7FF6_0000_1234);
/// assert_eq!(a.page::<Size4K>().base().as_u64(), 0x7FF6_0000_1000);
/// assert_eq!((a + 0x10).as_u64(), 0x7FF6_0000_1244);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RemoteAddress(u64);

impl RemoteAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checked add of a byte count, returning `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The page of size `S` that contains this address (lower bits zeroed).
    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> RemotePage<S> {
        RemotePage::containing(self)
    }

    /// The offset within the page of size `S` that contains this address.
    #[inline]
    #[must_use]
    pub const fn offset<S: PageSize>(self) -> PageOffset<S> {
        PageOffset::from_addr(self)
    }

    /// Split into (`RemotePage<S>`, `PageOffset<S>`).
    #[inline]
    #[must_use]
    pub const fn split<S: PageSize>(self) -> (RemotePage<S>, PageOffset<S>) {
        (self.page::<S>(), self.offset::<S>())
    }

    /// Align down to page boundary `S`.
    #[inline]
    #[must_use]
    pub const fn align_down<S: PageSize>(self) -> Self {
        Self(self.0 & !(S::SIZE - 1))
    }
}

impl fmt::Debug for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RA(0x{:016X})", self.0)
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for RemoteAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<RemoteAddress> for u64 {
    #[inline]
    fn from(v: RemoteAddress) -> Self {
        v.0
    }
}

impl<S: PageSize> From<RemotePage<S>> for RemoteAddress {
    #[inline]
    fn from(value: RemotePage<S>) -> Self {
        value.base()
    }
}

impl Add<u64> for RemoteAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for RemoteAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
