use crate::{PageOffset, PageSize, RemoteAddress};
use core::fmt;
use core::marker::PhantomData;

/// Page base in the remote address space for granularity `S`.
///
/// ### Invariants
/// - The low `S::SHIFT` bits of the base are always zero (page aligned).
///
/// ### Examples
/// ```rust
/// # use rmem_addresses::*;
/// let a = RemoteAddress::new(0x1_2345);
/// let p = a.page::<Size4K>();
/// assert_eq!(p.base().as_u64(), 0x1_2000);
/// assert_eq!(p.next().map(RemotePage::base), Some(RemoteAddress::new(0x1_3000)));
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RemotePage<S: PageSize> {
    value: u64,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> RemotePage<S> {
    /// Page that contains `addr` (aligns down).
    #[inline]
    #[must_use]
    pub const fn containing(addr: RemoteAddress) -> Self {
        Self {
            value: addr.as_u64() & !(S::SIZE - 1),
            _phantom: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> RemoteAddress {
        RemoteAddress::new(self.value)
    }

    /// Combine with an offset to form a full address.
    #[inline]
    #[must_use]
    pub const fn join(self, off: PageOffset<S>) -> RemoteAddress {
        RemoteAddress::new(self.value + off.as_u64())
    }

    /// The page directly after this one, or `None` at the end of the address space.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.value.checked_add(S::SIZE) {
            Some(value) => Some(Self {
                value,
                _phantom: PhantomData,
            }),
            None => None,
        }
    }
}

impl<S: PageSize> fmt::Display for RemotePage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}/{}", self.value, S::as_str())
    }
}

impl<S: PageSize> fmt::Debug for RemotePage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RemotePage<{}>({:#018X})",
            core::any::type_name::<S>(),
            self.value
        )
    }
}
