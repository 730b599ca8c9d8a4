use crate::{PageSize, RemoteAddress};
use core::fmt;
use core::marker::PhantomData;

/// The offset within a page of size `S` (`0..S::SIZE-1`).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageOffset<S: PageSize> {
    value: u64,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> PageOffset<S> {
    /// Create from a raw value, asserting it is < `S::SIZE` in debug.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        debug_assert!(value < S::SIZE, "offset must be < page size");
        Self {
            value: value & (S::SIZE - 1),
            _phantom: PhantomData,
        }
    }

    /// Construct from a full address's offset bits.
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: RemoteAddress) -> Self {
        Self {
            value: addr.as_u64() & (S::SIZE - 1),
            _phantom: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.value
    }
}

impl<S: PageSize> fmt::Debug for PageOffset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Offset<{}>({:#X})",
            core::any::type_name::<S>(),
            self.value
        )
    }
}
