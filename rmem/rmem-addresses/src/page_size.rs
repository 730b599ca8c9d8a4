use core::fmt;
use core::hash::Hash;

/// Sealed trait pattern to restrict `PageSize` impls to our markers.
mod sealed {
    pub trait Sealed {}
}

/// Marker trait for the granularities of the remote address space.
pub trait PageSize:
    sealed::Sealed + Clone + Copy + Eq + PartialEq + Ord + PartialOrd + Hash + fmt::Display + fmt::Debug
{
    /// Granularity in bytes (power of two).
    const SIZE: u64;
    /// log2(SIZE), i.e., number of low bits used for the offset.
    const SHIFT: u32;

    fn as_str() -> &'static str;

    /// Round `len` up to the next multiple of [`SIZE`](Self::SIZE).
    ///
    /// Returns `None` if the rounded value does not fit into `u64`.
    #[inline]
    #[must_use]
    fn align_up(len: u64) -> Option<u64> {
        match len.checked_add(Self::SIZE - 1) {
            Some(v) => Some(v & !(Self::SIZE - 1)),
            None => None,
        }
    }

    /// Round `len` down to a multiple of [`SIZE`](Self::SIZE).
    #[inline]
    #[must_use]
    fn align_down(len: u64) -> u64 {
        len & !(Self::SIZE - 1)
    }

    /// Whether `value` is a multiple of [`SIZE`](Self::SIZE).
    #[inline]
    #[must_use]
    fn is_aligned(value: u64) -> bool {
        value & (Self::SIZE - 1) == 0
    }

    /// Number of units needed to cover `len` bytes.
    #[inline]
    #[must_use]
    fn pages_for(len: u64) -> Option<u64> {
        Self::align_up(len).map(|v| v >> Self::SHIFT)
    }
}

/// 4 KiB page (4096 bytes), the page granularity.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size4K;
impl sealed::Sealed for Size4K {}
impl PageSize for Size4K {
    const SIZE: u64 = 4096;
    const SHIFT: u32 = 12;

    fn as_str() -> &'static str {
        "4K"
    }
}

/// 64 KiB (`65_536` bytes), the allocation granularity.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size64K;
impl sealed::Sealed for Size64K {}
impl PageSize for Size64K {
    const SIZE: u64 = 64 * 1024;
    const SHIFT: u32 = 16;

    fn as_str() -> &'static str {
        "64K"
    }
}

impl fmt::Display for Size4K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::as_str())
    }
}

impl fmt::Display for Size64K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::as_str())
    }
}

impl fmt::Debug for Size4K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl fmt::Debug for Size64K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}
