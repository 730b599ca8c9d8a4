use crate::{Access, ProtectionModifiers};
use bitfield_struct::bitfield;

/// Backend encoding of a page protection.
///
/// One bit per access class, followed by the modifier bits. A valid encoding
/// has exactly one access bit set; any number of modifier bits may accompany
/// it.
///
/// ### Bit layout
///
/// | Bits  | Name                  | Value   |
/// |-------|-----------------------|---------|
/// | 0     | `no_access`           | `0x001` |
/// | 1     | `read_only`           | `0x002` |
/// | 2     | `read_write`          | `0x004` |
/// | 3     | `write_copy`          | `0x008` |
/// | 4     | `execute`             | `0x010` |
/// | 5     | `execute_read`        | `0x020` |
/// | 6     | `execute_read_write`  | `0x040` |
/// | 7     | `execute_write_copy`  | `0x080` |
/// | 8     | `guard`               | `0x100` |
/// | 9     | `no_cache`            | `0x200` |
/// | 10    | `write_combine`       | `0x400` |
/// | 11–31 | reserved              |         |
///
/// ### Example
/// ```rust
/// # use rmem_protection::PageProtectionBits;
/// let e = PageProtectionBits::new().with_execute_read(true).with_no_cache(true);
/// assert_eq!(e.into_bits(), 0x220);
/// ```
#[bitfield(u32)]
#[derive(PartialEq, Eq, Hash)]
pub struct PageProtectionBits {
    pub no_access: bool,
    pub read_only: bool,
    pub read_write: bool,
    pub write_copy: bool,
    pub execute: bool,
    pub execute_read: bool,
    pub execute_read_write: bool,
    pub execute_write_copy: bool,

    /// First access raises a one-shot guard-page exception.
    pub guard: bool,
    pub no_cache: bool,
    pub write_combine: bool,

    #[bits(21)]
    __: u32,
}

const ACCESS_MASK: u32 = 0xFF;

impl PageProtectionBits {
    /// The encoding of a single access class with no modifiers.
    #[must_use]
    pub const fn from_access(access: Access) -> Self {
        let bit = match access {
            Access::NoAccess => 0,
            Access::ReadOnly => 1,
            Access::ReadWrite => 2,
            Access::WriteCopy => 3,
            Access::Execute => 4,
            Access::ExecuteRead => 5,
            Access::ExecuteReadWrite => 6,
            Access::ExecuteWriteCopy => 7,
        };
        Self::from_bits(1 << bit)
    }

    /// The access class, if exactly one access bit is set.
    #[must_use]
    pub const fn access(self) -> Option<Access> {
        let bits = self.into_bits() & ACCESS_MASK;
        if bits.count_ones() != 1 {
            return None;
        }
        Some(Access::ALL[bits.trailing_zeros() as usize])
    }

    /// The modifier bits, without the access class.
    #[must_use]
    pub const fn modifiers(self) -> ProtectionModifiers {
        ProtectionModifiers::new()
            .with_guard(self.guard())
            .with_no_cache(self.no_cache())
            .with_write_combine(self.write_combine())
    }

    /// Merge modifier bits into this encoding.
    #[must_use]
    pub const fn with_modifiers(self, modifiers: ProtectionModifiers) -> Self {
        self.with_guard(modifiers.guard())
            .with_no_cache(modifiers.no_cache())
            .with_write_combine(modifiers.write_combine())
    }

    /// `true` if no bit at all is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.into_bits() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_bits_match_page_constants() {
        let expected = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];
        for (access, bits) in Access::ALL.into_iter().zip(expected) {
            let e = PageProtectionBits::from_access(access);
            assert_eq!(e.into_bits(), bits);
            assert_eq!(e.access(), Some(access));
        }
    }

    #[test]
    fn modifiers_are_separate_from_access() {
        let e = PageProtectionBits::from_bits(0x704);
        assert_eq!(e.access(), Some(Access::ReadWrite));
        let m = e.modifiers();
        assert!(m.guard() && m.no_cache() && m.write_combine());
    }

    #[test]
    fn ambiguous_access_is_rejected() {
        assert_eq!(PageProtectionBits::from_bits(0).access(), None);
        assert_eq!(PageProtectionBits::from_bits(0x06).access(), None);
        assert_eq!(PageProtectionBits::from_bits(0x100).access(), None);
        assert!(PageProtectionBits::new().is_empty());
    }
}
