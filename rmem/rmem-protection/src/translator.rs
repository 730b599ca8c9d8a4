use crate::{PageProtectionBits, Protection};

/// Converts between the generic [`Protection`] and the backend encoding.
pub trait ProtectionTranslator {
    /// Encode `protection` for the backend, honoring the target's DEP policy.
    fn translate(&self, protection: Protection, dep_enabled: bool) -> PageProtectionBits;

    /// Decode a backend value. Returns `None` for values that do not carry
    /// exactly one access class (e.g. the protection of a free region).
    fn decode(&self, encoded: PageProtectionBits) -> Option<Protection>;
}

/// Strip execute from a readable access when DEP is disabled.
///
/// Without DEP the target executes every readable page anyway, so the
/// non-executable class is requested instead. Modifiers are kept as they are.
#[inline]
#[must_use]
pub const fn cast_protection(protection: Protection, dep_enabled: bool) -> Protection {
    if dep_enabled {
        protection
    } else {
        protection.with_access(protection.access().without_execute())
    }
}

/// Translator for the [`PageProtectionBits`] layout.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PageProtectionTranslator;

impl ProtectionTranslator for PageProtectionTranslator {
    fn translate(&self, protection: Protection, dep_enabled: bool) -> PageProtectionBits {
        let protection = cast_protection(protection, dep_enabled);
        PageProtectionBits::from_access(protection.access()).with_modifiers(protection.modifiers())
    }

    fn decode(&self, encoded: PageProtectionBits) -> Option<Protection> {
        let access = encoded.access()?;
        Some(Protection::new(access).with_modifiers(encoded.modifiers()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Access;

    #[test]
    fn dep_enabled_keeps_access() {
        let t = PageProtectionTranslator;
        for access in Access::ALL {
            let p = Protection::new(access);
            assert_eq!(t.decode(t.translate(p, true)), Some(p));
        }
    }

    #[test]
    fn dep_disabled_strips_execute() {
        let t = PageProtectionTranslator;
        assert_eq!(t.translate(Protection::EXECUTE_READ, false).into_bits(), 0x02);
        assert_eq!(t.translate(Protection::EXECUTE_READ_WRITE, false).into_bits(), 0x04);
        assert_eq!(t.translate(Protection::EXECUTE_WRITE_COPY, false).into_bits(), 0x08);
        assert_eq!(t.translate(Protection::EXECUTE, false).into_bits(), 0x10);
        assert_eq!(t.translate(Protection::READ_WRITE, false).into_bits(), 0x04);
        assert_eq!(t.translate(Protection::NO_ACCESS, false).into_bits(), 0x01);
    }

    #[test]
    fn modifiers_pass_through() {
        let t = PageProtectionTranslator;
        let p = Protection::EXECUTE_READ.with_guard().with_no_cache();
        let e = t.translate(p, false);
        assert_eq!(e.into_bits(), 0x302);
        assert_eq!(
            t.decode(e),
            Some(Protection::READ_ONLY.with_guard().with_no_cache())
        );
    }

    #[test]
    fn free_region_does_not_decode() {
        let t = PageProtectionTranslator;
        assert_eq!(t.decode(PageProtectionBits::new()), None);
    }
}
