use crate::Access;
use bitfield_struct::bitfield;
use core::fmt;

/// Decoration bits carried alongside an [`Access`].
///
/// These are passed through to the backend untouched.
#[bitfield(u8)]
#[derive(PartialEq, Eq, Hash)]
pub struct ProtectionModifiers {
    pub guard: bool,
    pub no_cache: bool,
    pub write_combine: bool,
    #[bits(5)]
    __: u8,
}

/// A page protection: access class plus modifiers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Protection {
    access: Access,
    modifiers: ProtectionModifiers,
}

impl Protection {
    pub const NO_ACCESS: Self = Self::new(Access::NoAccess);
    pub const READ_ONLY: Self = Self::new(Access::ReadOnly);
    pub const READ_WRITE: Self = Self::new(Access::ReadWrite);
    pub const WRITE_COPY: Self = Self::new(Access::WriteCopy);
    pub const EXECUTE: Self = Self::new(Access::Execute);
    pub const EXECUTE_READ: Self = Self::new(Access::ExecuteRead);
    pub const EXECUTE_READ_WRITE: Self = Self::new(Access::ExecuteReadWrite);
    pub const EXECUTE_WRITE_COPY: Self = Self::new(Access::ExecuteWriteCopy);

    #[inline]
    #[must_use]
    pub const fn new(access: Access) -> Self {
        Self {
            access,
            modifiers: ProtectionModifiers::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn access(self) -> Access {
        self.access
    }

    #[inline]
    #[must_use]
    pub const fn modifiers(self) -> ProtectionModifiers {
        self.modifiers
    }

    #[inline]
    #[must_use]
    pub const fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: ProtectionModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_guard(mut self) -> Self {
        self.modifiers = self.modifiers.with_guard(true);
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_no_cache(mut self) -> Self {
        self.modifiers = self.modifiers.with_no_cache(true);
        self
    }
}

impl Default for Protection {
    /// Read, write and execute, the protection fresh allocations get unless
    /// told otherwise.
    fn default() -> Self {
        Self::EXECUTE_READ_WRITE
    }
}

impl From<Access> for Protection {
    fn from(access: Access) -> Self {
        Self::new(access)
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.access.as_str())?;
        if self.modifiers.guard() {
            f.write_str("+guard")?;
        }
        if self.modifiers.no_cache() {
            f.write_str("+nocache")?;
        }
        if self.modifiers.write_combine() {
            f.write_str("+wc")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_modifiers() {
        let p = Protection::READ_WRITE.with_guard().with_no_cache();
        assert_eq!(format!("{p}"), "rw-+guard+nocache");
        assert_eq!(format!("{}", Protection::EXECUTE_READ), "r-x");
    }

    #[test]
    fn default_is_rwx() {
        assert_eq!(Protection::default().access(), Access::ExecuteReadWrite);
        assert_eq!(Protection::default().modifiers(), ProtectionModifiers::new());
    }
}
