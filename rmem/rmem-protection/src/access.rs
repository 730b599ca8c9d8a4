use core::fmt;

/// Access class of a page.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Access {
    /// Any access faults.
    NoAccess,
    ReadOnly,
    ReadWrite,
    /// Writable; the first write produces a private copy of the page.
    WriteCopy,
    /// Executable but not readable.
    Execute,
    ExecuteRead,
    ExecuteReadWrite,
    ExecuteWriteCopy,
}

impl Access {
    /// All access classes, in encoding order.
    pub const ALL: [Self; 8] = [
        Self::NoAccess,
        Self::ReadOnly,
        Self::ReadWrite,
        Self::WriteCopy,
        Self::Execute,
        Self::ExecuteRead,
        Self::ExecuteReadWrite,
        Self::ExecuteWriteCopy,
    ];

    #[inline]
    #[must_use]
    pub const fn is_readable(self) -> bool {
        !matches!(self, Self::NoAccess | Self::Execute)
    }

    #[inline]
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            Self::ReadWrite | Self::WriteCopy | Self::ExecuteReadWrite | Self::ExecuteWriteCopy
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(
            self,
            Self::Execute | Self::ExecuteRead | Self::ExecuteReadWrite | Self::ExecuteWriteCopy
        )
    }

    /// This access with execute stripped from the readable executable classes.
    ///
    /// `Execute` has no readable twin and maps to itself, as do the
    /// non-executable classes.
    #[inline]
    #[must_use]
    pub const fn without_execute(self) -> Self {
        match self {
            Self::ExecuteRead => Self::ReadOnly,
            Self::ExecuteReadWrite => Self::ReadWrite,
            Self::ExecuteWriteCopy => Self::WriteCopy,
            other => other,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::NoAccess => "---",
            Self::ReadOnly => "r--",
            Self::ReadWrite => "rw-",
            Self::WriteCopy => "rc-",
            Self::Execute => "--x",
            Self::ExecuteRead => "r-x",
            Self::ExecuteReadWrite => "rwx",
            Self::ExecuteWriteCopy => "rcx",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripping_execute_keeps_read_and_write() {
        for access in Access::ALL {
            let stripped = access.without_execute();
            assert_eq!(stripped.without_execute(), stripped);
            assert!(!stripped.is_executable() || stripped == Access::Execute);
            assert_eq!(stripped.is_readable(), access.is_readable());
            assert_eq!(stripped.is_writable(), access.is_writable());
        }
        assert_eq!(Access::Execute.without_execute(), Access::Execute);
        assert_eq!(Access::ExecuteReadWrite.without_execute(), Access::ReadWrite);
    }

    #[test]
    fn readable_and_writable() {
        assert!(!Access::NoAccess.is_readable());
        assert!(!Access::Execute.is_readable());
        assert!(Access::ExecuteRead.is_readable());
        assert!(!Access::ReadOnly.is_writable());
        assert!(Access::WriteCopy.is_writable());
    }
}
