//! # Page Protection
//!
//! A backend-neutral description of page protection and the translation into
//! the encoding a remote memory operator understands.
//!
//! ## What you get
//! - [`Access`]: the access class of a page (no-access, read-only, read-write,
//!   write-copy and their executable twins).
//! - [`ProtectionModifiers`]: decoration bits (guard, no-cache, write-combine)
//!   that travel with a protection but are never interpreted here.
//! - [`Protection`]: access plus modifiers, the value callers work with.
//! - [`PageProtectionBits`]: the backend encoding, one bit per access class
//!   followed by the modifier bits, in the classic `PAGE_*` layout.
//! - [`ProtectionTranslator`] / [`PageProtectionTranslator`]: conversion in both
//!   directions, honoring the target's data-execution-prevention (DEP) policy.
//!
//! ## DEP
//!
//! When DEP is disabled in the target, every readable page is also
//! executable. A readable executable access is then requested as its
//! non-executable class, which the target enforces identically:
//!
//! | Requested | DEP enabled | DEP disabled |
//! |-----------|-------------|--------------|
//! | `ExecuteRead` | `ExecuteRead` | `ReadOnly` |
//! | `ExecuteReadWrite` | `ExecuteReadWrite` | `ReadWrite` |
//! | `ExecuteWriteCopy` | `ExecuteWriteCopy` | `WriteCopy` |
//!
//! Every other access is passed through.
//!
//! ```rust
//! # use rmem_protection::*;
//! let t = PageProtectionTranslator;
//! let rwx = Protection::EXECUTE_READ_WRITE;
//! assert_eq!(t.translate(rwx, true).into_bits(), 0x40);
//! assert_eq!(t.translate(rwx, false).into_bits(), 0x04);
//! let rw = Protection::READ_WRITE;
//! assert_eq!(t.decode(PageProtectionBits::from_bits(0x104)), Some(rw.with_guard()));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod access;
mod encoding;
mod protection;
mod translator;

pub use crate::access::Access;
pub use crate::encoding::PageProtectionBits;
pub use crate::protection::{Protection, ProtectionModifiers};
pub use crate::translator::{PageProtectionTranslator, ProtectionTranslator, cast_protection};
