//! # Remote Address Types
//!
//! Strongly typed wrappers for addresses that live inside **another** address
//! space: a different process, or memory reached through a privileged
//! physical-memory channel. None of these values may be dereferenced locally;
//! they are only ever handed to whatever operator services the remote side.
//!
//! ## Overview
//!
//! | Concept | Generic | Description |
//! |----------|----------|-------------|
//! | [`RemoteAddress`] | – | A raw 64-bit address in the target address space. |
//! | [`RemotePage<S>`] | [`S: PageSize`](PageSize) | The aligned base of a page of size `S`. |
//! | [`PageOffset<S>`] | [`S: PageSize`](PageSize) | An offset within a page of size `S`. |
//!
//! ## Granularities
//!
//! Two granularities matter when working with a remote region:
//!
//! - [`Size4K`]: the page granularity. Protection changes, commits and
//!   releases always happen in whole pages of this size.
//! - [`Size64K`]: the allocation granularity. Fresh reservations chosen by the
//!   system start on a boundary of this size.
//!
//! ```rust
//! # use rmem_addresses::*;
//! let addr = RemoteAddress::new(0x0001_2345);
//! let (page, off) = addr.split::<Size4K>();
//! assert_eq!(page.base().as_u64(), 0x0001_2000);
//! assert_eq!(off.as_u64(), 0x345);
//! assert_eq!(page.join(off), addr);
//!
//! assert_eq!(Size4K::align_up(0x1001), Some(0x2000));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod page_offset;
mod page_size;
mod remote_address;
mod remote_page;

pub use crate::page_offset::PageOffset;
pub use crate::page_size::{PageSize, Size4K, Size64K};
pub use crate::remote_address::RemoteAddress;
pub use crate::remote_page::RemotePage;

/// Page granularity of the target in bytes.
pub const PAGE_GRANULARITY: u64 = Size4K::SIZE;

/// Allocation granularity of the target in bytes.
pub const ALLOCATION_GRANULARITY: u64 = Size64K::SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_4k() {
        let a = RemoteAddress::new(0x0000_7FF6_1234_5678);
        let (p, o) = a.split::<Size4K>();
        assert_eq!(p.base().as_u64() & 0xFFF, 0);
        assert_eq!(o.as_u64(), a.as_u64() & 0xFFF);
        assert_eq!(p.join(o), a);
    }

    #[test]
    fn split_and_join_64k() {
        let a = RemoteAddress::new(0x0000_0001_4003_5678);
        let (p, o) = a.split::<Size64K>();
        assert_eq!(p.base().as_u64(), 0x0000_0001_4003_0000);
        assert_eq!(o.as_u64(), 0x5678);
        assert_eq!(p.join(o), a);
    }

    #[test]
    fn rounding_sizes() {
        assert_eq!(Size4K::align_up(0), Some(0));
        assert_eq!(Size4K::align_up(1), Some(0x1000));
        assert_eq!(Size4K::align_up(0x1000), Some(0x1000));
        assert_eq!(Size4K::align_up(0x1001), Some(0x2000));
        assert_eq!(Size4K::align_up(u64::MAX), None);
        assert_eq!(Size64K::align_up(0x1_0001), Some(0x2_0000));
        assert_eq!(Size4K::align_down(0x1FFF), 0x1000);
        assert_eq!(Size4K::pages_for(0x2001), Some(3));
    }

    #[test]
    fn granularity_constants() {
        assert_eq!(PAGE_GRANULARITY, 4096);
        assert_eq!(ALLOCATION_GRANULARITY, 65536);
        assert!(Size4K::is_aligned(0x3000));
        assert!(!Size64K::is_aligned(0x3000));
    }

    #[test]
    fn checked_arithmetic() {
        let a = RemoteAddress::new(u64::MAX - 0x10);
        assert_eq!(a.checked_add(0x10), Some(RemoteAddress::new(u64::MAX)));
        assert_eq!(a.checked_add(0x11), None);
        assert!(RemoteAddress::zero().is_null());
        assert!(!a.is_null());
    }
}
