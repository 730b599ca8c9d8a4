//! # Remote Memory Contracts
//!
//! The interfaces a memory block talks to. Nothing in this crate touches a
//! foreign address space itself; implementations live elsewhere (an OS
//! process handle, a kernel driver, or the simulator used in tests).
//!
//! - [`RemoteMemory`]: the remote memory operator. Allocates, protects,
//!   frees, reads, writes and queries memory of one target.
//! - [`PhysicalMemoryChannel`]: a privileged side channel that can protect and
//!   free memory of a target identified by its process id.
//! - [`Status`]: the 32-bit status code both report, and the process-wide
//!   [last status](last_status) slot.
//! - [`RegionInfo`]: what a query reports about the region around an address.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod operator;
mod physical;
mod region;
mod status;

pub use crate::operator::{FreeMode, RemoteMemory};
pub use crate::physical::PhysicalMemoryChannel;
pub use crate::region::{RegionInfo, RegionState};
pub use crate::status::{Status, last_status, set_last_status};
