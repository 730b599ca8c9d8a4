//! # Simulated Target Address Space
//!
//! A page-granular model of another process' address space that lives
//! entirely inside the current process. [`SimulatedProcess`] implements
//! [`RemoteMemory`](rmem_remote::RemoteMemory) and [`SimulatedDriver`]
//! implements [`PhysicalMemoryChannel`](rmem_remote::PhysicalMemoryChannel)
//! over the same pages, so code written against those contracts can be run
//! without a second process or a kernel driver.
//!
//! ## Model
//!
//! - Memory is tracked per [`Size4K`](rmem_addresses::Size4K) page. A page is
//!   either absent (free), reserved, or committed with a protection and 4 KiB
//!   of zero-initialized backing storage.
//! - Allocations without an address hint are placed at the lowest free run
//!   that starts on the [`Size64K`](rmem_addresses::Size64K) allocation
//!   granularity.
//! - Reads honor the hole policy of the contract: unreadable pages are either
//!   zero-filled or fail the whole read.
//! - Every call is counted, and allocations, frees and protection changes can
//!   be made to fail on demand.
//!
//! ```rust
//! # use rmem_sim::*;
//! # use rmem_remote::RemoteMemory;
//! # use rmem_addresses::RemoteAddress;
//! # use rmem_protection::{PageProtectionBits, Access};
//! let target = SimulatedProcess::new(SimulatedConfig::default());
//! let rw = PageProtectionBits::from_access(Access::ReadWrite);
//! let at = target.allocate(RemoteAddress::zero(), 0x2000, rw).unwrap();
//! target.write(at + 0x10, b"hello").unwrap();
//!
//! let mut buf = [0u8; 5];
//! target.read(at + 0x10, &mut buf, false).unwrap();
//! assert_eq!(&buf, b"hello");
//! ```

mod config;
mod driver;
mod process;
mod range;
mod state;

pub use crate::config::SimulatedConfig;
pub use crate::driver::SimulatedDriver;
pub use crate::process::{CallCounters, SimulatedProcess};
