//! # Remote Memory Blocks
//!
//! A [`MemoryBlock`] is a handle to one contiguous region of memory inside
//! another address space. It binds together the region's address and size,
//! the protection last applied to it, whether the handle is responsible for
//! releasing it, and which backend services it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   MemoryBlock                       │
//! │    • allocate / reallocate / wrap existing          │
//! │    • protect, free, partial free                    │
//! │    • read / write at an offset                      │
//! └───────────┬─────────────────────────┬───────────────┘
//!             │ Backend::Virtual        │ Backend::Physical
//! ┌───────────▼─────────────┐ ┌─────────▼───────────────┐
//! │      RemoteMemory       │ │  PhysicalMemoryChannel  │
//! │  alloc, protect, free,  │ │  protect, free          │
//! │  read, write, query     │ │  (by process id)        │
//! └─────────────────────────┘ └─────────────────────────┘
//! ```
//!
//! Allocation, reads, writes and queries always go through the
//! [`RemoteMemory`](rmem_remote::RemoteMemory) operator. Protection changes and
//! releases go through the backend chosen when the block was constructed.
//!
//! ## Ownership
//!
//! A block either owns its region or it does not. An owning block releases
//! the region exactly once: through an explicit [`free`](MemoryBlock::free),
//! through [`reset`](MemoryBlock::reset), or when it is dropped. A non-owning
//! block never releases anything implicitly. Moving a block moves the
//! responsibility with it; [`view`](MemoryBlock::view) hands out a non-owning
//! second handle, [`into_raw`](MemoryBlock::into_raw) gives the region up
//! without releasing it.
//!
//! ## Errors
//!
//! Every operation returns a [`Result`] with a [`BlockError`]. A failed
//! operation leaves the block exactly as it was. In addition, failures and
//! relocated allocations are recorded in the process-wide
//! [last status](rmem_remote::last_status) slot and in the block's own
//! [`last_status`](MemoryBlock::last_status), for diagnostics only.
//!
//! ## Example
//!
//! ```rust
//! use rmem_block::{AllocationRequest, MemoryBlock};
//! use rmem_protection::Protection;
//! use rmem_sim::{SimulatedConfig, SimulatedProcess};
//!
//! let target = SimulatedProcess::new(SimulatedConfig::default());
//! let request = AllocationRequest::new(0x2000).with_protection(Protection::READ_WRITE);
//! let mut block = MemoryBlock::allocate(&target, request)?;
//! let base = block.address();
//!
//! block.write(0x1000, b"payload")?;
//! block.free(0x1000)?;
//! assert_eq!(block.address(), base + 0x1000);
//! assert_eq!(block.size(), 0x1000);
//! assert_eq!(block.read_vec(0, 7, false)?, b"payload");
//! # Ok::<(), rmem_block::BlockError>(())
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod backend;
mod block;
mod error;
mod request;

pub use crate::backend::{Backend, Placement};
pub use crate::block::MemoryBlock;
pub use crate::error::BlockError;
pub use crate::request::AllocationRequest;

pub use rmem_addresses::{PAGE_GRANULARITY, RemoteAddress};
pub use rmem_protection::{Access, Protection};
