use crate::{AllocationRequest, Backend, BlockError, Placement};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;
use core::mem::ManuallyDrop;
use log::{debug, trace, warn};
use rmem_addresses::{PageSize, RemoteAddress, Size4K};
use rmem_protection::Protection;
use rmem_remote::{FreeMode, RemoteMemory, Status, set_last_status};

/// Handle to one contiguous region of a remote address space.
///
/// ### State
/// - `address`/`size`: the range currently covered. A partial
///   [`free`](Self::free) shifts the start forward and shrinks the size; a
///   [`reallocate`](Self::reallocate) replaces both.
/// - `base`: start of the range the block still holds in the target. Pages
///   between `base` and `address` were decommitted by partial frees and are
///   given back together with the rest on a full release.
/// - `protection`: the protection most recently applied through this block,
///   `None` once the block is empty (or if the target did not report one).
/// - `owns`: whether dropping the block releases the region.
/// - `backend`: which collaborator services protect and free.
///
/// ### Invariants
/// - An empty block has address 0, size 0 and no protection.
/// - Ownership and backend only change through [`reset`](Self::reset).
/// - A failed operation leaves every field unchanged.
/// - `base <= address`.
///
/// ### Releasing
/// An explicit [`free`](Self::free) always releases, whether or not the block
/// owns the region. Every implicit release ([`Drop`],
/// [`reset`](Self::reset) and the old region in
/// [`reallocate`](Self::reallocate)) only happens when the block owns it.
///
/// A block is not meant to be shared between threads; calls on one block must
/// be serialized by the caller.
pub struct MemoryBlock<'m, M: RemoteMemory + ?Sized> {
    memory: &'m M,
    base: RemoteAddress,
    address: RemoteAddress,
    size: u64,
    protection: Option<Protection>,
    owns: bool,
    backend: Backend<'m>,
    placement: Placement,
    last_status: Cell<Status>,
}

impl<'m, M: RemoteMemory + ?Sized> MemoryBlock<'m, M> {
    /// An empty, non-owning block. Every operation other than
    /// [`reallocate`](Self::reallocate) and the no-op release paths fails on it.
    #[must_use]
    pub const fn empty(memory: &'m M) -> Self {
        Self {
            memory,
            base: RemoteAddress::zero(),
            address: RemoteAddress::zero(),
            size: 0,
            protection: None,
            owns: false,
            backend: Backend::Virtual,
            placement: Placement::Requested,
            last_status: Cell::new(Status::SUCCESS),
        }
    }

    /// Wrap a region whose address, size and protection are already known.
    #[must_use]
    pub const fn new(
        memory: &'m M,
        address: RemoteAddress,
        size: u64,
        protection: Protection,
        owns: bool,
        backend: Backend<'m>,
    ) -> Self {
        Self {
            memory,
            base: address,
            address,
            size,
            protection: Some(protection),
            owns,
            backend,
            placement: Placement::Requested,
            last_status: Cell::new(Status::SUCCESS),
        }
    }

    /// Wrap the region at `address`, taking size and protection from a query.
    ///
    /// The block extends from `address` to the end of the run of pages that
    /// share the attributes of the page containing `address`.
    ///
    /// # Errors
    /// - [`BlockError::QueryFailed`] if the operator cannot query `address`.
    /// - [`BlockError::InvalidRegion`] if `address` is null or lies in a free region.
    pub fn from_query(memory: &'m M, address: RemoteAddress, owns: bool) -> Result<Self, BlockError> {
        if address.is_null() {
            return Err(record_failure(BlockError::InvalidRegion));
        }

        let info = memory
            .query(address)
            .map_err(|status| record_failure(BlockError::QueryFailed(status)))?;
        let size = info
            .base
            .as_u64()
            .saturating_add(info.size)
            .saturating_sub(address.as_u64());
        if info.is_free() || size == 0 {
            return Err(record_failure(BlockError::InvalidRegion));
        }

        trace!(
            "wrapping {address}: {size:#x} bytes, {:?}, protection {:#x}",
            info.state,
            info.protection.into_bits()
        );

        Ok(Self {
            memory,
            base: address,
            address,
            size,
            protection: memory.translator().decode(info.protection),
            owns,
            backend: Backend::Virtual,
            placement: Placement::Requested,
            last_status: Cell::new(Status::SUCCESS),
        })
    }

    /// Allocate a fresh, owning block.
    ///
    /// If the first attempt fails, the allocation is retried once wherever the
    /// target chooses. When a desired address was named, a block placed by
    /// the retry reports [`Placement::Relocated`] and records
    /// [`Status::IMAGE_NOT_AT_BASE`]; it is still a successful allocation.
    ///
    /// # Errors
    /// [`BlockError::AllocationFailed`] if both attempts failed.
    pub fn allocate(memory: &'m M, request: AllocationRequest) -> Result<Self, BlockError> {
        let (address, placement) = allocate_region(memory, &request)?;
        let status = if placement.is_relocated() {
            Status::IMAGE_NOT_AT_BASE
        } else {
            Status::SUCCESS
        };

        Ok(Self {
            memory,
            base: address,
            address,
            size: request.size,
            protection: Some(request.protection),
            owns: true,
            backend: Backend::Virtual,
            placement,
            last_status: Cell::new(status),
        })
    }

    /// Move the block to a freshly allocated region.
    ///
    /// The new region is allocated first, with the same fallback as
    /// [`allocate`](Self::allocate). Only once that succeeded is the current
    /// region released (if this block owns it) and the new one adopted.
    /// Ownership is unchanged: a non-owning block does not take the new
    /// region over. Returns the new address.
    ///
    /// # Errors
    /// - [`BlockError::AllocationFailed`] if no placement succeeded.
    /// - [`BlockError::ReleaseFailed`] if the current region could not be
    ///   released; the new region is given back in that case.
    ///
    /// The block is unchanged on every error.
    pub fn reallocate(&mut self, request: AllocationRequest) -> Result<RemoteAddress, BlockError> {
        let (address, placement) = match allocate_region(self.memory, &request) {
            Ok(allocated) => allocated,
            Err(e) => return Err(self.fail(e)),
        };

        if self.owns
            && !self.address.is_null()
            && let Err(status) = self.release(self.base, self.held(), FreeMode::Release)
        {
            if let Err(rollback) = self.memory.free(address, request.size, FreeMode::Release) {
                warn!("leaking {address}: rollback after failed reallocation failed: {rollback}");
            }
            return Err(self.fail(BlockError::ReleaseFailed(status)));
        }

        debug!(
            "reallocated {} ({:#x} bytes) to {address} ({:#x} bytes)",
            self.address, self.size, request.size
        );

        self.base = address;
        self.address = address;
        self.size = request.size;
        self.protection = Some(request.protection);
        self.placement = placement;
        self.last_status.set(if placement.is_relocated() {
            Status::IMAGE_NOT_AT_BASE
        } else {
            Status::SUCCESS
        });
        Ok(address)
    }

    /// Change the protection of `[offset, offset + len)`.
    ///
    /// A `len` of zero covers the rest of the block from `offset`. Returns the
    /// previous protection where the backend reports one (the physical
    /// channel does not).
    ///
    /// # Errors
    /// - [`BlockError::InvalidRegion`] on an empty block.
    /// - [`BlockError::OutOfBounds`] if the range leaves the block.
    /// - [`BlockError::ProtectionFailed`] with the backend's status.
    pub fn protect(
        &mut self,
        protection: Protection,
        offset: u64,
        len: u64,
    ) -> Result<Option<Protection>, BlockError> {
        let len = if len == 0 {
            self.size.saturating_sub(offset)
        } else {
            len
        };
        let address = self.range(offset, len)?;

        let translator = self.memory.translator();
        let encoded = translator.translate(protection, self.memory.dep_enabled());
        trace!("protect {address}+{len:#x} as {protection} ({:#x})", encoded.into_bits());

        let result = match self.backend {
            Backend::Virtual => self
                .memory
                .protect(address, len, encoded)
                .map(|previous| translator.decode(previous)),
            Backend::Physical(channel) => channel
                .protect(self.memory.process_id(), address, len, encoded)
                .map(|()| None),
        };

        match result {
            Ok(previous) => {
                self.protection = Some(protection);
                self.last_status.set(Status::SUCCESS);
                Ok(previous)
            }
            Err(status) => Err(self.fail(BlockError::ProtectionFailed(status))),
        }
    }

    /// Release the whole block (`size == 0`) or its leading `size` bytes.
    ///
    /// A partial release is rounded up to whole pages, decommits that many
    /// bytes from the start of the block and moves the block past them. A
    /// full release gives back everything the block still holds, including
    /// pages decommitted by earlier partial releases, and leaves the block
    /// empty. Releasing an empty block succeeds without doing anything.
    ///
    /// # Errors
    /// - [`BlockError::SizeRoundingViolation`] if the rounded size exceeds
    ///   the size of the block.
    /// - [`BlockError::ReleaseFailed`] with the backend's status.
    pub fn free(&mut self, size: u64) -> Result<(), BlockError> {
        if self.address.is_null() {
            return Ok(());
        }

        let violation = BlockError::SizeRoundingViolation {
            requested: size,
            owned: self.size,
        };
        let rounded = match Size4K::align_up(size) {
            Some(rounded) if rounded <= self.size => rounded,
            _ => return Err(self.fail(violation)),
        };

        if rounded == 0 {
            let held = self.held();
            if let Err(status) = self.release(self.base, held, FreeMode::Release) {
                return Err(self.fail(BlockError::ReleaseFailed(status)));
            }
            debug!("released {} ({held:#x} bytes)", self.base);
            self.base = RemoteAddress::zero();
            self.address = RemoteAddress::zero();
            self.size = 0;
            self.protection = None;
            self.placement = Placement::Requested;
        } else {
            let Some(next) = self.address.checked_add(rounded) else {
                return Err(self.fail(BlockError::InvalidRegion));
            };
            if let Err(status) = self.release(self.address, rounded, FreeMode::Decommit) {
                return Err(self.fail(BlockError::ReleaseFailed(status)));
            }
            debug!("released leading {rounded:#x} bytes of {}", self.address);
            if self.backend.is_physical() {
                self.base = next;
            }
            self.address = next;
            self.size = self.size.saturating_sub(rounded);
        }

        self.last_status.set(Status::SUCCESS);
        Ok(())
    }

    /// Read `dest.len()` bytes starting at `offset`.
    ///
    /// With `handle_holes` set, pages the target cannot read are zero-filled
    /// instead of failing the read.
    ///
    /// # Errors
    /// - [`BlockError::InvalidRegion`] on an empty block.
    /// - [`BlockError::OutOfBounds`] if the range leaves the block.
    /// - [`BlockError::ReadFailed`] with the operator's status.
    pub fn read(&self, offset: u64, dest: &mut [u8], handle_holes: bool) -> Result<(), BlockError> {
        let address = self.range(offset, dest.len() as u64)?;
        trace!("read {address}+{:#x} (holes: {handle_holes})", dest.len());
        match self.memory.read(address, dest, handle_holes) {
            Ok(()) => {
                self.last_status.set(Status::SUCCESS);
                Ok(())
            }
            Err(status) => Err(self.fail(BlockError::ReadFailed(status))),
        }
    }

    /// Read `len` bytes starting at `offset` into a new buffer.
    ///
    /// # Errors
    /// See [`read`](Self::read).
    pub fn read_vec(&self, offset: u64, len: usize, handle_holes: bool) -> Result<Vec<u8>, BlockError> {
        let mut buffer = vec![0; len];
        self.read(offset, &mut buffer, handle_holes)?;
        Ok(buffer)
    }

    /// Write `src` starting at `offset`.
    ///
    /// # Errors
    /// - [`BlockError::InvalidRegion`] on an empty block.
    /// - [`BlockError::OutOfBounds`] if the range leaves the block.
    /// - [`BlockError::WriteFailed`] with the operator's status.
    pub fn write(&self, offset: u64, src: &[u8]) -> Result<(), BlockError> {
        let address = self.range(offset, src.len() as u64)?;
        trace!("write {address}+{:#x}", src.len());
        match self.memory.write(address, src) {
            Ok(()) => {
                self.last_status.set(Status::SUCCESS);
                Ok(())
            }
            Err(status) => Err(self.fail(BlockError::WriteFailed(status))),
        }
    }

    /// Release the region if this block owns it, then turn the block into an
    /// empty, non-owning one. A release failure is logged and otherwise
    /// ignored. Calling this again is a no-op.
    ///
    /// To give back a region the block does not own, call [`free`](Self::free)
    /// first.
    pub fn reset(&mut self) {
        if self.owns
            && let Err(e) = self.free(0)
        {
            warn!("reset of {} abandoned the region: {e}", self.address);
        }

        self.base = RemoteAddress::zero();
        self.address = RemoteAddress::zero();
        self.size = 0;
        self.protection = None;
        self.owns = false;
        self.backend = Backend::Virtual;
        self.placement = Placement::Requested;
    }

    /// A non-owning handle to the same range.
    #[must_use]
    pub fn view(&self) -> Self {
        Self {
            memory: self.memory,
            base: self.base,
            address: self.address,
            size: self.size,
            protection: self.protection,
            owns: false,
            backend: self.backend,
            placement: self.placement,
            last_status: Cell::new(Status::SUCCESS),
        }
    }

    /// Give up the block without releasing it, returning the range it still
    /// holds in the target.
    ///
    /// The range starts before [`address`](Self::address) if partial frees
    /// decommitted leading pages. Whoever takes the range over becomes
    /// responsible for releasing it.
    #[must_use]
    pub fn into_raw(self) -> (RemoteAddress, u64) {
        let this = ManuallyDrop::new(self);
        (this.base, this.held())
    }

    #[inline]
    #[must_use]
    pub const fn address(&self) -> RemoteAddress {
        self.address
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// One past the last byte of the block.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> RemoteAddress {
        RemoteAddress::new(self.address.as_u64().saturating_add(self.size))
    }

    #[inline]
    #[must_use]
    pub const fn protection(&self) -> Option<Protection> {
        self.protection
    }

    #[inline]
    #[must_use]
    pub const fn owns(&self) -> bool {
        self.owns
    }

    #[inline]
    #[must_use]
    pub const fn backend(&self) -> Backend<'m> {
        self.backend
    }

    #[inline]
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    #[inline]
    #[must_use]
    pub const fn memory(&self) -> &'m M {
        self.memory
    }

    /// `false` for an empty block.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.address.is_null()
    }

    /// Outcome of the last operation on this block. Diagnostics only.
    #[inline]
    #[must_use]
    pub fn last_status(&self) -> Status {
        self.last_status.get()
    }

    /// Bytes from `base` to the end of the block.
    const fn held(&self) -> u64 {
        self.address
            .as_u64()
            .saturating_sub(self.base.as_u64())
            .saturating_add(self.size)
    }

    /// Start address of `[offset, offset + len)` after bounds checking.
    fn range(&self, offset: u64, len: u64) -> Result<RemoteAddress, BlockError> {
        if self.address.is_null() {
            return Err(self.fail(BlockError::InvalidRegion));
        }
        if offset.checked_add(len).is_none_or(|end| end > self.size) {
            return Err(self.fail(BlockError::OutOfBounds {
                offset,
                len,
                size: self.size,
            }));
        }
        self.address
            .checked_add(offset)
            .ok_or_else(|| self.fail(BlockError::InvalidRegion))
    }

    /// Dispatch a release to the backend.
    ///
    /// The physical channel has no notion of decommitting; it always releases.
    fn release(&self, address: RemoteAddress, size: u64, mode: FreeMode) -> Result<(), Status> {
        match self.backend {
            Backend::Virtual => self.memory.free(address, size, mode),
            Backend::Physical(channel) => {
                channel.free(self.memory.process_id(), address, size, FreeMode::Release)
            }
        }
    }

    fn fail(&self, error: BlockError) -> BlockError {
        self.last_status.set(error.recorded_status());
        record_failure(error)
    }
}

impl<M: RemoteMemory + ?Sized> Drop for MemoryBlock<'_, M> {
    fn drop(&mut self) {
        if self.owns
            && !self.address.is_null()
            && let Err(e) = self.free(0)
        {
            warn!("leaking {} ({:#x} bytes): {e}", self.address, self.size);
        }
    }
}

impl<M: RemoteMemory + ?Sized> fmt::Debug for MemoryBlock<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("address", &self.address)
            .field("size", &format_args!("{:#x}", self.size))
            .field("protection", &self.protection)
            .field("owns", &self.owns)
            .field("backend", &self.backend)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

fn record_failure(error: BlockError) -> BlockError {
    set_last_status(error.recorded_status());
    error
}

/// Allocate per `request`, falling back to a target-chosen address.
fn allocate_region<M: RemoteMemory + ?Sized>(
    memory: &M,
    request: &AllocationRequest,
) -> Result<(RemoteAddress, Placement), BlockError> {
    let desired = request.desired;
    let failed = |status| {
        record_failure(BlockError::AllocationFailed {
            size: request.size,
            desired,
            status,
        })
    };

    if request.size == 0 {
        return Err(failed(Status::INVALID_PARAMETER));
    }

    let encoded = memory
        .translator()
        .translate(request.protection, memory.dep_enabled());

    let (address, placement) = match memory.allocate(desired, request.size, encoded) {
        Ok(address) => (address, Placement::Requested),
        Err(status) => {
            debug!("cannot allocate {:#x} bytes at {desired} ({status}), retrying anywhere", request.size);
            let address = memory
                .allocate(RemoteAddress::zero(), request.size, encoded)
                .map_err(failed)?;
            if desired.is_null() {
                (address, Placement::Requested)
            } else {
                warn!("allocated {:#x} bytes at {address} instead of {desired}", request.size);
                set_last_status(Status::IMAGE_NOT_AT_BASE);
                (address, Placement::Relocated { requested: desired })
            }
        }
    };

    if address.is_null() {
        return Err(failed(Status::NO_MEMORY));
    }

    debug!("allocated {:#x} bytes at {address} ({})", request.size, request.protection);
    Ok((address, placement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmem_sim::{SimulatedConfig, SimulatedProcess};

    fn target() -> SimulatedProcess {
        let _ = env_logger::builder().is_test(true).try_init();
        SimulatedProcess::new(SimulatedConfig::default())
    }

    fn rw(size: u64) -> AllocationRequest {
        AllocationRequest::new(size).with_protection(Protection::READ_WRITE)
    }

    #[test]
    fn empty_block_has_nothing() {
        let t = target();
        let b = MemoryBlock::empty(&t);
        assert!(!b.is_valid());
        assert!(!b.owns());
        assert_eq!(b.size(), 0);
        assert_eq!(b.protection(), None);
        assert_eq!(b.end(), RemoteAddress::zero());
    }

    #[test]
    fn range_checks_bounds() {
        let t = target();
        let b = MemoryBlock::allocate(&t, rw(0x2000)).unwrap();
        assert_eq!(b.range(0, 0x2000), Ok(b.address()));
        assert_eq!(b.range(0x1fff, 1), Ok(b.address() + 0x1fff));
        assert_eq!(
            b.range(0x1fff, 2),
            Err(BlockError::OutOfBounds {
                offset: 0x1fff,
                len: 2,
                size: 0x2000
            })
        );
        assert!(matches!(
            b.range(u64::MAX, 2),
            Err(BlockError::OutOfBounds { .. })
        ));
        assert_eq!(b.last_status(), Status::INVALID_PARAMETER);
    }

    #[test]
    fn range_on_empty_block_is_invalid() {
        let t = target();
        let b = MemoryBlock::empty(&t);
        assert_eq!(b.range(0, 0), Err(BlockError::InvalidRegion));
    }

    #[test]
    fn failures_are_recorded_on_the_block() {
        let t = target();
        let mut b = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
        assert_eq!(b.last_status(), Status::SUCCESS);

        t.fail_next_protects(1);
        let e = b.protect(Protection::READ_ONLY, 0, 0).unwrap_err();
        assert_eq!(e, BlockError::ProtectionFailed(Status::ACCESS_VIOLATION));
        assert_eq!(b.last_status(), Status::ACCESS_VIOLATION);
        assert_eq!(b.protection(), Some(Protection::READ_WRITE));

        b.protect(Protection::READ_ONLY, 0, 0).unwrap();
        assert_eq!(b.last_status(), Status::SUCCESS);
    }

    #[test]
    fn physical_release_never_decommits() {
        let t = target();
        let driver = rmem_sim::SimulatedDriver::new(&t);
        let a = t
            .allocate(
                RemoteAddress::zero(),
                0x2000,
                rmem_protection::PageProtectionBits::from_access(rmem_protection::Access::ReadWrite),
            )
            .unwrap();
        let b = MemoryBlock::new(&t, a, 0x2000, Protection::READ_WRITE, false, Backend::Physical(&driver));
        b.release(a, 0x1000, FreeMode::Decommit).unwrap();
        assert!(!t.is_allocated(a));
        assert!(t.is_committed(a + 0x1000));
        assert_eq!(driver.free_calls(), 1);
    }

    #[test]
    fn debug_omits_the_operator() {
        let t = target();
        let b = MemoryBlock::new(
            &t,
            RemoteAddress::new(0x1_0000),
            0x1000,
            Protection::READ_ONLY,
            false,
            Backend::Virtual,
        );
        let s = format!("{b:?}");
        assert!(s.starts_with("MemoryBlock { address: RA(0x"));
        assert!(s.contains("size: 0x1000"));
        assert!(s.contains("owns: false"));
        assert!(s.ends_with(".. }"));
    }
}
