use crate::SimulatedConfig;
use crate::state::{Faults, PAGE, Page, State};
use log::debug;
use rmem_addresses::{RemoteAddress, Size4K};
use rmem_protection::PageProtectionBits;
use rmem_remote::{FreeMode, RegionInfo, RemoteMemory, Status};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Number of calls a [`SimulatedProcess`] has serviced, per primitive.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CallCounters {
    pub allocate: u32,
    pub protect: u32,
    pub free: u32,
    pub read: u32,
    pub write: u32,
    pub query: u32,
}

/// A simulated target process.
///
/// Cloning yields another handle to the **same** address space.
#[derive(Clone)]
pub struct SimulatedProcess {
    config: SimulatedConfig,
    pub(crate) state: Arc<Mutex<State>>,
    calls: Arc<Mutex<CallCounters>>,
}

impl SimulatedProcess {
    #[must_use]
    pub fn new(config: SimulatedConfig) -> Self {
        debug!(
            "sim: new target pid={} dep={} range={}..{}",
            config.process_id, config.dep_enabled, config.lowest_address, config.highest_address
        );
        Self {
            config,
            state: Arc::new(Mutex::new(State::new(
                config.lowest_address,
                config.highest_address,
            ))),
            calls: Arc::new(Mutex::new(CallCounters::default())),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SimulatedConfig {
        &self.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count(&self, f: impl FnOnce(&mut CallCounters)) {
        f(&mut self.calls.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Calls serviced so far.
    #[must_use]
    pub fn calls(&self) -> CallCounters {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve `[address, address + size)` so later allocations cannot use it.
    ///
    /// # Errors
    /// [`Status::CONFLICTING_ADDRESSES`] if any page of the range is in use.
    pub fn occupy(&self, address: impl Into<RemoteAddress>, size: u64) -> Result<(), Status> {
        self.lock().occupy(address.into(), size)
    }

    /// Make the next `n` allocations fail with [`Status::NO_MEMORY`].
    pub fn fail_next_allocations(&self, n: u32) {
        self.lock().faults.allocate = n;
    }

    /// Make the next `n` protection changes fail with [`Status::ACCESS_VIOLATION`].
    pub fn fail_next_protects(&self, n: u32) {
        self.lock().faults.protect = n;
    }

    /// Make the next `n` frees fail with [`Status::UNABLE_TO_FREE_VM`].
    ///
    /// Frees through a [`SimulatedDriver`](crate::SimulatedDriver) count too.
    pub fn fail_next_frees(&self, n: u32) {
        self.lock().faults.free = n;
    }

    /// Drop all pending injected failures.
    pub fn clear_faults(&self) {
        self.lock().faults = Faults::default();
    }

    /// Whether the page containing `address` is reserved or committed.
    #[must_use]
    pub fn is_allocated(&self, address: impl Into<RemoteAddress>) -> bool {
        self.lock().pages.contains_key(&address.into().page::<Size4K>())
    }

    /// Whether the page containing `address` is committed.
    #[must_use]
    pub fn is_committed(&self, address: impl Into<RemoteAddress>) -> bool {
        self.lock()
            .pages
            .get(&address.into().page::<Size4K>())
            .is_some_and(Page::is_committed)
    }

    /// Protection of the page containing `address`.
    #[must_use]
    pub fn protection_at(&self, address: impl Into<RemoteAddress>) -> Option<PageProtectionBits> {
        self.lock()
            .pages
            .get(&address.into().page::<Size4K>())
            .map(|p| p.protection)
    }

    /// Bytes currently reserved or committed.
    #[must_use]
    pub fn allocated_bytes(&self) -> u64 {
        self.lock().pages.len() as u64 * PAGE
    }

    /// Bytes currently committed.
    #[must_use]
    pub fn committed_bytes(&self) -> u64 {
        self.lock().pages.values().filter(|p| p.is_committed()).count() as u64 * PAGE
    }
}

impl RemoteMemory for SimulatedProcess {
    fn process_id(&self) -> u32 {
        self.config.process_id
    }

    fn dep_enabled(&self) -> bool {
        self.config.dep_enabled
    }

    fn allocate(
        &self,
        hint: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<RemoteAddress, Status> {
        self.count(|c| c.allocate += 1);
        self.lock().allocate(hint, size, protection)
    }

    fn protect(
        &self,
        address: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<PageProtectionBits, Status> {
        self.count(|c| c.protect += 1);
        self.lock().protect(address, size, protection)
    }

    fn free(&self, address: RemoteAddress, size: u64, mode: FreeMode) -> Result<(), Status> {
        self.count(|c| c.free += 1);
        self.lock().free(address, size, mode)
    }

    fn read(
        &self,
        address: RemoteAddress,
        dest: &mut [u8],
        handle_holes: bool,
    ) -> Result<(), Status> {
        self.count(|c| c.read += 1);
        self.lock().read(address, dest, handle_holes)
    }

    fn write(&self, address: RemoteAddress, src: &[u8]) -> Result<(), Status> {
        self.count(|c| c.write += 1);
        self.lock().write(address, src)
    }

    fn query(&self, address: RemoteAddress) -> Result<RegionInfo, Status> {
        self.count(|c| c.query += 1);
        self.lock().query(address)
    }
}
