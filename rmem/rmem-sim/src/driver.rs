use crate::SimulatedProcess;
use crate::state::State;
use log::trace;
use rmem_addresses::RemoteAddress;
use rmem_protection::PageProtectionBits;
use rmem_remote::{FreeMode, PhysicalMemoryChannel, Status};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Privileged channel into one or more [`SimulatedProcess`]es.
///
/// Requests name their target by process id; a request for a process the
/// driver was not attached to fails with [`Status::INVALID_PARAMETER`].
pub struct SimulatedDriver {
    targets: Vec<(u32, Arc<Mutex<State>>)>,
    protects: AtomicU32,
    frees: AtomicU32,
}

impl SimulatedDriver {
    #[must_use]
    pub fn new(process: &SimulatedProcess) -> Self {
        Self {
            targets: Vec::new(),
            protects: AtomicU32::new(0),
            frees: AtomicU32::new(0),
        }
        .with_target(process)
    }

    /// Attach another target.
    #[must_use]
    pub fn with_target(mut self, process: &SimulatedProcess) -> Self {
        self.targets
            .push((process.config().process_id, Arc::clone(&process.state)));
        self
    }

    /// Protection changes serviced so far.
    #[must_use]
    pub fn protect_calls(&self) -> u32 {
        self.protects.load(Ordering::Relaxed)
    }

    /// Frees serviced so far.
    #[must_use]
    pub fn free_calls(&self) -> u32 {
        self.frees.load(Ordering::Relaxed)
    }

    fn target(&self, process_id: u32) -> Result<&Mutex<State>, Status> {
        self.targets
            .iter()
            .find(|(pid, _)| *pid == process_id)
            .map(|(_, state)| state.as_ref())
            .ok_or(Status::INVALID_PARAMETER)
    }
}

impl PhysicalMemoryChannel for SimulatedDriver {
    fn protect(
        &self,
        process_id: u32,
        address: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<(), Status> {
        self.protects.fetch_add(1, Ordering::Relaxed);
        trace!("sim-driver: protect pid={process_id} {address}+{size:#x}");
        let mut state = self
            .target(process_id)?
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.protect(address, size, protection).map(|_| ())
    }

    fn free(
        &self,
        process_id: u32,
        address: RemoteAddress,
        size: u64,
        mode: FreeMode,
    ) -> Result<(), Status> {
        self.frees.fetch_add(1, Ordering::Relaxed);
        trace!("sim-driver: {mode:?} pid={process_id} {address}+{size:#x}");
        let mut state = self
            .target(process_id)?
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.free(address, size, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulatedConfig;
    use rmem_protection::Access;
    use rmem_remote::RemoteMemory;

    #[test]
    fn driver_shares_pages_with_process() {
        let process = SimulatedProcess::new(SimulatedConfig::default().with_process_id(77));
        let driver = SimulatedDriver::new(&process);
        let rw = PageProtectionBits::from_access(Access::ReadWrite);
        let a = process.allocate(RemoteAddress::zero(), 0x2000, rw).unwrap();

        let ro = PageProtectionBits::from_access(Access::ReadOnly);
        driver.protect(77, a, 0x1000, ro).unwrap();
        assert_eq!(process.protection_at(a), Some(ro));

        driver.free(77, a, 0x2000, FreeMode::Release).unwrap();
        assert!(!process.is_allocated(a));
        assert_eq!(driver.protect_calls(), 1);
        assert_eq!(driver.free_calls(), 1);
    }

    #[test]
    fn unknown_process_is_rejected() {
        let process = SimulatedProcess::new(SimulatedConfig::default().with_process_id(1));
        let driver = SimulatedDriver::new(&process);
        assert_eq!(
            driver.free(2, RemoteAddress::new(0x1_0000), 0x1000, FreeMode::Release),
            Err(Status::INVALID_PARAMETER)
        );
    }
}
