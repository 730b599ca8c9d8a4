use rmem_block::{AllocationRequest, Backend, BlockError, MemoryBlock, Protection, RemoteAddress};
use rmem_protection::{Access, PageProtectionBits};
use rmem_remote::{RemoteMemory, Status};
use rmem_sim::{SimulatedConfig, SimulatedDriver, SimulatedProcess};

fn target() -> SimulatedProcess {
    let _ = env_logger::builder().is_test(true).try_init();
    SimulatedProcess::new(SimulatedConfig::default().with_process_id(77))
}

fn committed(t: &SimulatedProcess, size: u64) -> RemoteAddress {
    t.allocate(
        RemoteAddress::zero(),
        size,
        PageProtectionBits::from_access(Access::ReadWrite),
    )
    .unwrap()
}

#[test]
fn physical_protect_goes_through_the_channel() {
    let t = target();
    let driver = SimulatedDriver::new(&t);
    let a = committed(&t, 0x2000);
    let mut b = MemoryBlock::new(&t, a, 0x2000, Protection::READ_WRITE, true, Backend::Physical(&driver));
    assert!(b.backend().is_physical());

    // the channel does not report what was there before
    assert_eq!(b.protect(Protection::EXECUTE_READ, 0x1000, 0x1000), Ok(None));
    assert_eq!(b.protection(), Some(Protection::EXECUTE_READ));
    assert_eq!(t.protection_at(a + 0x1000).unwrap().into_bits(), 0x20);
    assert_eq!(t.protection_at(a).unwrap().into_bits(), 0x04);
    assert_eq!(driver.protect_calls(), 1);
    assert_eq!(t.calls().protect, 0);
}

#[test]
fn physical_partial_free_releases_leading_pages() {
    let t = target();
    let driver = SimulatedDriver::new(&t);
    let a = committed(&t, 0x3000);
    let mut b = MemoryBlock::new(&t, a, 0x3000, Protection::READ_WRITE, true, Backend::Physical(&driver));

    b.free(0x1000).unwrap();
    assert_eq!(b.address(), a + 0x1000);
    assert_eq!(b.size(), 0x2000);
    assert!(!t.is_allocated(a));
    assert!(t.is_committed(a + 0x1000));

    drop(b);
    assert_eq!(t.allocated_bytes(), 0);
    assert_eq!(driver.free_calls(), 2);
    assert_eq!(t.calls().free, 0);
}

#[test]
fn physical_failures_carry_the_channel_status() {
    let t = target();
    let driver = SimulatedDriver::new(&t);
    let a = committed(&t, 0x1000);
    let mut b = MemoryBlock::new(&t, a, 0x1000, Protection::READ_WRITE, true, Backend::Physical(&driver));

    t.fail_next_protects(1);
    assert_eq!(
        b.protect(Protection::READ_ONLY, 0, 0),
        Err(BlockError::ProtectionFailed(Status::ACCESS_VIOLATION))
    );
    assert_eq!(b.protection(), Some(Protection::READ_WRITE));

    t.fail_next_frees(1);
    assert_eq!(b.free(0), Err(BlockError::ReleaseFailed(Status::UNABLE_TO_FREE_VM)));
    assert_eq!(b.address(), a);
}

#[test]
fn channel_without_the_target_rejects_requests() {
    let t = target();
    let other = SimulatedProcess::new(SimulatedConfig::default().with_process_id(78));
    let driver = SimulatedDriver::new(&other);
    let a = committed(&t, 0x1000);
    let mut b = MemoryBlock::new(&t, a, 0x1000, Protection::READ_WRITE, false, Backend::Physical(&driver));

    assert_eq!(
        b.protect(Protection::READ_ONLY, 0, 0),
        Err(BlockError::ProtectionFailed(Status::INVALID_PARAMETER))
    );
    assert_eq!(b.last_status(), Status::INVALID_PARAMETER);
}

#[test]
fn io_stays_on_the_operator_for_physical_blocks() {
    let t = target();
    let driver = SimulatedDriver::new(&t);
    let a = committed(&t, 0x1000);
    let b = MemoryBlock::new(&t, a, 0x1000, Protection::READ_WRITE, false, Backend::Physical(&driver));

    b.write(0x10, b"abc").unwrap();
    assert_eq!(b.read_vec(0x10, 3, false).unwrap(), b"abc");
    assert_eq!(t.calls().write, 1);
    assert_eq!(t.calls().read, 1);
    assert_eq!(driver.protect_calls() + driver.free_calls(), 0);
}

#[test]
fn reset_returns_to_the_virtual_backend() {
    let t = target();
    let driver = SimulatedDriver::new(&t);
    let a = committed(&t, 0x1000);
    let mut b = MemoryBlock::new(&t, a, 0x1000, Protection::READ_WRITE, true, Backend::Physical(&driver));

    b.reset();
    assert!(!b.backend().is_physical());
    assert!(!t.is_allocated(a));
    assert_eq!(driver.free_calls(), 1);

    // reallocation always allocates through the operator
    let n = b.reallocate(AllocationRequest::new(0x1000)).unwrap();
    assert!(t.is_committed(n));
}
