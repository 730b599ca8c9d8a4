use rmem_block::{AllocationRequest, Backend, MemoryBlock, Protection};
use rmem_sim::{SimulatedConfig, SimulatedProcess};

fn target() -> SimulatedProcess {
    let _ = env_logger::builder().is_test(true).try_init();
    SimulatedProcess::new(SimulatedConfig::default())
}

fn rw(size: u64) -> AllocationRequest {
    AllocationRequest::new(size).with_protection(Protection::READ_WRITE)
}

#[test]
fn drop_releases_an_owned_block_once() {
    let t = target();
    let a = {
        let b = MemoryBlock::allocate(&t, rw(0x2000)).unwrap();
        assert!(b.owns());
        b.address()
    };
    assert!(!t.is_allocated(a));
    assert_eq!(t.calls().free, 1);
}

#[test]
fn explicit_free_is_not_repeated_on_drop() {
    let t = target();
    let mut b = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    b.free(0).unwrap();
    drop(b);
    assert_eq!(t.calls().free, 1);
}

#[test]
fn drop_releases_what_remains_after_partial_free() {
    let t = target();
    let mut b = MemoryBlock::allocate(&t, rw(0x3000)).unwrap();
    b.free(0x1000).unwrap();
    drop(b);
    assert_eq!(t.committed_bytes(), 0);
    assert_eq!(t.allocated_bytes(), 0);
    assert_eq!(t.calls().free, 2);
}

#[test]
fn non_owning_block_never_releases() {
    let t = target();
    let a = {
        let owner = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
        owner.into_raw().0
    };

    let b = MemoryBlock::new(&t, a, 0x1000, Protection::READ_WRITE, false, Backend::Virtual);
    b.write(0, b"still here").unwrap();
    drop(b);

    assert!(t.is_committed(a));
    assert_eq!(t.calls().free, 0);
}

#[test]
fn moving_a_block_moves_responsibility() {
    let t = target();
    let b = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    let a = b.address();

    let mut blocks = Vec::new();
    blocks.push(b);
    assert!(t.is_committed(a));
    assert_eq!(t.calls().free, 0);

    blocks.clear();
    assert!(!t.is_allocated(a));
    assert_eq!(t.calls().free, 1);
}

#[test]
fn views_do_not_release() {
    let t = target();
    let b = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    {
        let v = b.view();
        assert!(!v.owns());
        assert_eq!(v.address(), b.address());
        assert_eq!(v.size(), b.size());
        v.write(0, &[7; 4]).unwrap();
    }
    assert_eq!(t.calls().free, 0);
    assert_eq!(b.read_vec(0, 4, false).unwrap(), [7; 4]);
}

#[test]
fn into_raw_gives_the_region_up() {
    let t = target();
    let b = MemoryBlock::allocate(&t, rw(0x2000)).unwrap();
    let base = b.address();

    let (a, size) = b.into_raw();
    assert_eq!(a, base);
    assert_eq!(size, 0x2000);
    assert!(t.is_committed(a));
    assert_eq!(t.calls().free, 0);
}

#[test]
fn reset_releases_owned_region_and_disowns() {
    let t = target();
    let mut b = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    let a = b.address();

    b.reset();
    assert!(!b.is_valid());
    assert!(!b.owns());
    assert_eq!(b.protection(), None);
    assert!(!t.is_allocated(a));

    b.reset();
    drop(b);
    assert_eq!(t.calls().free, 1);
}

#[test]
fn into_raw_after_partial_free_includes_decommitted_pages() {
    let t = target();
    let mut b = MemoryBlock::allocate(&t, rw(0x3000)).unwrap();
    let base = b.address();
    b.free(0x1000).unwrap();

    assert_eq!(b.into_raw(), (base, 0x3000));
    assert_eq!(t.allocated_bytes(), 0x3000);
}

#[test]
fn explicit_free_ignores_ownership() {
    let t = target();
    let owner = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    let a = owner.address();
    let mut v = owner.view();

    // reset only gives back what the block owns
    let mut w = owner.view();
    w.reset();
    assert!(t.is_committed(a));

    v.free(0).unwrap();
    assert!(!t.is_allocated(a));

    // the owner's own release now fails and is only logged
    drop(owner);
    assert_eq!(t.calls().free, 2);
}

#[test]
fn reset_of_a_non_owning_block_leaves_memory_alone() {
    let t = target();
    let owner = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    let mut v = owner.view();

    v.reset();
    assert!(!v.is_valid());
    assert!(t.is_committed(owner.address()));
    assert_eq!(t.calls().free, 0);
}

#[test]
fn failed_release_on_reset_is_swallowed() {
    let t = target();
    let mut b = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    let a = b.address();

    t.fail_next_frees(1);
    b.reset();
    assert!(!b.is_valid());
    assert!(!b.owns());

    // the region is abandoned, not released
    assert!(t.is_committed(a));
}

#[test]
fn failed_release_on_drop_leaks() {
    let t = target();
    let b = MemoryBlock::allocate(&t, rw(0x1000)).unwrap();
    let a = b.address();

    t.fail_next_frees(1);
    drop(b);
    assert!(t.is_committed(a));
    assert_eq!(t.calls().free, 1);
}
