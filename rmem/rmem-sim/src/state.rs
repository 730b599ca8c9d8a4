use crate::range::PageRange;
use log::trace;
use rmem_addresses::{PageSize, RemoteAddress, RemotePage, Size4K, Size64K};
use rmem_protection::{Access, PageProtectionBits};
use rmem_remote::{FreeMode, RegionInfo, RegionState, Status};
use std::collections::BTreeMap;

/// Bytes per simulated page.
pub(crate) const PAGE: u64 = Size4K::SIZE;

#[allow(clippy::cast_possible_truncation)]
const PAGE_BYTES: usize = PAGE as usize;

/// One page of the simulated address space.
#[derive(Clone)]
pub(crate) struct Page {
    pub allocation_base: RemoteAddress,
    pub protection: PageProtectionBits,
    /// Empty while the page is only reserved.
    pub data: Vec<u8>,
}

impl Page {
    fn committed(allocation_base: RemoteAddress, protection: PageProtectionBits) -> Self {
        Self {
            allocation_base,
            protection,
            data: vec![0; PAGE_BYTES],
        }
    }

    fn reserved(allocation_base: RemoteAddress) -> Self {
        Self {
            allocation_base,
            protection: PageProtectionBits::new(),
            data: Vec::new(),
        }
    }

    pub fn is_committed(&self) -> bool {
        !self.data.is_empty()
    }

    fn is_readable(&self) -> bool {
        self.is_committed()
            && !self.protection.guard()
            && self.protection.access().is_some_and(Access::is_readable)
    }

    fn is_writable(&self) -> bool {
        self.is_committed()
            && !self.protection.guard()
            && self.protection.access().is_some_and(Access::is_writable)
    }

    fn state(&self) -> RegionState {
        if self.is_committed() {
            RegionState::Committed
        } else {
            RegionState::Reserved
        }
    }
}

/// Pending failures requested by a test.
#[derive(Default)]
pub(crate) struct Faults {
    pub allocate: u32,
    pub protect: u32,
    pub free: u32,
}

impl Faults {
    /// Consume one pending failure from `slot`, if any.
    pub fn take(slot: &mut u32) -> bool {
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

/// The page table of a simulated target.
pub(crate) struct State {
    pub pages: BTreeMap<RemotePage<Size4K>, Page>,
    pub faults: Faults,
    lowest: RemoteAddress,
    highest: RemoteAddress,
}

impl State {
    pub fn new(lowest: RemoteAddress, highest: RemoteAddress) -> Self {
        Self {
            pages: BTreeMap::new(),
            faults: Faults::default(),
            lowest,
            highest,
        }
    }

    fn in_bounds(&self, range: PageRange) -> bool {
        let start = range.first.base();
        start >= self.lowest
            && start
                .checked_add(range.len_bytes())
                .is_some_and(|end| end <= self.highest)
    }

    fn is_free(&self, range: PageRange) -> bool {
        self.in_bounds(range) && range.pages().all(|p| !self.pages.contains_key(&p))
    }

    /// Lowest free run of `count` pages on the allocation granularity.
    fn find_free(&self, count: u64) -> Option<RemoteAddress> {
        let mut candidate = RemoteAddress::new(Size64K::align_up(self.lowest.as_u64())?);
        loop {
            let range = PageRange {
                first: candidate.page(),
                count,
            };
            if !self.in_bounds(range) {
                return None;
            }
            if self.is_free(range) {
                return Some(candidate);
            }
            candidate = candidate.checked_add(Size64K::SIZE)?;
        }
    }

    pub fn allocate(
        &mut self,
        hint: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<RemoteAddress, Status> {
        if protection.access().is_none() {
            return Err(Status::INVALID_PAGE_PROTECTION);
        }
        if size == 0 {
            return Err(Status::INVALID_PARAMETER);
        }
        if Faults::take(&mut self.faults.allocate) {
            return Err(Status::NO_MEMORY);
        }

        let count = Size4K::pages_for(size).ok_or(Status::INVALID_PARAMETER)?;
        let base = if hint.is_null() {
            self.find_free(count).ok_or(Status::NO_MEMORY)?
        } else {
            let base = hint.align_down::<Size4K>();
            let range = PageRange::covering(base, size)?;
            if !self.is_free(range) {
                return Err(Status::CONFLICTING_ADDRESSES);
            }
            base
        };

        let range = PageRange::covering(base, size)?;
        for page in range.pages() {
            self.pages.insert(page, Page::committed(base, protection));
        }
        trace!("sim: allocated {count} page(s) at {base} ({:#x})", protection.into_bits());
        Ok(base)
    }

    /// Mark `[address, address + size)` as reserved without committing it.
    pub fn occupy(&mut self, address: RemoteAddress, size: u64) -> Result<(), Status> {
        let range = PageRange::covering(address, size)?;
        if !self.is_free(range) {
            return Err(Status::CONFLICTING_ADDRESSES);
        }
        let base = range.first.base();
        for page in range.pages() {
            self.pages.insert(page, Page::reserved(base));
        }
        Ok(())
    }

    pub fn protect(
        &mut self,
        address: RemoteAddress,
        size: u64,
        protection: PageProtectionBits,
    ) -> Result<PageProtectionBits, Status> {
        if protection.access().is_none() {
            return Err(Status::INVALID_PAGE_PROTECTION);
        }
        if size == 0 {
            return Err(Status::INVALID_PARAMETER);
        }
        if Faults::take(&mut self.faults.protect) {
            return Err(Status::ACCESS_VIOLATION);
        }

        let range = PageRange::covering(address, size)?;
        for page in range.pages() {
            match self.pages.get(&page) {
                None => return Err(Status::MEMORY_NOT_ALLOCATED),
                Some(p) if !p.is_committed() => return Err(Status::NOT_COMMITTED),
                Some(_) => {}
            }
        }

        let mut previous = None;
        for page in range.pages() {
            if let Some(p) = self.pages.get_mut(&page) {
                previous.get_or_insert(p.protection);
                p.protection = protection;
            }
        }
        Ok(previous.unwrap_or_default())
    }

    pub fn free(&mut self, address: RemoteAddress, size: u64, mode: FreeMode) -> Result<(), Status> {
        if Faults::take(&mut self.faults.free) {
            return Err(Status::UNABLE_TO_FREE_VM);
        }
        if size == 0 {
            return Ok(());
        }

        let range = PageRange::covering(address, size)?;
        if range.pages().any(|p| !self.pages.contains_key(&p)) {
            return Err(Status::MEMORY_NOT_ALLOCATED);
        }

        for page in range.pages() {
            match mode {
                FreeMode::Release => {
                    self.pages.remove(&page);
                }
                FreeMode::Decommit => {
                    if let Some(p) = self.pages.get_mut(&page) {
                        *p = Page::reserved(p.allocation_base);
                    }
                }
            }
        }
        trace!("sim: {mode:?} of {} page(s) at {}", range.count, range.first);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn read(
        &self,
        address: RemoteAddress,
        dest: &mut [u8],
        handle_holes: bool,
    ) -> Result<(), Status> {
        let mut cursor = address.as_u64();
        let end = cursor
            .checked_add(dest.len() as u64)
            .ok_or(Status::ACCESS_VIOLATION)?;
        let mut done = 0usize;

        while cursor < end {
            let page = RemoteAddress::new(cursor).page::<Size4K>();
            let in_page = cursor - page.base().as_u64();
            // bounded by PAGE
            let chunk = (PAGE - in_page).min(end - cursor) as usize;
            let in_page = in_page as usize;
            let out = &mut dest[done..done + chunk];

            match self.pages.get(&page) {
                Some(p) if p.is_readable() => {
                    out.copy_from_slice(&p.data[in_page..in_page + chunk]);
                }
                _ if handle_holes => out.fill(0),
                _ if done == 0 => return Err(Status::ACCESS_VIOLATION),
                _ => return Err(Status::PARTIAL_COPY),
            }

            done += chunk;
            cursor += chunk as u64;
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn write(&mut self, address: RemoteAddress, src: &[u8]) -> Result<(), Status> {
        let range = PageRange::covering(address, src.len() as u64)?;
        if !range
            .pages()
            .all(|p| self.pages.get(&p).is_some_and(Page::is_writable))
        {
            return Err(Status::ACCESS_VIOLATION);
        }

        let mut cursor = address.as_u64();
        let mut done = 0usize;
        while done < src.len() {
            let page = RemoteAddress::new(cursor).page::<Size4K>();
            let in_page = cursor - page.base().as_u64();
            let chunk = ((PAGE - in_page) as usize).min(src.len() - done);
            let in_page = in_page as usize;
            if let Some(p) = self.pages.get_mut(&page) {
                p.data[in_page..in_page + chunk].copy_from_slice(&src[done..done + chunk]);
            }
            done += chunk;
            cursor += chunk as u64;
        }
        Ok(())
    }

    pub fn query(&self, address: RemoteAddress) -> Result<RegionInfo, Status> {
        if address < self.lowest || address >= self.highest {
            return Err(Status::INVALID_PARAMETER);
        }
        let first = address.page::<Size4K>();

        let Some(head) = self.pages.get(&first) else {
            let next_used = self
                .pages
                .range(first..)
                .next()
                .map_or(self.highest, |(p, _)| p.base());
            return Ok(RegionInfo {
                base: first.base(),
                allocation_base: RemoteAddress::zero(),
                size: next_used.as_u64() - first.base().as_u64(),
                protection: PageProtectionBits::new(),
                state: RegionState::Free,
            });
        };

        let mut size = 0;
        let mut expected = Some(first);
        for (page, p) in self.pages.range(first..) {
            if Some(*page) != expected
                || p.allocation_base != head.allocation_base
                || p.state() != head.state()
                || p.protection != head.protection
            {
                break;
            }
            size += PAGE;
            expected = page.next();
        }

        Ok(RegionInfo {
            base: first.base(),
            allocation_base: head.allocation_base,
            size,
            protection: head.protection,
            state: head.state(),
        })
    }
}
