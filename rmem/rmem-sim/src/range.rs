use crate::state::PAGE;
use rmem_addresses::{RemoteAddress, RemotePage, Size4K};
use rmem_remote::Status;

/// The pages covering `[address, address + size)`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PageRange {
    pub first: RemotePage<Size4K>,
    pub count: u64,
}

impl PageRange {
    pub fn covering(address: RemoteAddress, size: u64) -> Result<Self, Status> {
        let first = address.page::<Size4K>();
        let end = address
            .as_u64()
            .checked_add(size)
            .and_then(|end| end.checked_add(PAGE - 1))
            .ok_or(Status::INVALID_PARAMETER)?;
        let count = ((end & !(PAGE - 1)) - first.base().as_u64()) / PAGE;
        Ok(Self { first, count })
    }

    pub fn pages(self) -> impl Iterator<Item = RemotePage<Size4K>> {
        let base = self.first.base();
        (0..self.count).map(move |i| (base + i * PAGE).page::<Size4K>())
    }

    pub const fn len_bytes(self) -> u64 {
        self.count * PAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covering_rounds_to_whole_pages() {
        let r = PageRange::covering(RemoteAddress::new(0x1_0FFF), 2).unwrap();
        assert_eq!(r.first.base().as_u64(), 0x1_0000);
        assert_eq!(r.count, 2);

        let r = PageRange::covering(RemoteAddress::new(0x1_0000), 0x2000).unwrap();
        assert_eq!(r.count, 2);
        assert_eq!(r.len_bytes(), 0x2000);

        let r = PageRange::covering(RemoteAddress::new(0x1_0000), 0).unwrap();
        assert_eq!(r.count, 0);
    }

    #[test]
    fn covering_rejects_overflow() {
        assert!(PageRange::covering(RemoteAddress::new(u64::MAX - 1), 0x10).is_err());
    }
}
