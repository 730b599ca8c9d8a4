use rmem_addresses::RemoteAddress;
use utils_accessors_derive::Setters;

/// Shape of a [`SimulatedProcess`](crate::SimulatedProcess).
///
/// ```rust
/// # use rmem_sim::SimulatedConfig;
/// let config = SimulatedConfig::default()
///     .with_process_id(4242)
///     .with_dep_enabled(false)
///     .with_lowest_address(0x1000_0000_u64);
/// assert_eq!(config.process_id, 4242);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Setters)]
pub struct SimulatedConfig {
    /// Identity reported to physical-memory channels.
    pub process_id: u32,
    pub dep_enabled: bool,
    /// First usable address. Rounded up to the allocation granularity when
    /// the target picks addresses itself.
    #[setters(into)]
    pub lowest_address: RemoteAddress,
    /// One past the last usable address.
    #[setters(into)]
    pub highest_address: RemoteAddress,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            process_id: 0x1000,
            dep_enabled: true,
            lowest_address: RemoteAddress::new(0x0001_0000),
            highest_address: RemoteAddress::new(0x7FFF_FFFF_0000),
        }
    }
}
