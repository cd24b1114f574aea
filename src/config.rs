//! Compile-time capacities, protocol limits and table behavior settings
//!
//! Nothing here touches a peripheral: bit timing, clocks and acceptance
//! filter banks are configured by the target HAL before frames are routed
//! through this crate.

/// Number of callback slots in a [`Registry`] when no capacity is given.
///
/// [`Registry`]: crate::registry::Registry
pub const DEFAULT_CAPACITY: usize = 16;

/// Number of EXTI lines, one per pin number, shared by all GPIO ports.
pub const EXTI_LINES: usize = 16;

/// Largest classic CAN payload
pub const CLASSIC_MAX_PAYLOAD: usize = 8;

/// Largest CAN FD payload
pub const FD_MAX_PAYLOAD: usize = 64;

/// Highest filter index an FDCAN peripheral reports (7-bit field).
/// bxCAN uses the whole `u8` range.
pub const FD_FILTER_INDEX_MAX: u8 = 127;

/// What [`PinTable`] does with the user data of a line when a handler is
/// registered or unregistered.
///
/// [`PinTable`]: crate::exti::PinTable
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataPolicy {
    /// Leave the data untouched; it is bound separately through
    /// [`PinTable::set_data`].
    ///
    /// [`PinTable::set_data`]: crate::exti::PinTable::set_data
    #[default]
    Preserve,
    /// Drop the data whenever the handler of the line changes.
    Clear,
}
