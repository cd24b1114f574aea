//! Callback registry
//!
//! Fixed-capacity table binding a [`Route`] (device, receive location, filter
//! index) to a handler. Routes are not unique: every entry whose route equals
//! the key of a received frame fires.
//!
//! Entries live in a generation-tagged slot map. Removing an entry vacates
//! its slot and bumps the slot generation, so surviving entries never move
//! and a [`Handle`] kept after its entry was removed is reported as
//! [`StaleHandle`] instead of silently addressing whatever reused the slot.
//! A slot whose generation is exhausted is retired rather than wrapped.
//!
//! Handles do not record which registry issued them. Passing a handle to a
//! registry other than its issuer is a logic error that is only detected
//! when the slot index is out of range or the generations differ.

use crate::config::DEFAULT_CAPACITY;
use crate::device::DeviceId;
use crate::header::RxHeader;
use can_common_core::Fifo;
use core::fmt;

/// Where the peripheral stored a received frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxLocation {
    /// Receive FIFO 0
    RxFifo0,
    /// Receive FIFO 1
    RxFifo1,
    /// Dedicated receive buffer (FDCAN only)
    RxBuffer,
}

impl From<Fifo> for RxLocation {
    fn from(fifo: Fifo) -> Self {
        match fifo {
            Fifo::Fifo0 => Self::RxFifo0,
            Fifo::Fifo1 => Self::RxFifo1,
        }
    }
}

/// Dispatch key of a received frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Route {
    /// Device the frame was received on
    pub device: DeviceId,
    /// FIFO or buffer the frame was read from
    pub location: RxLocation,
    /// Acceptance filter that matched the frame
    pub filter_index: u8,
}

/// Receiver of dispatched frames
///
/// Implemented for every `FnMut(RxLocation, &RxHeader, &[u8])`, which covers
/// plain `fn` pointers as well as references to closures. State a handler
/// needs is bound into the implementing type at registration time.
pub trait RxHandler {
    /// Called once per matching frame with the normalized header and the
    /// payload (`header.payload_len()` bytes).
    fn on_frame(&mut self, location: RxLocation, header: &RxHeader, data: &[u8]);
}

impl<F> RxHandler for F
where
    F: FnMut(RxLocation, &RxHeader, &[u8]),
{
    fn on_frame(&mut self, location: RxLocation, header: &RxHeader, data: &[u8]) {
        self(location, header, data)
    }
}

/// Identifies a registry entry for removal
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handle {
    index: usize,
    generation: u16,
}

impl Handle {
    /// Slot occupied by the entry. Slots are reused after removal; only the
    /// whole handle identifies an entry.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// The registry has no vacant slot. The rejected handler is handed back.
pub struct Full<H>(pub H);

impl<H> fmt::Debug for Full<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Full(..)")
    }
}

/// The handle does not refer to a live entry: it was already removed, or
/// its slot index is out of range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StaleHandle;

struct Entry<H> {
    route: Route,
    handler: H,
}

struct Slot<H> {
    generation: u16,
    retired: bool,
    entry: Option<Entry<H>>,
}

impl<H> Slot<H> {
    const VACANT: Self = Self {
        generation: 0,
        retired: false,
        entry: None,
    };

    fn is_free(&self) -> bool {
        self.entry.is_none() && !self.retired
    }
}

/// Callback table with room for `N` entries
pub struct Registry<H, const N: usize = DEFAULT_CAPACITY> {
    slots: [Slot<H>; N],
    len: usize,
}

impl<H, const N: usize> Registry<H, N> {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            slots: [Slot::<H>::VACANT; N],
            len: 0,
        }
    }

    /// Binds `handler` to frames received on `device` at `location` that
    /// matched filter `filter_index`.
    ///
    /// Duplicated routes are accepted and all of them fire.
    pub fn add(
        &mut self,
        device: DeviceId,
        filter_index: u8,
        location: RxLocation,
        handler: H,
    ) -> Result<Handle, Full<H>> {
        let Some(index) = self.slots.iter().position(Slot::is_free) else {
            log::warn!("callback registry full ({} entries)", N);
            return Err(Full(handler));
        };
        let slot = &mut self.slots[index];
        slot.entry = Some(Entry {
            route: Route {
                device,
                location,
                filter_index,
            },
            handler,
        });
        self.len += 1;
        Ok(Handle {
            index,
            generation: slot.generation,
        })
    }

    /// Removes the entry identified by `handle` and returns its handler.
    /// Other entries keep their handles.
    ///
    /// A slot that has been reused `u16::MAX` times is not handed out again,
    /// so an old handle can never match a later entry.
    pub fn remove(&mut self, handle: Handle) -> Result<H, StaleHandle> {
        let slot = self.slots.get_mut(handle.index).ok_or(StaleHandle)?;
        if slot.generation != handle.generation {
            return Err(StaleHandle);
        }
        let entry = slot.entry.take().ok_or(StaleHandle)?;
        match slot.generation.checked_add(1) {
            Some(generation) => slot.generation = generation,
            None => {
                log::debug!("retiring callback slot {}", handle.index);
                slot.retired = true;
            }
        }
        self.len -= 1;
        Ok(entry.handler)
    }

    /// `true` if `handle` refers to a live entry
    pub fn contains(&self, handle: Handle) -> bool {
        self.route(handle).is_some()
    }

    /// Route of the live entry identified by `handle`
    pub fn route(&self, handle: Handle) -> Option<Route> {
        self.slots
            .get(handle.index)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_ref())
            .map(|e| e.route)
    }

    /// Iterates over the live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, Route)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|e| {
                (
                    Handle {
                        index,
                        generation: slot.generation,
                    },
                    e.route,
                )
            })
        })
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if there are no live entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of entries the registry can hold
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<H: RxHandler, const N: usize> Registry<H, N> {
    /// Invokes every handler bound to `route` once. Returns how many fired.
    ///
    /// Entries are visited in slot order; callers must not rely on the order
    /// among entries sharing a route.
    pub fn dispatch(&mut self, route: Route, header: &RxHeader, data: &[u8]) -> usize {
        let mut fired = 0;
        for entry in self.slots.iter_mut().filter_map(|s| s.entry.as_mut()) {
            if entry.route == route {
                entry.handler.on_frame(route.location, header, data);
                fired += 1;
            }
        }
        fired
    }
}

impl<H, const N: usize> Default for Registry<H, N> {
    fn default() -> Self {
        Self::new()
    }
}
