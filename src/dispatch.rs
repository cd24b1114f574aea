//! Receive dispatch
//!
//! [`Dispatcher`] is the context object the interrupt entry points run
//! against. Each entry point drains the hardware queue it was notified about
//! until the peripheral reports it empty, normalizes every frame header and
//! hands the frame to the handlers registered for its [`Route`].
//!
//! Draining converts one interrupt into as many dispatch rounds as there are
//! queued frames. If frames arrive faster than they are drained, the hardware
//! FIFO overflows and drops them; nothing is queued on this side.
//!
//! Only FDCAN can flag a frame that matched no acceptance filter. Such frames
//! go to the default handler instead of the registry, or are dropped when
//! none is installed. bxCAN frames always carry a filter match index.

use crate::config::{CLASSIC_MAX_PAYLOAD, DEFAULT_CAPACITY, FD_FILTER_INDEX_MAX, FD_MAX_PAYLOAD};
use crate::device::{ClassicDevice, Device, FdDevice, Variant};
use crate::header::RxHeader;
use crate::registry::{Full, Handle, Registry, Route, RxHandler, RxLocation, StaleHandle};
use bitfield::bitfield;
use can_common_core::{ClassicCan, FdCan, Fifo};
use core::fmt;

bitfield! {
    /// Receive FIFO interrupt reasons of an FDCAN peripheral, relative to
    /// one FIFO (`RFnN`, `RFnW`, `RFnF`, `RFnL`).
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct FifoEvents(u8);
    impl Debug;
    /// New message written to the FIFO
    pub new_message, set_new_message: 0;
    /// FIFO fill level reached the configured watermark
    pub watermark_reached, set_watermark_reached: 1;
    /// FIFO full
    pub full, set_full: 2;
    /// Message lost because the FIFO was full
    pub message_lost, set_message_lost: 3;
}

/// A single receive FIFO interrupt reason.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoEvent {
    /// RFnN
    NewMessage = 0,
    /// RFnW
    WatermarkReached = 1,
    /// RFnF
    Full = 2,
    /// RFnL
    MessageLost = 3,
}

impl From<FifoEvent> for FifoEvents {
    fn from(event: FifoEvent) -> Self {
        FifoEvents(1 << event as u8)
    }
}

impl FromIterator<FifoEvent> for FifoEvents {
    fn from_iter<T: IntoIterator<Item = FifoEvent>>(iter: T) -> Self {
        let mut set = 0_u8;
        for event in iter.into_iter() {
            set |= FifoEvents::from(event).0;
        }
        FifoEvents(set)
    }
}

impl FifoEvents {
    /// Extracts the reasons of `fifo` from the peripheral interrupt register
    /// (`IR`), where FIFO 0 occupies bits 3:0 and FIFO 1 bits 7:4.
    pub fn from_interrupt_flags(flags: u32, fifo: Fifo) -> Self {
        let shift = match fifo {
            Fifo::Fifo0 => 0,
            Fifo::Fifo1 => 4,
        };
        FifoEvents(((flags >> shift) & 0xf) as u8)
    }

    /// `true` if any of the reasons that indicate queued frames is set.
    /// A lost message alone does not.
    pub fn has_pending_frames(&self) -> bool {
        self.new_message() || self.watermark_reached() || self.full()
    }
}

/// A callback could not be registered. The rejected handler is handed back.
pub enum AddError<H> {
    /// No vacant registry slot
    Full(H),
    /// The device cannot deliver frames on this route: dedicated receive
    /// buffers on a bxCAN device, or a filter index above
    /// [`FD_FILTER_INDEX_MAX`] on an FDCAN device
    InvalidRoute(H),
}

impl<H> fmt::Debug for AddError<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => write!(f, "Full(..)"),
            Self::InvalidRoute(_) => write!(f, "InvalidRoute(..)"),
        }
    }
}

/// Registry plus default handler, driven by the receive interrupts
pub struct Dispatcher<H, const N: usize = DEFAULT_CAPACITY> {
    registry: Registry<H, N>,
    default_handler: Option<H>,
}

impl<H, const N: usize> Dispatcher<H, N> {
    /// Creates a dispatcher with an empty registry and no default handler.
    pub const fn new() -> Self {
        Self {
            registry: Registry::new(),
            default_handler: None,
        }
    }

    /// Binds `handler` to frames received on `device` at `location` that
    /// matched filter `filter_index`.
    pub fn add_callback<D: Device>(
        &mut self,
        device: &D,
        filter_index: u8,
        location: RxLocation,
        handler: H,
    ) -> Result<Handle, AddError<H>> {
        let valid = match D::VARIANT {
            Variant::Classic => location != RxLocation::RxBuffer,
            Variant::Fd => filter_index <= FD_FILTER_INDEX_MAX,
        };
        if !valid {
            return Err(AddError::InvalidRoute(handler));
        }
        self.registry
            .add(device.id(), filter_index, location, handler)
            .map_err(|Full(handler)| AddError::Full(handler))
    }

    /// Removes a callback added through [`Self::add_callback`].
    pub fn remove_callback(&mut self, handle: Handle) -> Result<H, StaleHandle> {
        self.registry.remove(handle)
    }

    /// Installs the handler for FDCAN frames that matched no filter and
    /// returns the one it replaces.
    pub fn set_default_handler(&mut self, handler: H) -> Option<H> {
        self.default_handler.replace(handler)
    }

    /// Uninstalls the default handler.
    pub fn clear_default_handler(&mut self) -> Option<H> {
        self.default_handler.take()
    }

    /// `true` if a default handler is installed
    pub fn has_default_handler(&self) -> bool {
        self.default_handler.is_some()
    }

    /// The underlying registry
    pub fn registry(&self) -> &Registry<H, N> {
        &self.registry
    }
}

impl<H: RxHandler, const N: usize> Dispatcher<H, N> {
    /// bxCAN FIFO 0 message pending interrupt. Returns the number of frames
    /// drained.
    pub fn classic_fifo0_event<P: ClassicCan>(&mut self, device: &mut ClassicDevice<P>) -> usize {
        self.drain_classic(device, Fifo::Fifo0)
    }

    /// bxCAN FIFO 1 message pending interrupt. Returns the number of frames
    /// drained.
    pub fn classic_fifo1_event<P: ClassicCan>(&mut self, device: &mut ClassicDevice<P>) -> usize {
        self.drain_classic(device, Fifo::Fifo1)
    }

    /// FDCAN FIFO 0 interrupt with the reasons in `events`. New message,
    /// watermark and full all drain the FIFO; other reasons are ignored.
    /// Returns the number of frames drained.
    pub fn fd_fifo0_event<P: FdCan>(&mut self, device: &mut FdDevice<P>, events: FifoEvents) -> usize {
        if !events.has_pending_frames() {
            return 0;
        }
        self.drain_fd(device, RxLocation::RxFifo0)
    }

    /// FDCAN FIFO 1 interrupt, see [`Self::fd_fifo0_event`].
    pub fn fd_fifo1_event<P: FdCan>(&mut self, device: &mut FdDevice<P>, events: FifoEvents) -> usize {
        if !events.has_pending_frames() {
            return 0;
        }
        self.drain_fd(device, RxLocation::RxFifo1)
    }

    /// FDCAN message stored to dedicated receive buffer interrupt. Returns
    /// the number of buffers drained.
    pub fn fd_rx_buffer_event<P: FdCan>(&mut self, device: &mut FdDevice<P>) -> usize {
        self.drain_fd(device, RxLocation::RxBuffer)
    }

    fn drain_classic<P: ClassicCan>(&mut self, device: &mut ClassicDevice<P>, fifo: Fifo) -> usize {
        let id = device.id();
        let location = RxLocation::from(fifo);
        let mut drained = 0;
        loop {
            let mut data = [0; CLASSIC_MAX_PAYLOAD];
            let wire = match device.peripheral().receive(fifo, &mut data) {
                Ok(wire) => wire,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    log::warn!("{:?}: reading {:?} failed: {:?}", id, fifo, e);
                    break;
                }
            };
            drained += 1;

            let header = RxHeader::from_classic(&wire);
            let route = Route {
                device: id,
                location,
                filter_index: header.filter_index,
            };
            let len = header.payload_len().min(CLASSIC_MAX_PAYLOAD);
            if self.registry.dispatch(route, &header, &data[..len]) == 0 {
                log::debug!("{:?}: no callback for {:?}", id, route);
            }
        }
        log::trace!("{:?}: drained {} frames from {:?}", id, drained, fifo);
        drained
    }

    fn drain_fd<P: FdCan>(&mut self, device: &mut FdDevice<P>, location: RxLocation) -> usize {
        let id = device.id();
        let mut drained = 0;
        loop {
            let mut data = [0; FD_MAX_PAYLOAD];
            let received = match location {
                RxLocation::RxFifo0 => device.peripheral().receive(Fifo::Fifo0, &mut data),
                RxLocation::RxFifo1 => device.peripheral().receive(Fifo::Fifo1, &mut data),
                RxLocation::RxBuffer => device.peripheral().receive_buffer(&mut data),
            };
            let wire = match received {
                Ok(wire) => wire,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    log::warn!("{:?}: reading {:?} failed: {:?}", id, location, e);
                    break;
                }
            };
            drained += 1;

            let header = RxHeader::from_fd(&wire);
            let len = header.payload_len().min(FD_MAX_PAYLOAD);
            let data = &data[..len];
            if header.is_filter_miss() {
                match self.default_handler.as_mut() {
                    Some(handler) => handler.on_frame(location, &header, data),
                    None => log::debug!("{:?}: dropping non-matching frame {:#x}", id, header.id),
                }
                continue;
            }
            let route = Route {
                device: id,
                location,
                filter_index: header.filter_index,
            };
            if self.registry.dispatch(route, &header, data) == 0 {
                log::debug!("{:?}: no callback for {:?}", id, route);
            }
        }
        log::trace!("{:?}: drained {} frames from {:?}", id, drained, location);
        drained
    }
}

impl<H, const N: usize> Default for Dispatcher<H, N> {
    fn default() -> Self {
        Self::new()
    }
}
