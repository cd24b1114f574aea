//! Peripheral instances and the transmit path
//!
//! A device pairs a target HAL driver with the [`DeviceId`] that callback
//! registrations refer to. The registry never holds the device itself, only
//! its id, so the application stays the sole owner of the peripheral.

use crate::config::CLASSIC_MAX_PAYLOAD;
use crate::header::{len_to_dlc, TxHeader, TxKind};
use can_common_core::{ClassicCan, FdCan};

/// Identity of a peripheral instance, chosen by the application
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub u8);

/// Peripheral family
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// bxCAN, classic CAN only
    Classic,
    /// FDCAN / M_CAN
    Fd,
}

/// Common view of [`ClassicDevice`] and [`FdDevice`]
pub trait Device {
    /// Peripheral family of the device
    const VARIANT: Variant;

    /// Identity used as part of the dispatch key
    fn id(&self) -> DeviceId;

    /// Peripheral family of the device
    fn variant(&self) -> Variant {
        Self::VARIANT
    }
}

/// Frame could not be enqueued for transmission
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError<E> {
    /// Payload is longer than the peripheral family allows
    TooMuchData,
    /// Driver reported an error
    Hardware(E),
}

/// bxCAN peripheral
pub struct ClassicDevice<P> {
    id: DeviceId,
    peripheral: P,
}

/// FDCAN peripheral
pub struct FdDevice<P> {
    id: DeviceId,
    peripheral: P,
}

impl<P> ClassicDevice<P> {
    /// Takes ownership of `peripheral` and names it `id`.
    pub const fn new(id: DeviceId, peripheral: P) -> Self {
        Self { id, peripheral }
    }

    /// Direct access to the driver.
    pub fn peripheral(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// Gives the driver back.
    pub fn release(self) -> P {
        self.peripheral
    }
}

impl<P: ClassicCan> ClassicDevice<P> {
    /// Translates `header` to the mailbox layout and places the frame in a
    /// free transmit mailbox. Nothing is tracked after that.
    pub fn send(&mut self, header: &TxHeader, data: &[u8]) -> nb::Result<(), SendError<P::Error>> {
        if data.len() > CLASSIC_MAX_PAYLOAD {
            return Err(nb::Error::Other(SendError::TooMuchData));
        }
        self.peripheral
            .transmit(&header.to_classic(), data)
            .map_err(|e| e.map(SendError::Hardware))
    }
}

impl<P> Device for ClassicDevice<P> {
    const VARIANT: Variant = Variant::Classic;

    fn id(&self) -> DeviceId {
        self.id
    }
}

impl<P> FdDevice<P> {
    /// Takes ownership of `peripheral` and names it `id`.
    pub const fn new(id: DeviceId, peripheral: P) -> Self {
        Self { id, peripheral }
    }

    /// Direct access to the driver.
    pub fn peripheral(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// Gives the driver back.
    pub fn release(self) -> P {
        self.peripheral
    }
}

impl<P: FdCan> FdDevice<P> {
    /// Translates `header` to the TX element layout and enqueues the frame
    /// into the transmit FIFO / queue. Nothing is tracked after that.
    ///
    /// The payload limit follows the frame format of `header`: 64 bytes for
    /// CAN FD frames, 8 bytes for classic frames.
    pub fn send(&mut self, header: &TxHeader, data: &[u8]) -> nb::Result<(), SendError<P::Error>> {
        let fd_format = matches!(header.kind, TxKind::Fd { fd_format: true, .. });
        if len_to_dlc(data.len(), fd_format).is_err() {
            return Err(nb::Error::Other(SendError::TooMuchData));
        }
        self.peripheral
            .transmit(&header.to_fd(), data)
            .map_err(|e| e.map(SendError::Hardware))
    }
}

impl<P> Device for FdDevice<P> {
    const VARIANT: Variant = Variant::Fd;

    fn id(&self) -> DeviceId {
        self.id
    }
}
