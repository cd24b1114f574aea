#![no_std]
#![warn(missing_docs)]

//! `can-common-core` provides the thin integration layer between the platform
//! independent [`can-common`] crate and platform specific HAL crates (in
//! documentation also referred to as _target HALs_).
//!
//! It contains
//! - the wire header layouts of both supported peripheral families
//!   ([`classic`] for bxCAN-style mailboxes, [`fd`] for M_CAN / FDCAN message
//!   RAM elements),
//! - the peripheral traits [`ClassicCan`] and [`FdCan`] that target HALs
//!   implement on top of their drivers.
//!
//! Traits from this crate are not supposed to be implemented by the
//! application developer.
//!
//! [`can-common`]: <https://docs.rs/crate/can-common/>

pub mod classic;
pub mod fd;

pub use nb;

/// Receive FIFO selector shared by both peripheral families
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fifo {
    /// Receive FIFO 0
    Fifo0,
    /// Receive FIFO 1
    Fifo1,
}

/// Classic CAN (bxCAN-style) peripheral
///
/// Implementations give access to the two hardware receive FIFOs and the
/// transmit mailboxes. Payloads are at most 8 bytes.
pub trait ClassicCan {
    /// Hardware error reported by the driver
    type Error: core::fmt::Debug;

    /// Pops the oldest frame from `fifo`, copying its payload into `data`.
    ///
    /// Returns [`nb::Error::WouldBlock`] when the FIFO is empty.
    fn receive(&mut self, fifo: Fifo, data: &mut [u8; 8]) -> nb::Result<classic::RxHeader, Self::Error>;

    /// Places a frame into a free transmit mailbox.
    ///
    /// Returns [`nb::Error::WouldBlock`] when no mailbox is free.
    fn transmit(&mut self, header: &classic::TxHeader, data: &[u8]) -> nb::Result<(), Self::Error>;
}

/// CAN FD (M_CAN / FDCAN-style) peripheral
///
/// In addition to the two receive FIFOs, the peripheral may provide dedicated
/// receive buffers. Payloads are at most 64 bytes.
pub trait FdCan {
    /// Hardware error reported by the driver
    type Error: core::fmt::Debug;

    /// Pops the oldest element from `fifo`, copying its payload into `data`.
    ///
    /// Returns [`nb::Error::WouldBlock`] when the FIFO is empty.
    fn receive(&mut self, fifo: Fifo, data: &mut [u8; 64]) -> nb::Result<fd::RxHeader, Self::Error>;

    /// Takes the next dedicated receive buffer flagged with new data and
    /// clears its flag.
    ///
    /// Returns [`nb::Error::WouldBlock`] when no buffer holds new data.
    /// Peripherals without dedicated buffers keep the default.
    fn receive_buffer(&mut self, data: &mut [u8; 64]) -> nb::Result<fd::RxHeader, Self::Error> {
        let _ = data;
        Err(nb::Error::WouldBlock)
    }

    /// Enqueues a frame into the transmit FIFO / queue.
    ///
    /// Returns [`nb::Error::WouldBlock`] when the queue is full.
    fn transmit(&mut self, header: &fd::TxHeader, data: &[u8]) -> nb::Result<(), Self::Error>;
}
