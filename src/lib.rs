#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
//! # can-common
//!
//! ## Overview
//! This crate puts two mutually exclusive CAN peripheral families, bxCAN
//! (classic CAN) and FDCAN / M_CAN (CAN FD), behind one logical header format
//! and one receive callback mechanism. It also provides a callback table for
//! the EXTI (pin change) interrupt lines.
//!
//! It provides the following features:
//!
//! - translation between the wire headers of both families and the common
//!   [`TxHeader`] / [`RxHeader`]
//! - a fixed-capacity callback [`Registry`] keyed by device, receive location
//!   and acceptance filter index, with handles that detect reuse of a
//!   removed entry's slot
//! - a [`Dispatcher`] whose interrupt entry points drain a receive FIFO to
//!   empty and invoke every matching callback per frame; FDCAN frames that
//!   matched no filter go to an optional default handler
//! - a 16-line [`PinTable`] with per-line trigger counters
//! - [`Shared`], a critical-section guard that places mutation and dispatch
//!   in one exclusion domain
//!
//! Peripheral initialization (bit timing, clocks, filter banks) is left to
//! the target HAL, which implements the traits of [`can_common_core`] for
//! its drivers.
//!
//! ## Usage
//!
//! All tables are ordinary values; there is no global state. Interrupt
//! driven applications keep them in `static`s behind [`Shared`].
//!
//! ```no_run
//! use can_common::core::{fd, FdCan, Fifo};
//! use can_common::device::{DeviceId, FdDevice};
//! use can_common::dispatch::{Dispatcher, FifoEvents};
//! use can_common::header::RxHeader;
//! use can_common::registry::RxLocation;
//! use can_common::shared::Shared;
//! # struct Fdcan1;
//! # impl FdCan for Fdcan1 {
//! #     type Error = ();
//! #     fn receive(&mut self, _: Fifo, _: &mut [u8; 64]) -> can_common::nb::Result<fd::RxHeader, ()> {
//! #         Err(can_common::nb::Error::WouldBlock)
//! #     }
//! #     fn transmit(&mut self, _: &fd::TxHeader, _: &[u8]) -> can_common::nb::Result<(), ()> {
//! #         Ok(())
//! #     }
//! # }
//!
//! type Handler = fn(RxLocation, &RxHeader, &[u8]);
//!
//! static DISPATCHER: Shared<Dispatcher<Handler>> = Shared::new(Dispatcher::new());
//!
//! fn on_feedback(_location: RxLocation, _header: &RxHeader, _data: &[u8]) {
//!     // ...
//! }
//!
//! let mut can1 = FdDevice::new(DeviceId(1), Fdcan1);
//! DISPATCHER
//!     .lock(|d| d.add_callback(&can1, 0, RxLocation::RxFifo0, on_feedback as Handler))
//!     .unwrap()
//!     .unwrap();
//!
//! // From the FDCAN1 interrupt line 0 handler, with the `IR` register value
//! let events = FifoEvents::from_interrupt_flags(0x1, Fifo::Fifo0);
//! DISPATCHER.lock(|d| d.fd_fifo0_event(&mut can1, events)).unwrap();
//! ```
//!
//! [`TxHeader`]: crate::header::TxHeader
//! [`RxHeader`]: crate::header::RxHeader
//! [`Registry`]: crate::registry::Registry
//! [`Dispatcher`]: crate::dispatch::Dispatcher
//! [`PinTable`]: crate::exti::PinTable
//! [`Shared`]: crate::shared::Shared

pub mod config;
pub mod device;
pub mod dispatch;
pub mod exti;
pub mod header;
pub mod prelude;
pub mod registry;
pub mod shared;

pub use can_common_core as core;
pub use embedded_can;
pub use nb;
