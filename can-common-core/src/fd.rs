//! CAN FD (M_CAN / FDCAN) message RAM element header layout
//!
//! Each RX FIFO element, dedicated RX buffer and TX buffer starts with two
//! 32-bit header words (`R0`/`R1` and `T0`/`T1`) followed by the payload.
//! Standard identifiers are stored in bits 28:18 of the first word.

use bitfield::bitfield;

bitfield! {
    /// First header word (`R0` / `T0`)
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct Word0(u32);
    impl Debug;
    /// Error state indicator
    pub esi, set_esi: 31;
    /// Extended identifier
    pub xtd, set_xtd: 30;
    /// Remote transmission request
    pub rtr, set_rtr: 29;
    /// Identifier; a standard identifier lives in bits 28:18
    pub u32, id, set_id: 28, 0;
    /// Standard identifier
    pub u16, std_id, set_std_id: 28, 18;
}

bitfield! {
    /// Second header word of a received element (`R1`)
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct RxWord1(u32);
    impl Debug;
    /// Accepted non-matching frame
    pub anmf, set_anmf: 31;
    /// Filter index
    pub u8, fidx, set_fidx: 30, 24;
    /// FD format
    pub fdf, set_fdf: 21;
    /// Bit rate switch
    pub brs, set_brs: 20;
    /// Data length code
    pub u8, dlc, set_dlc: 19, 16;
    /// Receive time stamp
    pub u16, rxts, set_rxts: 15, 0;
}

bitfield! {
    /// Second header word of an element to be transmitted (`T1`)
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct TxWord1(u32);
    impl Debug;
    /// Message marker
    pub u8, mm, set_mm: 31, 24;
    /// Event FIFO control
    pub efc, set_efc: 23;
    /// FD format
    pub fdf, set_fdf: 21;
    /// Bit rate switch
    pub brs, set_brs: 20;
    /// Data length code
    pub u8, dlc, set_dlc: 19, 16;
}

/// Header of a received element
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct RxHeader {
    /// `R0`
    pub r0: Word0,
    /// `R1`
    pub r1: RxWord1,
}

/// Header of an element to be transmitted
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct TxHeader {
    /// `T0`
    pub t0: Word0,
    /// `T1`
    pub t1: TxWord1,
}
