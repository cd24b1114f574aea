//! Classic CAN (bxCAN) mailbox header layout
//!
//! A received or transmitted frame is described by two 32-bit words: the
//! identifier word (`RIxR` / `TIxR`) and the data length / time word
//! (`RDTxR` / `TDTxR`). Setters truncate values to the width of the field.

use bitfield::bitfield;

bitfield! {
    /// Identifier word shared by receive (`RIxR`) and transmit (`TIxR`)
    /// mailboxes.
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct IdWord(u32);
    impl Debug;
    /// Standard identifier
    pub u16, stid, set_stid: 31, 21;
    /// Extended identifier (all 29 bits)
    pub u32, exid, set_exid: 31, 3;
    /// Identifier extension
    pub ide, set_ide: 2;
    /// Remote transmission request
    pub rtr, set_rtr: 1;
    /// Transmit mailbox request (transmit only)
    pub txrq, set_txrq: 0;
}

bitfield! {
    /// Receive data length and time stamp word (`RDTxR`)
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct RxInfo(u32);
    impl Debug;
    /// Message time stamp
    pub u16, time, set_time: 31, 16;
    /// Filter match index
    pub u8, fmi, set_fmi: 15, 8;
    /// Data length code
    pub u8, dlc, set_dlc: 3, 0;
}

bitfield! {
    /// Transmit data length and time stamp word (`TDTxR`)
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct TxInfo(u32);
    impl Debug;
    /// Message time stamp
    pub u16, time, set_time: 31, 16;
    /// Transmit global time
    pub tgt, set_tgt: 8;
    /// Data length code
    pub u8, dlc, set_dlc: 3, 0;
}

/// Header of a frame popped from a receive FIFO
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct RxHeader {
    /// Identifier word
    pub id: IdWord,
    /// Data length, filter match index and time stamp
    pub info: RxInfo,
}

/// Header of a frame to be placed in a transmit mailbox
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct TxHeader {
    /// Identifier word
    pub id: IdWord,
    /// Data length and time stamp control
    pub info: TxInfo,
}
