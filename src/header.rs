//! Logical frame headers and the translation to and from the wire layouts of
//! both peripheral families.
//!
//! Translation is a pure field re-mapping. Identifiers are not validated:
//! a value wider than the declared width (11 or 29 bits) is silently
//! truncated by the wire layout. Fields that only exist for the other
//! peripheral family are defaulted.

use can_common_core::{classic, fd};
use embedded_can::{ExtendedId, Id, StandardId};

/// Payload does not fit the frame format
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TooMuchData;

/// Variant specific part of a [`TxHeader`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxKind {
    /// bxCAN-only fields
    Classic {
        /// Transmit the time stamp in the last two data bytes
        transmit_timestamp: bool,
    },
    /// FDCAN-only fields
    Fd {
        /// Frame uses the CAN FD format
        fd_format: bool,
        /// Data phase is transmitted at the switched bit rate
        bit_rate_switch: bool,
        /// Store a TX event for this frame
        store_tx_event: bool,
        /// Marker copied into the TX event
        message_marker: u8,
    },
}

/// Variant specific part of an [`RxHeader`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxKind {
    /// Received by a bxCAN peripheral
    Classic,
    /// Received by an FDCAN peripheral
    Fd {
        /// Frame uses the CAN FD format
        fd_format: bool,
        /// Data phase was transmitted at the switched bit rate
        bit_rate_switch: bool,
        /// No acceptance filter matched; the frame was accepted by the
        /// peripheral-wide non-matching frame setting
        filter_miss: bool,
    },
}

/// Header of a frame to be transmitted
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxHeader {
    /// Raw identifier, 11 or 29 bits depending on `extended`
    pub id: u32,
    /// Identifier is 29 bits wide
    pub extended: bool,
    /// Remote transmission request
    pub remote: bool,
    /// Data length code
    pub dlc: u8,
    /// Variant specific fields
    pub kind: TxKind,
}

/// Header of a received frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxHeader {
    /// Raw identifier, 11 or 29 bits depending on `extended`
    pub id: u32,
    /// Identifier is 29 bits wide
    pub extended: bool,
    /// Remote transmission request
    pub remote: bool,
    /// Data length code
    pub dlc: u8,
    /// Time stamp counter value captured on reception
    pub timestamp: u16,
    /// Index of the acceptance filter that matched the frame
    pub filter_index: u8,
    /// Variant specific fields
    pub kind: RxKind,
}

fn split_id(id: Id) -> (u32, bool) {
    match id {
        Id::Standard(id) => (id.as_raw().into(), false),
        Id::Extended(id) => (id.as_raw(), true),
    }
}

fn join_id(raw: u32, extended: bool) -> Id {
    if extended {
        // The mask ensures the ID is in range for a 29-bit integer
        Id::Extended(unsafe { ExtendedId::new_unchecked(raw & ExtendedId::MAX.as_raw()) })
    } else {
        // The mask ensures the ID is in range for a 11-bit integer
        Id::Standard(unsafe { StandardId::new_unchecked(raw as u16 & StandardId::MAX.as_raw()) })
    }
}

impl TxHeader {
    /// Data frame header for `id`.
    pub fn new(id: impl Into<Id>, dlc: u8, kind: TxKind) -> Self {
        let (id, extended) = split_id(id.into());
        Self {
            id,
            extended,
            remote: false,
            dlc,
            kind,
        }
    }

    /// Data frame header whose data length code is the smallest one that
    /// covers `len` bytes in the format selected by `kind`.
    pub fn with_payload_len(id: impl Into<Id>, len: usize, kind: TxKind) -> Result<Self, TooMuchData> {
        let fd_format = matches!(kind, TxKind::Fd { fd_format: true, .. });
        Ok(Self::new(id, len_to_dlc(len, fd_format)?, kind))
    }

    /// Identifier in the `embedded-can` representation, truncated to the
    /// declared width.
    pub fn frame_id(&self) -> Id {
        join_id(self.id, self.extended)
    }

    /// Mailbox header for a bxCAN peripheral.
    pub fn to_classic(&self) -> classic::TxHeader {
        let mut id = classic::IdWord(0);
        if self.extended {
            id.set_exid(self.id);
        } else {
            id.set_stid(self.id as u16);
        }
        id.set_ide(self.extended);
        id.set_rtr(self.remote);

        let mut info = classic::TxInfo(0);
        info.set_dlc(self.dlc);
        info.set_tgt(matches!(
            self.kind,
            TxKind::Classic {
                transmit_timestamp: true
            }
        ));
        classic::TxHeader { id, info }
    }

    /// Reads back a bxCAN mailbox header.
    pub fn from_classic(header: &classic::TxHeader) -> Self {
        let extended = header.id.ide();
        Self {
            id: if extended {
                header.id.exid()
            } else {
                header.id.stid().into()
            },
            extended,
            remote: header.id.rtr(),
            dlc: header.info.dlc(),
            kind: TxKind::Classic {
                transmit_timestamp: header.info.tgt(),
            },
        }
    }

    /// TX element header for an FDCAN peripheral.
    pub fn to_fd(&self) -> fd::TxHeader {
        let mut t0 = fd::Word0(0);
        if self.extended {
            t0.set_id(self.id);
        } else {
            t0.set_std_id(self.id as u16);
        }
        t0.set_xtd(self.extended);
        t0.set_rtr(self.remote);

        let mut t1 = fd::TxWord1(0);
        t1.set_dlc(self.dlc);
        if let TxKind::Fd {
            fd_format,
            bit_rate_switch,
            store_tx_event,
            message_marker,
        } = self.kind
        {
            t1.set_fdf(fd_format);
            t1.set_brs(bit_rate_switch);
            t1.set_efc(store_tx_event);
            t1.set_mm(message_marker);
        }
        fd::TxHeader { t0, t1 }
    }

    /// Reads back an FDCAN TX element header.
    pub fn from_fd(header: &fd::TxHeader) -> Self {
        let extended = header.t0.xtd();
        Self {
            id: if extended {
                header.t0.id()
            } else {
                header.t0.std_id().into()
            },
            extended,
            remote: header.t0.rtr(),
            dlc: header.t1.dlc(),
            kind: TxKind::Fd {
                fd_format: header.t1.fdf(),
                bit_rate_switch: header.t1.brs(),
                store_tx_event: header.t1.efc(),
                message_marker: header.t1.mm(),
            },
        }
    }
}

impl RxHeader {
    /// Normalizes a frame popped from a bxCAN receive FIFO.
    pub fn from_classic(header: &classic::RxHeader) -> Self {
        let extended = header.id.ide();
        Self {
            id: if extended {
                header.id.exid()
            } else {
                header.id.stid().into()
            },
            extended,
            remote: header.id.rtr(),
            dlc: header.info.dlc(),
            timestamp: header.info.time(),
            filter_index: header.info.fmi(),
            kind: RxKind::Classic,
        }
    }

    /// Normalizes an element read from an FDCAN receive FIFO or dedicated
    /// buffer.
    pub fn from_fd(header: &fd::RxHeader) -> Self {
        let extended = header.r0.xtd();
        Self {
            id: if extended {
                header.r0.id()
            } else {
                header.r0.std_id().into()
            },
            extended,
            remote: header.r0.rtr(),
            dlc: header.r1.dlc(),
            timestamp: header.r1.rxts(),
            filter_index: header.r1.fidx(),
            kind: RxKind::Fd {
                fd_format: header.r1.fdf(),
                bit_rate_switch: header.r1.brs(),
                filter_miss: header.r1.anmf(),
            },
        }
    }

    /// Identifier in the `embedded-can` representation, truncated to the
    /// declared width.
    pub fn frame_id(&self) -> Id {
        join_id(self.id, self.extended)
    }

    /// `true` if the frame uses the CAN FD format
    pub fn is_fd(&self) -> bool {
        matches!(self.kind, RxKind::Fd { fd_format: true, .. })
    }

    /// `true` if the peripheral reports that no acceptance filter matched.
    /// Always `false` for bxCAN, which cannot report a miss.
    pub fn is_filter_miss(&self) -> bool {
        matches!(self.kind, RxKind::Fd { filter_miss: true, .. })
    }

    /// Payload length in bytes. Remote frames carry no payload.
    pub fn payload_len(&self) -> usize {
        if self.remote {
            0
        } else {
            dlc_to_len(self.dlc, self.is_fd())
        }
    }
}

/// Finds the smallest data length code that encodes at least `len` bytes
pub fn len_to_dlc(len: usize, fd_format: bool) -> Result<u8, TooMuchData> {
    if fd_format {
        match len {
            0..=8 => Ok(len as u8),
            9..=12 => Ok(9),
            13..=16 => Ok(10),
            17..=20 => Ok(11),
            21..=24 => Ok(12),
            25..=32 => Ok(13),
            33..=48 => Ok(14),
            49..=64 => Ok(15),
            _ => Err(TooMuchData),
        }
    } else {
        match len {
            0..=8 => Ok(len as u8),
            _ => Err(TooMuchData),
        }
    }
}

/// Converts a data length code to a length in bytes
pub fn dlc_to_len(dlc: u8, fd_format: bool) -> usize {
    if fd_format {
        match dlc {
            0..=8 => dlc.into(),
            9 => 12,
            10 => 16,
            11 => 20,
            12 => 24,
            13 => 32,
            14 => 48,
            15.. => 64,
        }
    } else {
        match dlc {
            0..=8 => dlc.into(),
            9.. => 8,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn classic_tx(id: u32, extended: bool) -> TxHeader {
        TxHeader {
            id,
            extended,
            remote: false,
            dlc: 8,
            kind: TxKind::Classic {
                transmit_timestamp: true,
            },
        }
    }

    #[test]
    fn classic_standard_header_layout() {
        let wire = classic_tx(0x123, false).to_classic();
        assert_eq!(wire.id.0, 0x123 << 21);
        assert_eq!(wire.info.dlc(), 8);
        assert!(wire.info.tgt());
    }

    #[test]
    fn classic_extended_header_survives_wire() {
        let header = classic_tx(0x1abc_def0, true);
        assert_eq!(TxHeader::from_classic(&header.to_classic()), header);
    }

    #[test]
    fn oversized_standard_id_is_truncated() {
        let wire = classic_tx(0x1234, false).to_classic();
        assert_eq!(TxHeader::from_classic(&wire).id, 0x234);
    }

    #[test]
    fn fd_extended_flag_is_not_inverted() {
        let header = TxHeader {
            id: 0x42,
            extended: false,
            remote: false,
            dlc: 15,
            kind: TxKind::Fd {
                fd_format: true,
                bit_rate_switch: true,
                store_tx_event: true,
                message_marker: 7,
            },
        };
        let wire = header.to_fd();
        assert!(!wire.t0.xtd());
        assert_eq!(wire.t0.id(), 0x42 << 18);
        assert_eq!(wire.t1.mm(), 7);
        assert_eq!(TxHeader::from_fd(&wire), header);
    }

    #[test]
    fn classic_kind_defaults_fd_fields() {
        let wire = classic_tx(0x10, false).to_fd();
        assert!(!wire.t1.fdf());
        assert!(!wire.t1.brs());
        assert!(!wire.t1.efc());
    }

    #[test]
    fn fd_rx_header_carries_filter_miss() {
        let mut r0 = fd::Word0(0);
        r0.set_std_id(0x7ff);
        let mut r1 = fd::RxWord1(0);
        r1.set_anmf(true);
        r1.set_fidx(9);
        r1.set_fdf(true);
        r1.set_dlc(9);
        r1.set_rxts(500);

        let header = RxHeader::from_fd(&fd::RxHeader { r0, r1 });
        assert_eq!(header.id, 0x7ff);
        assert!(header.is_filter_miss());
        assert!(header.is_fd());
        assert_eq!(header.filter_index, 9);
        assert_eq!(header.timestamp, 500);
        assert_eq!(header.payload_len(), 12);
    }

    #[test]
    fn classic_rx_header_fields() {
        let mut id = classic::IdWord(0);
        id.set_exid(0x1f00_0001);
        id.set_ide(true);
        let info = classic::RxInfo(0x0010_0406);

        let header = RxHeader::from_classic(&classic::RxHeader { id, info });
        assert_eq!(header.id, 0x1f00_0001);
        assert!(header.extended);
        assert_eq!(header.filter_index, 4);
        assert_eq!(header.timestamp, 0x10);
        assert_eq!(header.payload_len(), 6);
        assert!(!header.is_filter_miss());
        assert_eq!(
            header.frame_id(),
            Id::Extended(ExtendedId::new(0x1f00_0001).unwrap())
        );
    }

    #[test]
    fn dlc_length_tables() {
        assert_eq!(dlc_to_len(12, false), 8);
        assert_eq!(dlc_to_len(12, true), 24);
        assert_eq!(len_to_dlc(20, true), Ok(11));
        assert_eq!(len_to_dlc(9, false), Err(TooMuchData));
        assert_eq!(len_to_dlc(65, true), Err(TooMuchData));
    }

    #[test]
    fn payload_len_picks_dlc() {
        let kind = TxKind::Fd {
            fd_format: true,
            bit_rate_switch: false,
            store_tx_event: false,
            message_marker: 0,
        };
        let header = TxHeader::with_payload_len(StandardId::new(1).unwrap(), 33, kind).unwrap();
        assert_eq!(header.dlc, 14);
        assert!(!header.extended);
    }
}
