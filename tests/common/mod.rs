#![allow(dead_code)]

use can_common::core::{classic, fd, ClassicCan, FdCan, Fifo};
use can_common::header::RxHeader;
use can_common::registry::{RxHandler, RxLocation};
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

pub type Queue<H> = VecDeque<(H, Vec<u8>)>;

/// bxCAN stand-in backed by two in-memory FIFOs
#[derive(Default)]
pub struct MockClassic {
    pub fifo0: Queue<classic::RxHeader>,
    pub fifo1: Queue<classic::RxHeader>,
    pub receive_calls: usize,
    pub fail_after: Option<usize>,
    pub mailboxes_full: bool,
    pub sent: Vec<(classic::TxHeader, Vec<u8>)>,
}

impl ClassicCan for MockClassic {
    type Error = MockError;

    fn receive(&mut self, fifo: Fifo, data: &mut [u8; 8]) -> nb::Result<classic::RxHeader, MockError> {
        self.receive_calls += 1;
        if self.fail_after.map_or(false, |n| self.receive_calls > n) {
            return Err(nb::Error::Other(MockError));
        }
        let queue = match fifo {
            Fifo::Fifo0 => &mut self.fifo0,
            Fifo::Fifo1 => &mut self.fifo1,
        };
        let Some((header, payload)) = queue.pop_front() else {
            return Err(nb::Error::WouldBlock);
        };
        data[..payload.len()].copy_from_slice(&payload);
        Ok(header)
    }

    fn transmit(&mut self, header: &classic::TxHeader, data: &[u8]) -> nb::Result<(), MockError> {
        if self.mailboxes_full {
            return Err(nb::Error::WouldBlock);
        }
        self.sent.push((*header, data.to_vec()));
        Ok(())
    }
}

/// FDCAN stand-in backed by two in-memory FIFOs and a dedicated buffer queue
#[derive(Default)]
pub struct MockFd {
    pub fifo0: Queue<fd::RxHeader>,
    pub fifo1: Queue<fd::RxHeader>,
    pub buffers: Queue<fd::RxHeader>,
    pub receive_calls: usize,
    pub sent: Vec<(fd::TxHeader, Vec<u8>)>,
}

impl FdCan for MockFd {
    type Error = MockError;

    fn receive(&mut self, fifo: Fifo, data: &mut [u8; 64]) -> nb::Result<fd::RxHeader, MockError> {
        self.receive_calls += 1;
        let queue = match fifo {
            Fifo::Fifo0 => &mut self.fifo0,
            Fifo::Fifo1 => &mut self.fifo1,
        };
        pop_into(queue, data)
    }

    fn receive_buffer(&mut self, data: &mut [u8; 64]) -> nb::Result<fd::RxHeader, MockError> {
        self.receive_calls += 1;
        pop_into(&mut self.buffers, data)
    }

    fn transmit(&mut self, header: &fd::TxHeader, data: &[u8]) -> nb::Result<(), MockError> {
        self.sent.push((*header, data.to_vec()));
        Ok(())
    }
}

fn pop_into(queue: &mut Queue<fd::RxHeader>, data: &mut [u8; 64]) -> nb::Result<fd::RxHeader, MockError> {
    let Some((header, payload)) = queue.pop_front() else {
        return Err(nb::Error::WouldBlock);
    };
    data[..payload.len()].copy_from_slice(&payload);
    Ok(header)
}

/// Standard-ID bxCAN frame that matched filter `filter_index`
pub fn classic_frame(id: u16, filter_index: u8, payload: &[u8]) -> (classic::RxHeader, Vec<u8>) {
    let mut header = classic::RxHeader::default();
    header.id.set_stid(id);
    header.info.set_fmi(filter_index);
    header.info.set_dlc(payload.len() as u8);
    (header, payload.to_vec())
}

/// Extended-ID FD frame; `filter_index == None` marks a non-matching frame
pub fn fd_frame(id: u32, filter_index: Option<u8>, payload: &[u8]) -> (fd::RxHeader, Vec<u8>) {
    let mut header = fd::RxHeader::default();
    header.r0.set_xtd(true);
    header.r0.set_id(id);
    match filter_index {
        Some(index) => header.r1.set_fidx(index),
        None => header.r1.set_anmf(true),
    }
    header.r1.set_fdf(true);
    header
        .r1
        .set_dlc(can_common::header::len_to_dlc(payload.len(), true).unwrap());
    (header, payload.to_vec())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub tag: &'static str,
    pub location: RxLocation,
    pub header: RxHeader,
    pub data: Vec<u8>,
}

pub type Log = RefCell<Vec<Call>>;

/// Handler that appends every frame it receives to a shared log
pub struct Recorder<'a> {
    pub tag: &'static str,
    pub log: &'a Log,
}

impl RxHandler for Recorder<'_> {
    fn on_frame(&mut self, location: RxLocation, header: &RxHeader, data: &[u8]) {
        self.log.borrow_mut().push(Call {
            tag: self.tag,
            location,
            header: *header,
            data: data.to_vec(),
        });
    }
}

pub fn tags(log: &Log) -> Vec<&'static str> {
    let mut tags: Vec<_> = log.borrow().iter().map(|c| c.tag).collect();
    tags.sort_unstable();
    tags
}
