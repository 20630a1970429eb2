//! 3270 screen buffer
//!
//! Applies outbound (host to terminal) data stream records to a 24x80
//! presentation space and builds inbound (terminal to host) records for
//! attention keys.

use super::codes::*;
use super::ebcdic;
use super::error::Tn3270Error;

pub const ROWS: usize = 24;
pub const COLS: usize = 80;

/// What the host asked for beyond a screen update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    /// Nothing to send back
    None,
    /// Host issued a read command; reply with the current modified fields
    ReadModified,
    /// Host asked for the whole buffer
    ReadBuffer,
}

/// Presentation space: character buffer plus field attributes
#[derive(Debug, Clone)]
pub struct Screen {
    buffer: Vec<u8>,
    /// Field attribute byte at positions that hold a field start
    attrs: Vec<Option<u8>>,
    /// Positions holding operator input the host has not written over
    typed: Vec<bool>,
    cursor: usize,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            buffer: vec![0; ROWS * COLS],
            attrs: vec![None; ROWS * COLS],
            typed: vec![false; ROWS * COLS],
            cursor: 0,
        }
    }

    fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Erase everything, as the Clear key does locally
    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|b| *b = 0);
        self.attrs.iter_mut().for_each(|a| *a = None);
        self.typed.iter_mut().for_each(|t| *t = false);
        self.cursor = 0;
    }

    /// True when the host has painted nothing visible since the last
    /// erase. Operator input does not count: a submitted transaction ID
    /// stays on screen until the host answers.
    pub fn is_blank(&self) -> bool {
        (0..self.size()).all(|pos| {
            self.attrs[pos].is_some()
                || self.typed[pos]
                || ebcdic::to_display_char(self.buffer[pos]) == ' '
        })
    }

    /// Screen as text, one line per row, field attributes shown as spaces
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(ROWS * (COLS + 1));
        for row in 0..ROWS {
            for col in 0..COLS {
                let pos = row * COLS + col;
                if self.attrs[pos].is_some() {
                    out.push(' ');
                } else {
                    out.push(ebcdic::to_display_char(self.buffer[pos]));
                }
            }
            out.push('\n');
        }
        out
    }

    fn formatted(&self) -> bool {
        self.attrs.iter().any(Option::is_some)
    }

    /// Position of the field attribute governing `pos`
    fn field_start(&self, pos: usize) -> Option<usize> {
        let size = self.size();
        (0..size)
            .map(|back| (pos + size - back) % size)
            .find(|&p| self.attrs[p].is_some())
    }

    fn is_protected(&self, pos: usize) -> bool {
        match self.field_start(pos) {
            Some(start) => self.attrs[start].unwrap_or(0) & FA_PROTECTED != 0,
            None => false,
        }
    }

    /// Apply one host record. Returns what the host expects back.
    pub fn apply(&mut self, record: &[u8]) -> Result<HostRequest, Tn3270Error> {
        let Some((&command, rest)) = record.split_first() else {
            return Ok(HostRequest::None);
        };

        if CMD_ERASE_WRITE.contains(&command) || CMD_ERASE_WRITE_ALT.contains(&command) {
            self.clear();
            self.write(rest)?;
            Ok(HostRequest::None)
        } else if CMD_WRITE.contains(&command) {
            self.write(rest)?;
            Ok(HostRequest::None)
        } else if CMD_ERASE_ALL_UNPROTECTED.contains(&command) {
            self.erase_unprotected();
            Ok(HostRequest::None)
        } else if CMD_READ_MODIFIED.contains(&command) || CMD_READ_MODIFIED_ALL.contains(&command)
        {
            Ok(HostRequest::ReadModified)
        } else if CMD_READ_BUFFER.contains(&command) {
            Ok(HostRequest::ReadBuffer)
        } else if CMD_WRITE_STRUCTURED_FIELD.contains(&command) {
            // Only sent to terminals advertising extended data stream support
            Ok(HostRequest::None)
        } else {
            Err(Tn3270Error::ProtocolError(format!(
                "unknown 3270 command 0x{:02X}",
                command
            )))
        }
    }

    fn erase_unprotected(&mut self) {
        for pos in 0..self.size() {
            if self.attrs[pos].is_none() && !self.is_protected(pos) {
                self.buffer[pos] = 0;
            }
        }
        for attr in self.attrs.iter_mut().flatten() {
            *attr &= !FA_MODIFIED;
        }
        self.cursor = self.first_unprotected().unwrap_or(0);
    }

    fn first_unprotected(&self) -> Option<usize> {
        let size = self.size();
        (0..size)
            .find(|&p| matches!(self.attrs[p], Some(a) if a & FA_PROTECTED == 0))
            .map(|p| (p + 1) % size)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Tn3270Error> {
        let Some((&wcc, orders)) = data.split_first() else {
            return Ok(());
        };
        if wcc & WCC_RESET_MDT != 0 {
            for attr in self.attrs.iter_mut().flatten() {
                *attr &= !FA_MODIFIED;
            }
        }

        let size = self.size();
        let mut addr = self.cursor;
        let mut i = 0;
        let truncated = |what: &str| Tn3270Error::ProtocolError(format!("truncated {} order", what));

        while i < orders.len() {
            let byte = orders[i];
            i += 1;
            match byte {
                ORDER_SBA => {
                    let b = orders.get(i..i + 2).ok_or_else(|| truncated("SBA"))?;
                    addr = decode_address(b[0], b[1]) % size;
                    i += 2;
                }
                ORDER_SF => {
                    let attr = *orders.get(i).ok_or_else(|| truncated("SF"))?;
                    self.set_field(addr, attr);
                    addr = (addr + 1) % size;
                    i += 1;
                }
                ORDER_SFE => {
                    let count = *orders.get(i).ok_or_else(|| truncated("SFE"))? as usize;
                    let pairs = orders
                        .get(i + 1..i + 1 + count * 2)
                        .ok_or_else(|| truncated("SFE"))?;
                    let attr = pairs
                        .chunks(2)
                        .find(|p| p[0] == XA_3270)
                        .map(|p| p[1])
                        .unwrap_or(0);
                    self.set_field(addr, attr);
                    addr = (addr + 1) % size;
                    i += 1 + count * 2;
                }
                ORDER_MF => {
                    let count = *orders.get(i).ok_or_else(|| truncated("MF"))? as usize;
                    let pairs = orders
                        .get(i + 1..i + 1 + count * 2)
                        .ok_or_else(|| truncated("MF"))?;
                    if self.attrs[addr].is_some() {
                        if let Some(p) = pairs.chunks(2).find(|p| p[0] == XA_3270) {
                            self.attrs[addr] = Some(p[1]);
                        }
                        addr = (addr + 1) % size;
                    }
                    i += 1 + count * 2;
                }
                ORDER_IC => {
                    self.cursor = addr;
                }
                ORDER_PT => {
                    addr = self.next_unprotected(addr).unwrap_or(0);
                }
                ORDER_RA => {
                    let b = orders.get(i..i + 3).ok_or_else(|| truncated("RA"))?;
                    let stop = decode_address(b[0], b[1]) % size;
                    let mut fill = b[2];
                    i += 3;
                    if fill == ORDER_GE {
                        fill = *orders.get(i).ok_or_else(|| truncated("RA"))?;
                        i += 1;
                    }
                    loop {
                        self.put(addr, fill);
                        addr = (addr + 1) % size;
                        if addr == stop {
                            break;
                        }
                    }
                }
                ORDER_EUA => {
                    let b = orders.get(i..i + 2).ok_or_else(|| truncated("EUA"))?;
                    let stop = decode_address(b[0], b[1]) % size;
                    i += 2;
                    loop {
                        if self.attrs[addr].is_none() && !self.is_protected(addr) {
                            self.buffer[addr] = 0;
                        }
                        addr = (addr + 1) % size;
                        if addr == stop {
                            break;
                        }
                    }
                }
                ORDER_SA => {
                    // Character attributes are not rendered
                    orders.get(i..i + 2).ok_or_else(|| truncated("SA"))?;
                    i += 2;
                }
                ORDER_GE => {
                    let ch = *orders.get(i).ok_or_else(|| truncated("GE"))?;
                    self.put(addr, ch);
                    addr = (addr + 1) % size;
                    i += 1;
                }
                _ => {
                    self.put(addr, byte);
                    addr = (addr + 1) % size;
                }
            }
        }

        Ok(())
    }

    fn set_field(&mut self, addr: usize, attr: u8) {
        self.attrs[addr] = Some(attr);
        self.buffer[addr] = 0;
        self.typed[addr] = false;
    }

    fn put(&mut self, addr: usize, byte: u8) {
        self.attrs[addr] = None;
        self.buffer[addr] = byte;
        self.typed[addr] = false;
    }

    /// First data position of the next unprotected field after `addr`
    fn next_unprotected(&self, addr: usize) -> Option<usize> {
        let size = self.size();
        (0..size)
            .map(|off| (addr + off) % size)
            .find(|&p| matches!(self.attrs[p], Some(a) if a & FA_PROTECTED == 0))
            .map(|p| (p + 1) % size)
    }

    /// Type text at the cursor, the way an operator keys it in.
    ///
    /// Stops at the first protected position or field attribute.
    pub fn type_text(&mut self, ebcdic_text: &[u8]) {
        let size = self.size();
        for &byte in ebcdic_text {
            let pos = self.cursor;
            if self.attrs[pos].is_some() || self.is_protected(pos) {
                break;
            }
            self.buffer[pos] = byte;
            self.typed[pos] = true;
            if let Some(start) = self.field_start(pos) {
                if let Some(attr) = self.attrs[start].as_mut() {
                    *attr |= FA_MODIFIED;
                }
            }
            self.cursor = (pos + 1) % size;
        }
    }

    /// Inbound record for an AID key (without telnet framing)
    pub fn inbound(&self, aid: u8) -> Vec<u8> {
        if aid == AID_CLEAR {
            return vec![aid];
        }

        let mut out = vec![aid];
        out.extend_from_slice(&encode_address(self.cursor));

        if !self.formatted() {
            out.extend(self.buffer.iter().copied().filter(|&b| b != 0));
            return out;
        }

        let size = self.size();
        for start in (0..size).filter(|&p| matches!(self.attrs[p], Some(a) if a & FA_MODIFIED != 0)) {
            let data_start = (start + 1) % size;
            out.push(ORDER_SBA);
            out.extend_from_slice(&encode_address(data_start));
            let mut pos = data_start;
            while self.attrs[pos].is_none() {
                if self.buffer[pos] != 0 {
                    out.push(self.buffer[pos]);
                }
                pos = (pos + 1) % size;
                if pos == data_start {
                    break;
                }
            }
        }
        out
    }

    /// Inbound reply to a Read Buffer command
    pub fn read_buffer_reply(&self) -> Vec<u8> {
        let mut out = vec![AID_NONE];
        out.extend_from_slice(&encode_address(self.cursor));
        for (pos, &byte) in self.buffer.iter().enumerate() {
            match self.attrs[pos] {
                Some(attr) => out.extend_from_slice(&[ORDER_SF, attr]),
                None => out.push(byte),
            }
        }
        out
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}
