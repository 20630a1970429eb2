//! Telnet layer for TN3270
//!
//! Splits the inbound byte stream into negotiation events and 3270 records
//! (terminated by `IAC EOR`), and answers option negotiation for a plain
//! TN3270 (non-TN3270E) terminal.

use bytes::{BufMut, BytesMut};

use super::codes::*;
use super::error::Tn3270Error;

/// Longest 3270 record accepted. A full 24x80 Erase/Write with attributes
/// is a few KB; anything past this is not a 3270 host.
pub const MAX_RECORD_LEN: usize = 64 * 1024;

/// Something the decoder pulled out of the byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetEvent {
    /// Option negotiation verb (DO/DONT/WILL/WONT) and option code
    Negotiate { verb: u8, option: u8 },
    /// Subnegotiation payload (between `IAC SB` and `IAC SE`)
    Subnegotiation(Vec<u8>),
    /// A complete 3270 data stream record
    Record(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Data,
    Iac,
    Verb(u8),
    Sub,
    SubIac,
}

/// Incremental telnet stream decoder
#[derive(Debug)]
pub struct TelnetDecoder {
    state: DecodeState,
    record: Vec<u8>,
    sub: Vec<u8>,
}

impl TelnetDecoder {
    pub fn new() -> Self {
        Self {
            state: DecodeState::Data,
            record: Vec::new(),
            sub: Vec::new(),
        }
    }

    /// Feed bytes, returning every event completed by them
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<TelnetEvent>, Tn3270Error> {
        let mut events = Vec::new();

        for &byte in data {
            self.state = match self.state {
                DecodeState::Data => {
                    if byte == IAC {
                        DecodeState::Iac
                    } else {
                        self.push_record(byte)?;
                        DecodeState::Data
                    }
                }
                DecodeState::Iac => match byte {
                    IAC => {
                        self.push_record(IAC)?;
                        DecodeState::Data
                    }
                    EOR => {
                        events.push(TelnetEvent::Record(std::mem::take(&mut self.record)));
                        DecodeState::Data
                    }
                    DO | DONT | WILL | WONT => DecodeState::Verb(byte),
                    SB => {
                        self.sub.clear();
                        DecodeState::Sub
                    }
                    // NOP, GA and friends carry nothing for us
                    _ => DecodeState::Data,
                },
                DecodeState::Verb(verb) => {
                    events.push(TelnetEvent::Negotiate { verb, option: byte });
                    DecodeState::Data
                }
                DecodeState::Sub => {
                    if byte == IAC {
                        DecodeState::SubIac
                    } else {
                        self.push_sub(byte)?;
                        DecodeState::Sub
                    }
                }
                DecodeState::SubIac => match byte {
                    SE => {
                        events.push(TelnetEvent::Subnegotiation(std::mem::take(&mut self.sub)));
                        DecodeState::Data
                    }
                    IAC => {
                        self.push_sub(IAC)?;
                        DecodeState::Sub
                    }
                    _ => DecodeState::Sub,
                },
            };
        }

        Ok(events)
    }

    fn push_record(&mut self, byte: u8) -> Result<(), Tn3270Error> {
        if self.record.len() >= MAX_RECORD_LEN {
            self.record.clear();
            self.state = DecodeState::Data;
            return Err(Tn3270Error::ProtocolError(format!(
                "no end of record within {} bytes",
                MAX_RECORD_LEN
            )));
        }
        self.record.push(byte);
        Ok(())
    }

    fn push_sub(&mut self, byte: u8) -> Result<(), Tn3270Error> {
        if self.sub.len() >= MAX_RECORD_LEN {
            self.sub.clear();
            self.state = DecodeState::Data;
            return Err(Tn3270Error::ProtocolError(
                "unterminated subnegotiation".to_string(),
            ));
        }
        self.sub.push(byte);
        Ok(())
    }
}

impl Default for TelnetDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Options this client is willing to enable
fn supported(option: u8) -> bool {
    matches!(option, OPT_BINARY | OPT_EOR | OPT_TTYPE)
}

/// Option state for both directions (RFC 1143, without queueing since the
/// client never starts a negotiation itself)
#[derive(Debug, Clone)]
pub struct Negotiator {
    /// Options we agreed to perform (WILL sent)
    local: [bool; 256],
    /// Options we asked the host to perform (DO sent)
    remote: [bool; 256],
}

impl Negotiator {
    pub fn new() -> Self {
        Self {
            local: [false; 256],
            remote: [false; 256],
        }
    }

    pub fn local_enabled(&self, option: u8) -> bool {
        self.local[option as usize]
    }

    pub fn remote_enabled(&self, option: u8) -> bool {
        self.remote[option as usize]
    }

    /// The reply owed for `event`, if any. Requests for the state an
    /// option is already in are not acknowledged again.
    pub fn reply(&mut self, event: &TelnetEvent) -> Option<Vec<u8>> {
        match event {
            TelnetEvent::Negotiate { verb, option } => {
                let opt = *option as usize;
                let answer = match *verb {
                    DO if self.local[opt] => return None,
                    DO if supported(*option) => {
                        self.local[opt] = true;
                        WILL
                    }
                    DO => WONT,
                    WILL if self.remote[opt] => return None,
                    WILL if supported(*option) => {
                        self.remote[opt] = true;
                        DO
                    }
                    WILL => DONT,
                    DONT if self.local[opt] => {
                        self.local[opt] = false;
                        WONT
                    }
                    WONT if self.remote[opt] => {
                        self.remote[opt] = false;
                        DONT
                    }
                    _ => return None,
                };
                Some(vec![IAC, answer, *option])
            }
            TelnetEvent::Subnegotiation(payload) => {
                if payload.as_slice() == [OPT_TTYPE, TTYPE_SEND] {
                    let mut reply = vec![IAC, SB, OPT_TTYPE, TTYPE_IS];
                    reply.extend_from_slice(TERMINAL_TYPE.as_bytes());
                    reply.extend_from_slice(&[IAC, SE]);
                    Some(reply)
                } else {
                    None
                }
            }
            TelnetEvent::Record(_) => None,
        }
    }
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame an outbound 3270 record: escape IAC and append `IAC EOR`
pub fn frame_record(record: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(record.len() + 4);
    for &byte in record {
        if byte == IAC {
            out.put_u8(IAC);
        }
        out.put_u8(byte);
    }
    out.put_slice(&[IAC, EOR]);
    out
}
