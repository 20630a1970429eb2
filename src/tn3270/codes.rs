//! Telnet and 3270 data stream code points

// Telnet commands (RFC 854)
pub const IAC: u8 = 0xFF;
pub const DONT: u8 = 0xFE;
pub const DO: u8 = 0xFD;
pub const WONT: u8 = 0xFC;
pub const WILL: u8 = 0xFB;
pub const SB: u8 = 0xFA;
pub const SE: u8 = 0xF0;
/// End of record marker (RFC 885)
pub const EOR: u8 = 0xEF;

// Telnet options
pub const OPT_BINARY: u8 = 0x00;
pub const OPT_TTYPE: u8 = 0x18;
pub const OPT_EOR: u8 = 0x19;
pub const OPT_TN3270E: u8 = 0x28;

pub const TTYPE_IS: u8 = 0x00;
pub const TTYPE_SEND: u8 = 0x01;

/// Terminal type sent during negotiation (24x80, no extended data stream)
pub const TERMINAL_TYPE: &str = "IBM-3278-2";

// 3270 commands. Both the SNA and the local-channel code points are accepted.
pub const CMD_WRITE: [u8; 2] = [0xF1, 0x01];
pub const CMD_ERASE_WRITE: [u8; 2] = [0xF5, 0x05];
pub const CMD_ERASE_WRITE_ALT: [u8; 2] = [0x7E, 0x0D];
pub const CMD_ERASE_ALL_UNPROTECTED: [u8; 2] = [0x6F, 0x0F];
pub const CMD_READ_BUFFER: [u8; 2] = [0xF2, 0x02];
pub const CMD_READ_MODIFIED: [u8; 2] = [0xF6, 0x06];
pub const CMD_READ_MODIFIED_ALL: [u8; 2] = [0x6E, 0x0E];
pub const CMD_WRITE_STRUCTURED_FIELD: [u8; 2] = [0xF3, 0x11];

// Orders
pub const ORDER_PT: u8 = 0x05;
pub const ORDER_GE: u8 = 0x08;
pub const ORDER_SBA: u8 = 0x11;
pub const ORDER_EUA: u8 = 0x12;
pub const ORDER_IC: u8 = 0x13;
pub const ORDER_SF: u8 = 0x1D;
pub const ORDER_SA: u8 = 0x28;
pub const ORDER_SFE: u8 = 0x29;
pub const ORDER_MF: u8 = 0x2C;
pub const ORDER_RA: u8 = 0x3C;

/// Extended attribute type carrying the basic 3270 field attribute
pub const XA_3270: u8 = 0xC0;

// Write control character bits
pub const WCC_RESET_MDT: u8 = 0x01;

// Field attribute bits
pub const FA_PROTECTED: u8 = 0x20;
pub const FA_MODIFIED: u8 = 0x01;

// Attention identifiers
pub const AID_NONE: u8 = 0x60;
pub const AID_ENTER: u8 = 0x7D;
pub const AID_CLEAR: u8 = 0x6D;

const AID_PF: [u8; 24] = [
    0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C, //
    0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C,
];

/// AID byte for PF1..PF24
pub fn pf_aid(key: u8) -> Option<u8> {
    match key {
        1..=24 => Some(AID_PF[key as usize - 1]),
        _ => None,
    }
}

/// 6-bit to graphic code translation used by 12-bit buffer addresses
const ADDRESS_CODES: [u8; 64] = [
    0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F,
    0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
    0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F,
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
];

/// Decode a two-byte buffer address (12-bit or 14-bit form)
pub fn decode_address(b1: u8, b2: u8) -> usize {
    if b1 & 0xC0 == 0 {
        (((b1 & 0x3F) as usize) << 8) | b2 as usize
    } else {
        (((b1 & 0x3F) as usize) << 6) | (b2 & 0x3F) as usize
    }
}

/// Encode a buffer address in 12-bit form
pub fn encode_address(addr: usize) -> [u8; 2] {
    [ADDRESS_CODES[(addr >> 6) & 0x3F], ADDRESS_CODES[addr & 0x3F]]
}
