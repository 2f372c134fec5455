//! Display link wire format
//!
//! The remote display exposes one service with four write channels:
//!
//! ```text
//! clear      [0x00]
//! set-cursor [x, y]
//! print      [x, y, text...]
//! flash      [x, y, interval_hi, interval_lo, text...]   interval 0 = disabled
//! ```
//!
//! Payloads never exceed [`MAX_CHANNEL_PAYLOAD`] bytes.

use heapless::Vec;

/// Character columns on the remote display
pub const DISPLAY_COLS: usize = 20;

/// Character rows on the remote display
pub const DISPLAY_ROWS: usize = 4;

/// Maximum bytes in a single channel write
pub const MAX_CHANNEL_PAYLOAD: usize = 250;

/// Header bytes ahead of the text in a print payload
const PRINT_HEADER: usize = 2;

/// Header bytes ahead of the text in a flash payload
const FLASH_HEADER: usize = 4;

/// Longest text a print payload can carry
pub const MAX_PRINT_TEXT: usize = MAX_CHANNEL_PAYLOAD - PRINT_HEADER;

/// Longest text a flash payload can carry
pub const MAX_FLASH_TEXT: usize = MAX_CHANNEL_PAYLOAD - FLASH_HEADER;

/// Channel payload buffer
pub type Payload = Vec<u8, MAX_CHANNEL_PAYLOAD>;

/// 128-bit identifier for services and channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid(pub [u8; 16]);

impl Uuid {
    /// Parse the canonical `8-4-4-4-12` form at compile time
    ///
    /// Panics (during const evaluation) on malformed input.
    pub const fn parse(s: &str) -> Self {
        let s = s.as_bytes();
        assert!(s.len() == 36, "uuid must be 36 characters");
        let mut out = [0u8; 16];
        let mut i = 0;
        let mut n = 0;
        while i < s.len() {
            if s[i] == b'-' {
                assert!(i == 8 || i == 13 || i == 18 || i == 23, "misplaced dash");
                i += 1;
                continue;
            }
            let hi = const_hex(s[i]);
            let lo = const_hex(s[i + 1]);
            out[n] = (hi << 4) | lo;
            n += 1;
            i += 2;
        }
        assert!(n == 16, "uuid must hold 16 bytes");
        Self(out)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

const fn const_hex(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit in uuid"),
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Uuid {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:x}", &self.0[..])
    }
}

/// Radio address of a remote peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress(pub [u8; 6]);

/// Service advertised by the remote display
pub const SERVICE_UUID: Uuid = Uuid::parse("46dec950-753c-44e3-abc3-bdfd08d63cfe");

pub const CLEAR_UUID: Uuid = Uuid::parse("520be753-2aa6-455e-b449-558a4555687e");
pub const SET_CURSOR_UUID: Uuid = Uuid::parse("520be753-2bb6-455e-b449-558a4555687e");
pub const PRINT_UUID: Uuid = Uuid::parse("520be753-2cc6-455e-b449-558a4555687e");
pub const FLASH_UUID: Uuid = Uuid::parse("520be753-2dd6-455e-b449-558a4555687e");

/// Logical write channels on the remote display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    Clear = 0,
    SetCursor = 1,
    Print = 2,
    Flash = 3,
}

impl Channel {
    /// Every channel, in discovery order
    pub const ALL: [Channel; 4] = [
        Channel::Clear,
        Channel::SetCursor,
        Channel::Print,
        Channel::Flash,
    ];

    /// Characteristic identifier for this channel
    pub const fn uuid(self) -> Uuid {
        match self {
            Channel::Clear => CLEAR_UUID,
            Channel::SetCursor => SET_CURSOR_UUID,
            Channel::Print => PRINT_UUID,
            Channel::Flash => FLASH_UUID,
        }
    }

    /// Look a channel up by its identifier
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == *uuid)
    }

    /// Index into per-channel tables
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

/// Payload for the clear channel
pub fn encode_clear() -> Payload {
    let mut payload = Payload::new();
    let _ = payload.push(0);
    payload
}

/// Payload for the set-cursor channel
pub fn encode_set_cursor(x: u8, y: u8) -> Payload {
    let mut payload = Payload::new();
    let _ = payload.extend_from_slice(&[x, y]);
    payload
}

/// Payload for the print channel; text beyond [`MAX_PRINT_TEXT`] is dropped
pub fn encode_print(x: u8, y: u8, text: &[u8]) -> Payload {
    let text = &text[..text.len().min(MAX_PRINT_TEXT)];
    let mut payload = Payload::new();
    let _ = payload.extend_from_slice(&[x, y]);
    let _ = payload.extend_from_slice(text);
    payload
}

/// Flashing region on the remote display
///
/// The region alternates between `text` and blanks of the same length
/// every `interval_ms`. An interval of zero means flashing is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashDescriptor {
    pub x: u8,
    pub y: u8,
    pub interval_ms: u16,
    pub text: Vec<u8, MAX_FLASH_TEXT>,
}

impl FlashDescriptor {
    /// The disabled descriptor (all fields zero)
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build a descriptor, truncating text that does not fit one payload
    pub fn new(x: u8, y: u8, interval_ms: u16, text: &[u8]) -> Self {
        let mut stored = Vec::new();
        let _ = stored.extend_from_slice(&text[..text.len().min(MAX_FLASH_TEXT)]);
        Self {
            x,
            y,
            interval_ms,
            text: stored,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_ms != 0
    }

    /// Encode into a flash channel payload
    pub fn encode(&self) -> Payload {
        let mut payload = Payload::new();
        let [hi, lo] = self.interval_ms.to_be_bytes();
        let _ = payload.extend_from_slice(&[self.x, self.y, hi, lo]);
        let _ = payload.extend_from_slice(&self.text);
        payload
    }

    /// Decode a flash channel payload
    pub fn decode(payload: &[u8]) -> Result<Self, LinkDecodeError> {
        if payload.len() < FLASH_HEADER {
            return Err(LinkDecodeError::TooShort);
        }
        if payload.len() > MAX_CHANNEL_PAYLOAD {
            return Err(LinkDecodeError::TooLong);
        }
        let interval_ms = u16::from_be_bytes([payload[2], payload[3]]);
        Ok(Self::new(payload[0], payload[1], interval_ms, &payload[FLASH_HEADER..]))
    }
}

/// Errors decoding a channel write on the display side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkDecodeError {
    /// Payload shorter than the channel header
    TooShort,
    /// Payload exceeds [`MAX_CHANNEL_PAYLOAD`]
    TooLong,
    /// Set-cursor payload must be exactly two bytes
    BadLength,
}

/// A decoded channel write, as seen by the remote display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand<'a> {
    Clear,
    SetCursor { x: u8, y: u8 },
    Print { x: u8, y: u8, text: &'a [u8] },
    Flash(FlashDescriptor),
}

impl<'a> LinkCommand<'a> {
    /// Decode a write on `channel`
    pub fn decode(channel: Channel, payload: &'a [u8]) -> Result<Self, LinkDecodeError> {
        if payload.len() > MAX_CHANNEL_PAYLOAD {
            return Err(LinkDecodeError::TooLong);
        }
        match channel {
            Channel::Clear => Ok(LinkCommand::Clear),
            Channel::SetCursor => match payload {
                [x, y] => Ok(LinkCommand::SetCursor { x: *x, y: *y }),
                _ => Err(LinkDecodeError::BadLength),
            },
            Channel::Print => match payload {
                [x, y, text @ ..] => Ok(LinkCommand::Print {
                    x: *x,
                    y: *y,
                    text,
                }),
                _ => Err(LinkDecodeError::TooShort),
            },
            Channel::Flash => FlashDescriptor::decode(payload).map(LinkCommand::Flash),
        }
    }
}
