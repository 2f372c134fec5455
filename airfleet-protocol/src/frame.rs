//! Bridge frame encoding and decoding
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): payload length (0-255)
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (0-255 bytes): type-specific data
//! - CHECKSUM (1 byte): XOR of LENGTH, TYPE, and all PAYLOAD bytes

use heapless::Vec;

use crate::checksum::nmea_checksum;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes
///
/// Large enough for a full display channel write plus its channel byte.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Maximum complete frame size (START + LENGTH + TYPE + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Payload does not match the message type
    InvalidPayload,
    /// Unknown message type
    UnknownType(u8),
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    fn checksum(length: u8, msg_type: u8, payload: &[u8]) -> u8 {
        length ^ msg_type ^ nmea_checksum(payload)
    }

    /// Encode into a complete wire frame
    pub fn encode(&self) -> Vec<u8, MAX_FRAME_SIZE> {
        let length = self.payload.len() as u8;
        let mut out = Vec::new();
        // Capacity covers the largest frame, so these pushes cannot fail
        let _ = out.extend_from_slice(&[FRAME_START, length, self.msg_type]);
        let _ = out.extend_from_slice(&self.payload);
        let _ = out.push(Self::checksum(length, self.msg_type, &self.payload));
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    Length,
    Type,
    Payload,
    Checksum,
}

/// Byte-at-a-time frame parser
///
/// Bytes outside a frame are skipped until the next START byte, so the
/// parser resynchronizes on its own after line noise.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    length: u8,
    msg_type: u8,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::Start,
            length: 0,
            msg_type: 0,
            buffer: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.state = ParseState::Start;
        self.length = 0;
        self.msg_type = 0;
        self.buffer.clear();
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(frame))` when a frame completes, `Ok(None)` when more
    /// bytes are needed, and `Err` when a frame was discarded.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::Start => {
                if byte == FRAME_START {
                    self.state = ParseState::Length;
                }
            }
            ParseState::Length => {
                self.length = byte;
                self.state = ParseState::Type;
            }
            ParseState::Type => {
                self.msg_type = byte;
                self.buffer.clear();
                self.state = if self.length == 0 {
                    ParseState::Checksum
                } else {
                    ParseState::Payload
                };
            }
            ParseState::Payload => {
                // A u8 length always fits the buffer
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.length as usize {
                    self.state = ParseState::Checksum;
                }
            }
            ParseState::Checksum => {
                let expected = Frame::checksum(self.length, self.msg_type, &self.buffer);
                let frame = Frame {
                    msg_type: self.msg_type,
                    payload: core::mem::take(&mut self.buffer),
                };
                self.reset();
                if byte != expected {
                    return Err(FrameError::InvalidChecksum);
                }
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
