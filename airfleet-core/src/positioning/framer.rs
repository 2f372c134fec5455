//! Sentence framing
//!
//! A sentence starts at `$` and ends at carriage return. Bytes outside a
//! sentence (including the `\n` that follows the CR) are ignored. A `$`
//! inside a sentence restarts framing.

use heapless::Vec;

/// Longest sentence body kept; standard NMEA sentences are at most 82 bytes
pub const MAX_SENTENCE_LEN: usize = 96;

const START: u8 = b'$';
const TERMINATOR: u8 = b'\r';

/// Result of feeding one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framed {
    /// A sentence completed; read it with [`SentenceFramer::sentence`]
    Sentence,
    /// The sentence outgrew the buffer and was dropped
    Overflow,
}

/// Stream counters
///
/// The framer maintains `sentences` and `overflows`; the remaining counters
/// are bumped by whoever interprets the framed sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramerStats {
    pub sentences: u32,
    pub overflows: u32,
    pub checksum_failures: u32,
    pub malformed: u32,
    /// Sentences with a tag nobody interprets
    pub ignored: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SentenceFramer {
    buffer: Vec<u8, MAX_SENTENCE_LEN>,
    in_sentence: bool,
    pub stats: FramerStats,
}

impl SentenceFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, byte: u8) -> Option<Framed> {
        match byte {
            START => {
                self.buffer.clear();
                self.in_sentence = true;
                None
            }
            TERMINATOR if self.in_sentence => {
                self.in_sentence = false;
                self.stats.sentences = self.stats.sentences.wrapping_add(1);
                Some(Framed::Sentence)
            }
            _ if self.in_sentence => {
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    self.in_sentence = false;
                    self.stats.overflows = self.stats.overflows.wrapping_add(1);
                    return Some(Framed::Overflow);
                }
                None
            }
            _ => None,
        }
    }

    /// Body of the last completed sentence, without `$` and CR
    pub fn sentence(&self) -> &[u8] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_all(framer: &mut SentenceFramer, bytes: &[u8]) -> std::vec::Vec<std::vec::Vec<u8>> {
        let mut out = std::vec::Vec::new();
        for &b in bytes {
            if framer.feed(b) == Some(Framed::Sentence) {
                out.push(framer.sentence().to_vec());
            }
        }
        out
    }

    #[test]
    fn test_frames_between_dollar_and_cr() {
        let mut framer = SentenceFramer::new();
        let frames = frame_all(&mut framer, b"noise$GNRMC,1*00\r\n$GPGSV,2*11\r\n");
        assert_eq!(frames, [b"GNRMC,1*00".to_vec(), b"GPGSV,2*11".to_vec()]);
        assert_eq!(framer.stats.sentences, 2);
    }

    #[test]
    fn test_cr_outside_sentence_ignored() {
        let mut framer = SentenceFramer::new();
        assert_eq!(framer.feed(b'\r'), None);
        assert_eq!(framer.feed(b'\n'), None);
    }

    #[test]
    fn test_dollar_restarts() {
        let mut framer = SentenceFramer::new();
        let frames = frame_all(&mut framer, b"$GNR$GNRMC,2\r");
        assert_eq!(frames, [b"GNRMC,2".to_vec()]);
    }

    #[test]
    fn test_overflow_drops_and_recovers() {
        let mut framer = SentenceFramer::new();
        framer.feed(b'$');
        let mut overflowed = false;
        for _ in 0..=MAX_SENTENCE_LEN {
            if framer.feed(b'A') == Some(Framed::Overflow) {
                overflowed = true;
            }
        }
        assert!(overflowed);
        assert_eq!(framer.stats.overflows, 1);
        // Remainder of the long sentence is ignored until the next start
        assert_eq!(framer.feed(b'\r'), None);
        let frames = frame_all(&mut framer, b"$OK\r");
        assert_eq!(frames, [b"OK".to_vec()]);
    }
}
