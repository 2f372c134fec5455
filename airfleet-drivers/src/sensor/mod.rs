//! I2C bus sensors
//!
//! All three sensors follow the same pattern: a command starts a
//! conversion, and the result can be read once the conversion time has
//! passed. `service` starts a conversion so that the following `sample`
//! finds it complete; a `sample` without one pending starts it and waits.

pub mod htu31;
pub mod mics;
pub mod sen50;

pub use htu31::Htu31;
pub use mics::Mics;
pub use sen50::Sen50;

use airfleet_core::traits::SensorError;

/// Conversion bookkeeping shared by the bus sensors
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Conversion {
    started_ms: Option<u32>,
}

impl Conversion {
    pub fn start(&mut self, now_ms: u32) {
        self.started_ms = Some(now_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.started_ms.is_some()
    }

    pub fn cancel(&mut self) {
        self.started_ms = None;
    }

    /// Milliseconds still to wait for a conversion taking `duration_ms`
    pub fn remaining(&self, now_ms: u32, duration_ms: u32) -> u32 {
        match self.started_ms {
            Some(at) => duration_ms.saturating_sub(now_ms.wrapping_sub(at)),
            None => duration_ms,
        }
    }
}

/// Split a reply of CRC protected big-endian words
///
/// Every word is followed by its CRC byte, so `reply` must hold at least
/// `3 * N` bytes.
pub(crate) fn checked_words<const N: usize>(
    reply: &[u8],
    crc: fn(&[u8]) -> u8,
) -> Result<[u16; N], SensorError> {
    if reply.len() < 3 * N {
        return Err(SensorError::InvalidReading);
    }
    let mut words = [0u16; N];
    for (word, chunk) in words.iter_mut().zip(reply.chunks_exact(3)) {
        if crc(&chunk[..2]) != chunk[2] {
            return Err(SensorError::Checksum);
        }
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(words)
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted I2C bus and a delay that only records

    use embedded_hal::delay::DelayNs;
    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Default)]
    pub struct ScriptedBus {
        /// Every write as (address, bytes)
        pub writes: Vec<(u8, Vec<u8>)>,
        /// Replies handed out to reads in order
        pub replies: VecDeque<Vec<u8>>,
        pub fail: bool,
    }

    impl ScriptedBus {
        pub fn reply(&mut self, bytes: &[u8]) {
            self.replies.push_back(bytes.to_vec());
        }
    }

    impl ErrorType for ScriptedBus {
        type Error = ErrorKind;
    }

    impl I2c for ScriptedBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Bus);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        let reply = self
                            .replies
                            .pop_front()
                            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;
                        let bytes = reply.get(..buf.len()).ok_or(ErrorKind::Overrun)?;
                        buf.copy_from_slice(bytes);
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingDelay {
        pub waited_ns: u64,
    }

    impl RecordingDelay {
        pub fn waited_ms(&self) -> u64 {
            self.waited_ns / 1_000_000
        }
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.waited_ns += u64::from(ns);
        }
    }
}
