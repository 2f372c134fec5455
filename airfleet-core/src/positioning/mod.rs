//! GPS positioning stream processing
//!
//! [`PositionProcessor`] frames NMEA sentences out of a raw byte stream,
//! validates their checksum, decodes RMC fixes and accumulates travelled
//! distance with the configured [`DistanceStrategy`].

pub mod distance;
pub mod fix;
pub mod framer;
pub mod pmtk;
pub mod processor;
pub mod sentence;

pub use distance::{haversine_km, DistanceAccumulator, DistanceStrategy};
pub use fix::{PositionFix, UtcDateTime, Validity};
pub use framer::{FramerStats, SentenceFramer};
pub use processor::PositionProcessor;
