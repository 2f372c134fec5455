//! GPS receivers

pub mod l86;

pub use l86::{L86, NoForceOn};
