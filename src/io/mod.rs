//! Audio I/O modules
//!
//! Audio decoding using Symphonia and the in-memory signal type.

pub mod decoder;
pub mod signal;

pub use decoder::decode_file;
pub use signal::Signal;
