//! Result aggregation modules
//!
//! Collects refined boundaries into the values returned to callers:
//! - Result types
//! - Metadata
//! - Speech intervals (VAD mode)

pub mod intervals;
pub mod metadata;
pub mod result;
