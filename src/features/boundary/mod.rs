//! Boundary refinement
//!
//! Turns coarse background runs into sample-accurate boundary indices by
//! comparing short-term signal activity against a local noise floor.

pub mod baseline;
pub mod refiner;
pub mod scan;

pub use refiner::{refine_boundaries, RefineOutcome};
pub use scan::{HysteresisScan, ScanStep};
