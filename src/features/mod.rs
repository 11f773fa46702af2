//! Boundary feature extraction
//!
//! This module contains the stages that turn the envelope into boundaries:
//! - Density clustering of envelope feature points (background vs. activity)
//! - Background run extraction and short-gap merging
//! - Sample-accurate boundary refinement with a hysteresis scan

pub mod boundary;
pub mod clustering;
pub mod segments;
