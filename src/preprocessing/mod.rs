//! Signal preprocessing modules
//!
//! This module contains the stages that run before clustering:
//! - Channel selection (first channel of interleaved PCM)
//! - Zero-phase Butterworth filtering
//! - Block-max envelope downsampling

pub mod channel_mixer;
pub mod envelope;
pub mod filter;
