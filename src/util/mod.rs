//! Internal utilities for Seqreduce.

pub mod det_rng;

pub use det_rng::DetRng;
