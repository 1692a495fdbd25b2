//! Lazy, re-runnable asynchronous values.
//!
//! - [`v1`]: computations over one-shot settle handles, started by `fork`
//! - [`v2`]: future factories, combined by hand-polled futures

pub mod v1;
pub mod v2;

pub use v1::{Deferred, Settle};
pub use v2::{AndThen, Lazy};
