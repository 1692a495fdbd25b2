//! Asynchronous sequencing primitives.
//!
//! Each primitive offers a different way to say "run this, then that":
//!
//! - [`flow`]: Continuation callbacks threaded through `reduce` and `series`
//! - [`lazy`]: Lazy, re-runnable values (`v1` fork-driven, `v2` future-backed)
//! - [`promise`]: Eager promises that start work at construction
//!
//! None of them introduces concurrency on its own. Sequencing is strict:
//! the continuation for step `n` is what starts step `n + 1`.

pub mod flow;
pub mod lazy;
pub mod promise;

pub use flow::{Callback, Step};
pub use lazy::{Deferred, Lazy, Settle};
pub use promise::{Promise, Resolver};
