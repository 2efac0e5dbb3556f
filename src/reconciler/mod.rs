//! Transfer Reconciler module
//!
//! Observes downloads queued on the transfer daemon until each album either
//! lands in the library or runs out of alternatives.

mod classify;
mod clock;
mod engine;

pub use classify::{classify, DirectoryVerdict};
pub use clock::{Clock, TokioClock};
pub use engine::{wait_and_organize, ReconcileSettings, Reconciler, WatchedDirectory};
