//! Debounced re-classification scheduling.
//!
//! Coalesces continuous gesture events into single classification runs and
//! guarantees at most one inference execution is ever in flight.

mod reclassify;

pub use reclassify::{Generation, ReclassificationScheduler, SchedulerConfig};
