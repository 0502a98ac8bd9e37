//! External process execution.

mod outcome;
mod runner;

pub use outcome::{FailureReason, Outcome};
pub use runner::{DEFAULT_TIMEOUT, SpawnOptions, run};
