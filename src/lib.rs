//! jqline - run jq queries written inline in text.
//!
//! A raw query line (`--arg name value .filter`) is tokenized, grouped into
//! flag clusters by a per-flag arity table, and assembled into an argv. The
//! runner spawns jq with that argv, pipes the input in, enforces a timeout,
//! and resolves to a success or failure outcome.

pub mod command;
pub mod config;
pub mod logging;
pub mod options;
pub mod output;
pub mod playbook;
pub mod process;
pub mod request;

pub use command::{ArityTable, parse_command_args};
pub use config::{CompiledConfig, Config};
pub use options::JqOptions;
pub use output::{Response, format_failure};
pub use process::{FailureReason, Outcome, SpawnOptions, run};
pub use request::Request;
