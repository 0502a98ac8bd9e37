//! Output formatting and response generation.

mod response;

pub use response::{Response, format_failure};
