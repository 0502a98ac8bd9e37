//! Response formatting for host output.

use crate::process::{FailureReason, Outcome};
use serde::Serialize;

/// JSON response for one invocation.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Response {
    Success {
        ok: bool,
        stdout: String,
    },
    Failure {
        ok: bool,
        reason: FailureReason,
        stderr: String,
    },
}

impl Response {
    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success { stdout } => Response::Success {
                ok: true,
                stdout: String::from_utf8_lossy(stdout).into_owned(),
            },
            Outcome::Failure { stderr, reason } => Response::Failure {
                ok: false,
                reason: *reason,
                stderr: String::from_utf8_lossy(stderr).into_owned(),
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // Only string and enum fields; serialization cannot realistically fail.
            r#"{"ok":false,"reason":"stream_error","stderr":"unserializable response"}"#
                .to_string()
        })
    }
}

/// Format a failed outcome for a log surface. `None` on success.
pub fn format_failure(outcome: &Outcome) -> Option<String> {
    let Outcome::Failure { stderr, reason } = outcome else {
        return None;
    };
    let mut msg = format!("FAILED ({})", reason.as_str());
    let text = String::from_utf8_lossy(stderr);
    if !text.is_empty() {
        msg.push('\n');
        msg.push_str(text.trim_end());
    }
    Some(msg)
}
