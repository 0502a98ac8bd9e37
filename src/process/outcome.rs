//! Terminal result of one process invocation.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Why an invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The child ran to completion with a non-zero code, or was killed by a signal.
    NonZeroExit,
    /// The executable could not be started.
    SpawnError,
    /// A pipe to or from the child failed.
    StreamError,
    /// The child outlived its time budget and was killed.
    Timeout,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::NonZeroExit => "non_zero_exit",
            FailureReason::SpawnError => "spawn_error",
            FailureReason::StreamError => "stream_error",
            FailureReason::Timeout => "timeout",
        }
    }
}

/// Success carries stdout, failure carries stderr plus a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { stdout: Vec<u8> },
    Failure { stderr: Vec<u8>, reason: FailureReason },
}

impl Outcome {
    pub fn success(stdout: Vec<u8>) -> Self {
        Outcome::Success { stdout }
    }

    pub fn failure(reason: FailureReason, stderr: Vec<u8>) -> Self {
        Outcome::Failure { stderr, reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The failure reason, if failed.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { reason, .. } => Some(*reason),
        }
    }

    /// Captured bytes: stdout on success, stderr on failure.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Outcome::Success { stdout } => stdout,
            Outcome::Failure { stderr, .. } => stderr,
        }
    }

    /// Stdout as text (lossy). `None` on failure.
    pub fn stdout_text(&self) -> Option<String> {
        match self {
            Outcome::Success { stdout } => Some(String::from_utf8_lossy(stdout).into_owned()),
            Outcome::Failure { .. } => None,
        }
    }

    /// Stderr as text (lossy). `None` on success.
    pub fn stderr_text(&self) -> Option<String> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { stderr, .. } => Some(String::from_utf8_lossy(stderr).into_owned()),
        }
    }

    /// Decode stdout as a single JSON document. `None` on failure.
    pub fn json<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        match self {
            Outcome::Success { stdout } => Some(serde_json::from_slice(stdout)),
            Outcome::Failure { .. } => None,
        }
    }

    /// Decode stdout as a stream of JSON documents. `None` on failure.
    pub fn json_stream(&self) -> Option<serde_json::Result<Vec<serde_json::Value>>> {
        match self {
            Outcome::Success { stdout } => Some(
                serde_json::Deserializer::from_slice(stdout)
                    .into_iter::<serde_json::Value>()
                    .collect(),
            ),
            Outcome::Failure { .. } => None,
        }
    }
}
