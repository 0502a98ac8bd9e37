//! JSON requests from an editor host.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::command::{ArityTable, parse_command_args};
use crate::options::JqOptions;
use crate::process::SpawnOptions;

/// Errors that can occur when parsing a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request has neither a query nor options")]
    MissingQuery,
}

/// One invocation request.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// Raw query: flags and filter, as typed by the user.
    #[serde(default)]
    pub query: Option<String>,

    /// Structured alternative to `query`.
    #[serde(default)]
    pub options: Option<JqOptions>,

    /// Data piped to stdin. Falls back to the options' input.
    #[serde(default)]
    pub input: Option<String>,

    /// Working directory override.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Timeout override in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Request {
    /// Parse from JSON string.
    pub fn parse(json: &str) -> Result<Self, RequestError> {
        let request: Request = serde_json::from_str(json)?;
        if request.query.is_none() && request.options.is_none() {
            return Err(RequestError::MissingQuery);
        }
        Ok(request)
    }

    /// The argv for this request. A raw query wins over options.
    pub fn args(&self, table: &ArityTable) -> Vec<String> {
        match (&self.query, &self.options) {
            (Some(query), _) => parse_command_args(query, table),
            (None, Some(options)) => options.to_args(),
            (None, None) => Vec::new(),
        }
    }

    /// Stdin payload, if any.
    pub fn stdin_payload(&self) -> Option<String> {
        self.input
            .clone()
            .or_else(|| self.options.as_ref().and_then(JqOptions::stdin_payload))
    }

    /// Apply this request's overrides on top of `base`.
    pub fn spawn_options(&self, base: SpawnOptions) -> SpawnOptions {
        let mut options = base;
        if let Some(cwd) = &self.cwd {
            options.cwd = Some(PathBuf::from(cwd));
        }
        options.env.extend(self.env.clone());
        if let Some(ms) = self.timeout_ms {
            options.timeout = Duration::from_millis(ms);
        }
        options
    }
}
