//! Playbook documents: `jq <query>` lines, each followed by its input.
//!
//! ```text
//! jq --arg name world .greeting = $name
//! {"greeting": null}
//!
//! jq -c .[]
//! ./data/items.json
//!
//! jq .name
//! https://api.github.com/repos/jqlang/jq
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

static QUERY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^jq\s+(.+)$").expect("query line pattern is valid"));

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").expect("url pattern is valid"));

static FILE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/|\.{1,2}/|~/)").expect("file pattern is valid"));

/// Errors that can occur when resolving a playbook block.
#[derive(Debug, Error)]
pub enum PlaybookError {
    #[error("no jq query on line {0}")]
    NoQueryAtLine(usize),

    #[error("input file not found: {0}")]
    MissingFile(PathBuf),

    #[error("failed to read input file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Where a query's input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Remote document.
    Url(String),
    /// Local file, as written in the playbook.
    File(String),
    /// Text written under the query line.
    Inline(String),
    /// Nothing: stdin stays unconnected.
    Empty,
}

/// One query and its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBlock {
    /// 1-based line of the `jq` line.
    pub line: usize,
    /// Text after `jq `, untokenized.
    pub query: String,
    pub source: InputSource,
}

/// Find every query block in a document, in order.
pub fn scan(document: &str) -> Vec<QueryBlock> {
    let lines: Vec<&str> = document.lines().collect();

    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let query = query_text(line)?;
            Some(QueryBlock {
                line: idx + 1,
                query: query.to_string(),
                source: context_source(&lines[idx + 1..]),
            })
        })
        .collect()
}

/// The block whose `jq` line is `line` (1-based).
pub fn block_at(document: &str, line: usize) -> Result<QueryBlock, PlaybookError> {
    scan(document)
        .into_iter()
        .find(|block| block.line == line)
        .ok_or(PlaybookError::NoQueryAtLine(line))
}

fn query_text(line: &str) -> Option<&str> {
    QUERY_LINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Classify the line after a query; inline text may span further lines.
fn context_source(following: &[&str]) -> InputSource {
    let Some(first) = following.first() else {
        return InputSource::Empty;
    };
    let context = first.trim();

    if context.is_empty() || first.starts_with('#') {
        InputSource::Empty
    } else if URL.is_match(context) {
        InputSource::Url(context.to_string())
    } else if FILE_PATH.is_match(context) {
        InputSource::File(context.to_string())
    } else {
        let body: Vec<&str> = following
            .iter()
            .take_while(|line| query_text(line).is_none() && !line.starts_with('#'))
            .copied()
            .collect();
        InputSource::Inline(body.join("\n").trim().to_string())
    }
}

impl InputSource {
    /// Fetch the input text. `base_dir` anchors relative file paths.
    pub async fn resolve(&self, base_dir: &Path) -> Result<Option<String>, PlaybookError> {
        match self {
            InputSource::Empty => Ok(None),
            InputSource::Inline(text) => Ok(Some(text.clone())),
            InputSource::File(raw) => {
                let path = resolve_path(raw, base_dir);
                if !path.exists() {
                    return Err(PlaybookError::MissingFile(path));
                }
                debug!(path = %path.display(), "reading input file");
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| PlaybookError::Read {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Some(text.trim().to_string()))
            }
            InputSource::Url(url) => {
                debug!(%url, "fetching remote input");
                let fetch = async {
                    reqwest::get(url.as_str())
                        .await?
                        .error_for_status()?
                        .text()
                        .await
                };
                let text = fetch.await.map_err(|source| PlaybookError::Fetch {
                    url: url.clone(),
                    source,
                })?;
                Ok(Some(text))
            }
        }
    }
}

/// Absolute paths as-is, `~/` under the home dir, the rest under `base_dir`.
fn resolve_path(raw: &str, base_dir: &Path) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
