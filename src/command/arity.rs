//! Flag arity table: how many value tokens each known flag consumes.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Number of value tokens a flag takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Toggle, no value (e.g., --compact-output).
    Zero,
    /// One value (e.g., --indent 4).
    One,
    /// Two values (e.g., --arg name value).
    Two,
}

impl Arity {
    pub fn count(self) -> usize {
        match self {
            Arity::Zero => 0,
            Arity::One => 1,
            Arity::Two => 2,
        }
    }

    /// Convert from a raw count, rejecting anything above two.
    pub fn from_count(count: i64) -> Option<Self> {
        match count {
            0 => Some(Arity::Zero),
            1 => Some(Arity::One),
            2 => Some(Arity::Two),
            _ => None,
        }
    }
}

/// Flags understood by jq. Short and long spellings are separate entries.
const JQ_FLAGS: &[(&str, Arity)] = &[
    ("--version", Arity::Zero),
    ("--seq", Arity::Zero),
    ("--stream", Arity::Zero),
    ("--slurp", Arity::Zero),
    ("-s", Arity::Zero),
    ("--raw-input", Arity::Zero),
    ("-R", Arity::Zero),
    ("--null-input", Arity::Zero),
    ("-n", Arity::Zero),
    ("--compact-output", Arity::Zero),
    ("-c", Arity::Zero),
    ("--tab", Arity::Zero),
    ("--indent", Arity::One),
    ("--color-output", Arity::Zero),
    ("-C", Arity::Zero),
    ("--monochrome-output", Arity::Zero),
    ("-M", Arity::Zero),
    ("--ascii-output", Arity::Zero),
    ("-a", Arity::Zero),
    ("--unbuffered", Arity::Zero),
    ("--sort-keys", Arity::Zero),
    ("-S", Arity::Zero),
    ("--raw-output", Arity::Zero),
    ("-r", Arity::Zero),
    ("--join-output", Arity::Zero),
    ("-j", Arity::Zero),
    ("--from-file", Arity::One),
    ("-f", Arity::One),
    ("-L", Arity::One),
    ("--exit-status", Arity::Zero),
    ("-e", Arity::Zero),
    ("--arg", Arity::Two),
    ("--argjson", Arity::Two),
    ("--slurpfile", Arity::Two),
    ("--rawfile", Arity::Two),
    ("--argfile", Arity::Two),
    ("--args", Arity::Zero),
    ("--jsonargs", Arity::Zero),
    ("--run-tests", Arity::One),
    ("--", Arity::Zero),
];

static BUILTIN: Lazy<ArityTable> = Lazy::new(ArityTable::jq);

/// Exact-match lookup from flag spelling to arity.
#[derive(Debug, Clone, Default)]
pub struct ArityTable {
    entries: HashMap<String, Arity>,
}

impl ArityTable {
    /// A fresh table holding the jq flags.
    pub fn jq() -> Self {
        let entries = JQ_FLAGS
            .iter()
            .map(|(flag, arity)| (flag.to_string(), *arity))
            .collect();
        Self { entries }
    }

    /// Shared, read-only jq table.
    pub fn builtin() -> &'static ArityTable {
        &BUILTIN
    }

    /// Add or replace an entry.
    pub fn with_flag(mut self, flag: impl Into<String>, arity: Arity) -> Self {
        self.entries.insert(flag.into(), arity);
        self
    }

    /// Arity for `flag`, or `None` when the spelling is unknown.
    pub fn lookup(&self, flag: &str) -> Option<Arity> {
        self.entries.get(flag).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
