//! Structured jq options, for hosts that hold settings rather than a query string.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Input data: one document or several.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum InputData {
    One(String),
    Many(Vec<String>),
}

/// Typed jq settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct JqOptions {
    /// Filter text, or a path to a filter file when `from_file` is set.
    pub filter: Option<String>,
    pub from_file: bool,

    /// Module search directories (`-L`).
    pub module_dirs: Vec<String>,

    /// Named arguments, emitted in name order.
    pub arg: BTreeMap<String, String>,
    pub argjson: BTreeMap<String, String>,
    pub slurpfile: BTreeMap<String, String>,
    pub rawfile: BTreeMap<String, String>,
    /// Deprecated upstream, still accepted.
    pub argfile: BTreeMap<String, String>,

    pub stream: bool,
    pub slurp: bool,
    pub raw_input: bool,
    pub compact_output: bool,
    pub tab: bool,
    pub indent: Option<u8>,
    pub sort_keys: bool,
    pub raw_output: bool,
    pub join_output: bool,

    /// Data piped to stdin.
    pub input: Option<InputData>,
}

impl JqOptions {
    /// Build the argv for these options. The filter is always last.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        for dir in &self.module_dirs {
            push(&mut args, &["-L", dir]);
        }

        let named = [
            ("--arg", &self.arg),
            ("--argjson", &self.argjson),
            ("--slurpfile", &self.slurpfile),
            ("--rawfile", &self.rawfile),
            ("--argfile", &self.argfile),
        ];
        for (flag, map) in named {
            for (name, value) in map {
                push(&mut args, &[flag, name, value]);
            }
        }

        let toggles = [
            ("--stream", self.stream),
            ("--slurp", self.slurp),
            ("--raw-input", self.raw_input),
            ("--compact-output", self.compact_output),
            ("--tab", self.tab),
            ("--sort-keys", self.sort_keys),
            ("--raw-output", self.raw_output),
            ("--join-output", self.join_output),
        ];
        args.extend(
            toggles
                .iter()
                .filter(|(_, on)| *on)
                .map(|(flag, _)| flag.to_string()),
        );

        if let Some(indent) = self.indent {
            push(&mut args, &["--indent", &indent.to_string()]);
        }

        if !self.has_input() {
            args.push("--null-input".to_string());
        }

        match (&self.filter, self.from_file) {
            (Some(filter), true) => push(&mut args, &["--from-file", filter]),
            (Some(filter), false) => args.push(filter.clone()),
            (None, _) => args.push(".".to_string()),
        }

        args
    }

    /// What to write to stdin, if anything. Empty input counts as none.
    pub fn stdin_payload(&self) -> Option<String> {
        if !self.has_input() {
            return None;
        }
        self.input.as_ref().map(|input| match input {
            InputData::One(text) => text.clone(),
            InputData::Many(texts) => texts.join("\n"),
        })
    }

    fn has_input(&self) -> bool {
        match &self.input {
            None => false,
            Some(InputData::One(text)) => !text.is_empty(),
            Some(InputData::Many(texts)) => !texts.is_empty(),
        }
    }
}

fn push(args: &mut Vec<String>, parts: &[&str]) {
    args.extend(parts.iter().map(|p| p.to_string()));
}
