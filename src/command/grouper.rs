//! Group tokens into flag+value clusters and leftover filter text.

use super::arity::ArityTable;
use super::tokenizer::Token;

/// Result of grouping a token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouped {
    /// Known flags followed by their (quote-stripped) values, in input order.
    pub args: Vec<String>,
    /// Tokens not claimed by any flag, unchanged and in input order.
    pub remainder: Vec<String>,
}

/// Single left-to-right pass over `tokens`.
///
/// A token found in `table` with arity N takes the next N tokens as its
/// values. If fewer than N tokens are left, the flag and everything after it
/// go to the remainder. Unknown tokens, flag-shaped or not, go to the
/// remainder and the pass continues.
pub fn group(tokens: &[Token], table: &ArityTable) -> Grouped {
    let mut grouped = Grouped::default();
    let mut rest = tokens;

    while let Some((head, tail)) = rest.split_first() {
        match table.lookup(head.as_str()) {
            Some(arity) if tail.len() >= arity.count() => {
                let (values, after) = tail.split_at(arity.count());
                grouped.args.push(head.as_str().to_string());
                grouped
                    .args
                    .extend(values.iter().map(|v| strip_quotes(v.as_str()).to_string()));
                rest = after;
            }
            Some(_) => {
                grouped
                    .remainder
                    .extend(rest.iter().map(|t| t.as_str().to_string()));
                break;
            }
            None => {
                grouped.remainder.push(head.as_str().to_string());
                rest = tail;
            }
        }
    }

    grouped
}

/// Strip one matching pair of surrounding quotes (`"…"` or `'…'`).
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value
                .strip_prefix(quote)
                .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
