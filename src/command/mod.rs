//! Query-string parsing: tokenize, group by flag arity, assemble argv.

mod arity;
mod assembler;
mod grouper;
mod tokenizer;

pub use arity::{Arity, ArityTable};
pub use assembler::assemble;
pub use grouper::{Grouped, group, strip_quotes};
pub use tokenizer::{Token, tokenize};

/// Turn a raw query into the argv handed to the executable.
pub fn parse_command_args(raw: &str, table: &ArityTable) -> Vec<String> {
    assemble(group(&tokenize(raw), table))
}
