//! Query tokenization, quote-aware.

/// A token from a raw query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A flag-shaped run (`-c`, `--arg`, `--sort-keys`).
    Flag(String),
    /// A double-quoted span, delimiters included.
    Quoted(String),
    /// Any other run of non-whitespace characters.
    Word(String),
}

impl Token {
    /// The token text as it appeared in the input.
    pub fn as_str(&self) -> &str {
        match self {
            Token::Flag(s) | Token::Quoted(s) | Token::Word(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Token::Flag(s) | Token::Quoted(s) | Token::Word(s) => s,
        }
    }
}

/// Split a raw query into tokens.
///
/// Whitespace separates tokens, except inside a terminated double-quoted
/// span, which is kept whole (`"a, b"` stays one token). A backslash inside
/// a quoted span escapes the next character. An unterminated quote is an
/// ordinary character.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let end = scan_run(rest);
        tokens.push(classify_run(&rest[..end]));
        rest = &rest[end..];
    }

    tokens
}

/// Byte length of the run at the start of `s`.
fn scan_run(s: &str) -> usize {
    let mut chars = s.char_indices();

    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() {
            return i;
        }
        if c == '"'
            && let Some(len) = quoted_len(&s[i..])
        {
            // Skip the rest of the span; it may contain whitespace.
            let close = i + len;
            for (j, _) in chars.by_ref() {
                if j + 1 >= close {
                    break;
                }
            }
        }
    }

    s.len()
}

/// Length of the quoted span at the start of `s` (which begins with `"`),
/// closing quote included. `None` if the quote is never closed.
fn quoted_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn classify_run(run: &str) -> Token {
    if run.starts_with('"') && quoted_len(run) == Some(run.len()) {
        return Token::Quoted(run.to_string());
    }
    if is_flag_shaped(run) {
        return Token::Flag(run.to_string());
    }
    Token::Word(run.to_string())
}

/// `-` or `--`, then word characters with single internal hyphens.
fn is_flag_shaped(run: &str) -> bool {
    let body = run
        .strip_prefix("--")
        .or_else(|| run.strip_prefix('-'))
        .unwrap_or("");
    if body.is_empty() {
        return false;
    }
    body.split('-')
        .all(|part| !part.is_empty() && part.bytes().all(is_word_byte))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
