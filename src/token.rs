use serde::{Deserialize, Serialize};

/// One whitespace-separated word of a synth argument line.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A word that is entirely a decimal number, e.g. `50`, `-12.5`, `.3`.
    Number(f64),
    /// An option flag: `-` followed by letters, e.g. `-n`.
    Flag(String),
    /// Anything else: type names, frequencies, lengths with units.
    Word(String),
    EOF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
    /// The word exactly as written.
    pub text: String,
}

/// Convert a token back to its approximate source representation.
pub fn token_to_string(token: &Token) -> String {
    match token {
        Token::Number(n) => {
            if *n == (*n as i64) as f64 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Token::Flag(s) => format!("-{s}"),
        Token::Word(s) => s.clone(),
        Token::EOF => "end of input".into(),
    }
}
