use crate::error::LexError;
use crate::token::{Span, Spanned, Token};

/// Splits a synth argument line into spanned words.
pub struct Lexer<'a> {
    input: &'a str,
    /// Byte offset of the next unread char.
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexError> {
        let mut words = Vec::new();
        loop {
            let word = self.next_word()?;
            let done = word.token == Token::EOF;
            words.push(word);
            if done {
                return Ok(words);
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn next_word(&mut self) -> Result<Spanned, LexError> {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();

        let start = self.pos;
        for (offset, ch) in self.rest().char_indices() {
            if ch.is_whitespace() {
                break;
            }
            if ch.is_control() || ch == '"' || ch == '\'' {
                return Err(LexError::UnexpectedChar {
                    ch,
                    pos: start + offset,
                });
            }
            self.pos = start + offset + ch.len_utf8();
        }

        let text = &self.input[start..self.pos];
        let span = Span {
            start,
            end: self.pos,
        };
        let token = if text.is_empty() {
            Token::EOF
        } else {
            classify(text)
        };
        Ok(Spanned {
            token,
            span,
            text: text.to_string(),
        })
    }
}

fn classify(word: &str) -> Token {
    let numeric = word
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+');
    if numeric {
        if let Ok(n) = word.parse::<f64>() {
            return Token::Number(n);
        }
    }
    match word.strip_prefix('-') {
        Some(rest) if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphabetic()) => {
            Token::Flag(rest.to_string())
        }
        _ => Token::Word(word.to_string()),
    }
}
