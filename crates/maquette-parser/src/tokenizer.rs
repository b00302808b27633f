//! Line tokenizer for workspace definitions.
//!
//! Splits one logical line into whitespace-separated tokens. Double quotes
//! group words with embedded whitespace into a single token and are removed
//! on emit; `\"` and `\\` are recognized escapes inside quotes. Continuation
//! joining and comment stripping happen earlier, in the
//! [`preprocessor`](super::preprocess).

use winnow::{
    Parser as _,
    ascii::space0,
    combinator::{alt, cut_err, preceded, repeat, terminated},
    error::ModalResult,
    token::{none_of, one_of, take_while},
};

use crate::error::{ErrorCode, ParserError, Result};

/// Parse one character inside a quoted token, resolving `\"` and `\\`.
///
/// Any other backslash sequence is kept verbatim, one character per call.
fn quoted_char(input: &mut &str) -> ModalResult<char> {
    alt((preceded('\\', one_of(['"', '\\'])), none_of('"'))).parse_next(input)
}

/// Parse a quoted token. The surrounding quotes are consumed and dropped.
///
/// Once the opening quote has matched, a missing closing quote is a hard
/// error rather than a backtrack.
fn quoted_token(input: &mut &str) -> ModalResult<String> {
    let content: String =
        preceded('"', cut_err(terminated(repeat(0.., quoted_char), '"'))).parse_next(input)?;
    Ok(content)
}

/// Parse an unquoted token, a run of characters up to whitespace or a quote.
fn bare_token(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '"')
        .map(|s: &str| s.to_owned())
        .parse_next(input)
}

fn token(input: &mut &str) -> ModalResult<String> {
    alt((quoted_token, bare_token)).parse_next(input)
}

/// Parse a whole line into its tokens, consuming surrounding whitespace.
fn line_tokens(input: &mut &str) -> ModalResult<Vec<String>> {
    let tokens: Vec<String> =
        preceded(space0, repeat(0.., terminated(token, space0))).parse_next(input)?;
    Ok(tokens)
}

/// Tokenize one logical line.
///
/// The only way a line can fail to tokenize is an unterminated quoted
/// token, which is reported as [`ErrorCode::E001`].
pub(crate) fn tokenize(line: &str) -> Result<Tokens> {
    match line_tokens.parse(line) {
        Ok(tokens) => Ok(Tokens::new(tokens)),
        Err(_) => Err(
            ParserError::new(ErrorCode::E001, "unterminated quoted token")
                .with_help("close the token with a `\"`"),
        ),
    }
}

/// A tokenized line with grammar-checked accessors.
///
/// Statement parsers access tokens through [`required`](Tokens::required)
/// and [`ensure_at_most`](Tokens::ensure_at_most), which turn missing or
/// surplus tokens into grammar errors carrying the statement's canonical
/// grammar string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tokens {
    tokens: Vec<String>,
}

impl Tokens {
    fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// The token at `index`, if present.
    pub(crate) fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// The token at `index`, or a too-few-tokens error quoting `grammar`.
    pub(crate) fn required(&self, index: usize, grammar: &str) -> Result<&str> {
        self.get(index).ok_or_else(|| {
            ParserError::new(ErrorCode::E101, format!("expected: {grammar}"))
        })
    }

    /// Whether a token exists at `index`.
    pub(crate) fn includes(&self, index: usize) -> bool {
        index < self.tokens.len()
    }

    /// Error with a too-many-tokens message if more than `count` tokens
    /// are present.
    pub(crate) fn ensure_at_most(&self, count: usize, grammar: &str) -> Result<()> {
        if self.tokens.len() > count {
            Err(ParserError::new(
                ErrorCode::E100,
                format!("too many tokens, expected: {grammar}"),
            ))
        } else {
            Ok(())
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The first token, which drives statement dispatch.
    pub(crate) fn first(&self) -> Option<&str> {
        self.get(0)
    }

    /// Remove a trailing `{` token. Returns whether one was removed, which
    /// is what decides whether the statement opens a block.
    ///
    /// The brace must be its own token; `person "A"{` does not open a
    /// block.
    pub(crate) fn split_trailing_brace(&mut self) -> bool {
        if self.tokens.last().is_some_and(|t| t == "{") {
            self.tokens.pop();
            true
        } else {
            false
        }
    }

    /// Remove a leading `name =` pair. Returns the assignment name, which
    /// the caller registers against the object the statement creates.
    pub(crate) fn take_assignment(&mut self) -> Option<String> {
        if self.tokens.get(1).is_some_and(|t| t == "=") {
            let name = self.tokens.remove(0);
            self.tokens.remove(0);
            Some(name)
        } else {
            None
        }
    }

    /// Join the tokens from `index` onward with single spaces.
    ///
    /// Expression statements accept their operand either as one quoted
    /// token or spread over several bare tokens; this puts the two forms
    /// on an equal footing.
    pub(crate) fn join_from(&self, index: usize) -> String {
        self.tokens.get(index..).unwrap_or_default().join(" ")
    }

    /// Replace every token with the result of `f`, stopping at the first
    /// error.
    pub(crate) fn map_tokens<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<String>,
    {
        for token in &mut self.tokens {
            *token = f(token)?;
        }
        Ok(())
    }
}
