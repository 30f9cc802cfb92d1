//! Parse errors.
//!
//! Triaged down from `yash_syntax::parser::error::SyntaxError` to the
//! taxonomy `mrsh.h` and spec §7 actually call for: unterminated quotes,
//! substitutions, and here-documents; malformed redirections; malformed
//! assignments; reserved words out of place; missing closing keywords;
//! empty pipelines; and invalid arithmetic expressions. Extension-only
//! variants the teacher carries (`[[ ]]`, process substitution, here-string,
//! `decl_util`-flavored errors) have no counterpart here, since neither
//! `mrsh.h` nor the spec has the features they would report on.

use crate::lexer::LexError;
use crate::source::{Location, Range};
use crate::source::pretty::{Annotation, AnnotationKind, MessageBase};
use std::borrow::Cow;
use thiserror::Error;

/// A syntax error together with the location it occurred at, the single
/// error type every fallible parsing operation in this crate returns.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{cause}")]
pub struct Error {
    #[source]
    pub cause: SyntaxError,
    pub location: Location,
}

impl MessageBase for Error {
    fn message_title(&self) -> Cow<'_, str> {
        self.cause.to_string().into()
    }

    fn main_annotation(&self) -> Annotation<'_> {
        Annotation::new(AnnotationKind::Error, self.cause.to_string().into(), &self.location)
    }
}

/// The specific thing that went wrong while scanning or parsing.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SyntaxError {
    /// `\` appeared as the very last byte of the input.
    #[error("backslash at end of input")]
    UnterminatedEscape,
    /// `${}` or `${#}` with no parameter name. Mirrors
    /// `MRSH_WORD_PARAMETER_OP_NONE` applied with an empty `name`.
    #[error("a parameter expansion has no name")]
    EmptyParam,
    /// `name=` as the target of a redirection operator, or a redirection
    /// operator with no target word at all.
    #[error("redirection operator has no target")]
    MissingRedirectTarget,
    /// A reserved word (`then`, `do`, `esac`, ...) appeared where a word
    /// or a different reserved word was grammatically required.
    #[error("unexpected token")]
    UnexpectedToken,
    /// The input ended in the middle of a compound command, before the
    /// reserved word that was supposed to close it.
    #[error("expected `{expected}` before end of input")]
    MissingClosingKeyword { expected: &'static str },
    /// `case`/`if`/`for`/`while`/`until` was missing its required body
    /// (an empty `then`/`do`/`else` clause, disallowed by POSIX's
    /// `compound_list` production, which always has at least one term).
    #[error("missing command body")]
    MissingBody,
    /// A pipeline with no commands at all (e.g. two consecutive `|`s).
    #[error("empty pipeline")]
    EmptyPipeline,
    /// An empty `for` loop variable name, or one that is not a valid
    /// identifier.
    #[error("invalid loop variable name")]
    InvalidLoopVariable,
    /// A `name()` function definition whose parenthesis pair is not
    /// empty (`name(x)`), the only malformed shape this grammar can
    /// distinguish from a plain syntax error once `name(` has already
    /// committed to the function-definition production.
    #[error("invalid function definition")]
    InvalidFunctionDefinition,
    /// The arithmetic expression inside `$((...))` failed to parse, per
    /// [`shell_arith::ParseError`].
    #[error("invalid arithmetic expression: {0}")]
    InvalidArithmeticExpression(String),
    /// Alias substitution exceeded the recursion limit.
    #[error("alias substitution did not terminate")]
    AliasRecursionLimit,
    /// A lexical error surfaced unchanged.
    #[error(transparent)]
    Lex(#[from] LexErrorKind),
}

impl SyntaxError {
    /// Whether this error means "the input ended while a construct was
    /// still open" rather than "the input so far is simply malformed" —
    /// the distinction `Parser::parse_line` needs to tell a caller "feed
    /// me another line" (continuation) apart from a hard syntax error
    /// (spec §4.D/§6, `parser_continuation_line`).
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            SyntaxError::UnterminatedEscape
                | SyntaxError::Lex(
                    LexErrorKind::UnterminatedQuote
                        | LexErrorKind::UnterminatedSubstitution
                        | LexErrorKind::UnterminatedParameterExpansion
                        | LexErrorKind::UnterminatedHereDoc
                )
        )
    }
}

/// A copy of [`LexError`]'s variants minus their location (already carried
/// by the enclosing [`Error`]), kept as its own type so [`SyntaxError`] can
/// derive `Eq` (ranges compare structurally and fine for that, but
/// `LexError` itself is not reused directly to avoid a cyclic `From`
/// needing the location twice).
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LexErrorKind {
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    #[error("backslash at end of input")]
    UnterminatedEscape,
    #[error("unterminated substitution")]
    UnterminatedSubstitution,
    #[error("unterminated parameter expansion")]
    UnterminatedParameterExpansion,
    #[error("unterminated here-document, delimiter never found")]
    UnterminatedHereDoc,
    #[error("alias substitution did not terminate")]
    AliasRecursionLimit,
    /// A `$(...)`/`` `...` `` body, once captured, failed to parse as a
    /// program in its own right.
    #[error("syntax error in command substitution: {0}")]
    NestedSyntaxError(String),
    #[error("i/o error: {0}")]
    Io(String),
}

impl SyntaxError {
    /// Splits a [`LexError`] into its [`SyntaxError`] equivalent and the
    /// location it occurred at, for wrapping into an [`Error`].
    #[must_use]
    pub fn from_lex_error(err: LexError) -> (SyntaxError, Range) {
        match err {
            LexError::UnterminatedQuote { location } => {
                (SyntaxError::Lex(LexErrorKind::UnterminatedQuote), location)
            }
            LexError::UnterminatedEscape { location } => {
                (SyntaxError::UnterminatedEscape, location)
            }
            LexError::UnterminatedSubstitution { location } => (
                SyntaxError::Lex(LexErrorKind::UnterminatedSubstitution),
                location,
            ),
            LexError::UnterminatedParameterExpansion { location } => (
                SyntaxError::Lex(LexErrorKind::UnterminatedParameterExpansion),
                location,
            ),
            LexError::UnterminatedHereDoc { location } => (
                SyntaxError::Lex(LexErrorKind::UnterminatedHereDoc),
                location,
            ),
            LexError::EmptyParameterName { location } => (SyntaxError::EmptyParam, location),
            LexError::AliasRecursionLimit { location } => {
                (SyntaxError::AliasRecursionLimit, location)
            }
            LexError::NestedSyntaxError { location, message } => (
                SyntaxError::Lex(LexErrorKind::NestedSyntaxError(message)),
                location,
            ),
            LexError::Io(message) => (
                SyntaxError::Lex(LexErrorKind::Io(message)),
                Range::invalid(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::pretty::Message;

    #[test]
    fn empty_param_message_matches_committed_title() {
        let error = Error {
            cause: SyntaxError::EmptyParam,
            location: Location::unknown(),
        };
        let message = Message::from(&error);
        assert_eq!(message.title, "a parameter expansion has no name");
    }
}
