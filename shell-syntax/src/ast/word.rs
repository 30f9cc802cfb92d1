//! Words: the unit of quoting and expansion.
//!
//! A [`Word`] is a sequence of [`WordPart`]s that together form one token
//! of the command line once expansion (field splitting, pathname
//! expansion, etc. — all out of this crate's scope) has been applied. This
//! mirrors `mrsh_word` and its five concrete subtypes
//! (`mrsh_word_string`/`_parameter`/`_command`/`_arithmetic`/`_list`) in
//! `mrsh.h`, folded into one Rust enum with `Box` children instead of
//! mrsh's tagged-union-by-embedding.

use super::command::Program;
use crate::source::Range;

/// How a `${...}` parameter expansion customizes its result.
///
/// Mirrors `mrsh_word_parameter_op`, minus `NONE` (represented here by
/// [`ParameterExpansion::op`] being `None`) and minus `LEADING_HASH` (split
/// out as [`ParameterExpansion::length`], since `${#name}` is a distinct
/// shape rather than an operator with an argument).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParameterOp {
    /// `${name-word}` / `${name:-word}`
    Minus,
    /// `${name=word}` / `${name:=word}`
    Equal,
    /// `${name?word}` / `${name:?word}`
    Question,
    /// `${name+word}` / `${name:+word}`
    Plus,
    /// `${name%word}`
    Percent,
    /// `${name%%word}`
    DPercent,
    /// `${name#word}`
    Hash,
    /// `${name##word}`
    DHash,
}

/// A `$name`, `${name}`, or `${name<op>word}` parameter expansion.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterExpansion {
    pub name: String,
    /// `${#name}`: yields the length of the parameter instead of its
    /// value. Mutually exclusive with `op` in well-formed input.
    pub length: bool,
    /// The customization operator, if any, plus whether a `:` preceded it
    /// (making the operator also treat an empty value as unset).
    pub op: Option<ParameterOp>,
    pub colon: bool,
    /// The operator's word argument, present iff `op.is_some()`.
    pub arg: Option<Box<Word>>,
    pub location: Range,
}

/// One piece of a [`Word`].
#[derive(Clone, Debug, PartialEq)]
pub enum WordPart {
    /// A literal run of characters, already unescaped.
    ///
    /// `single_quoted` records whether this run came from a `'...'`
    /// quoted string, in which no further expansion ever applies to it —
    /// kept on the part (rather than inferred) because an unquoted literal
    /// and a single-quoted literal can otherwise look identical once
    /// escapes are resolved.
    String { value: String, single_quoted: bool },
    /// A parameter expansion: `$name`, `${name}`, `${name:-default}`, etc.
    Parameter(ParameterExpansion),
    /// A command substitution: `$(...)` or `` `...` ``.
    ///
    /// `program` is the fully parsed body, built by recursively invoking
    /// this crate's own parser on the captured substitution text (see
    /// `Lexer::scan_command_substitution`/`scan_backquoted`). An empty
    /// body (`$()`) parses to a `Program` with an empty `CommandList`
    /// rather than being represented specially.
    Command {
        program: Box<Program>,
        /// `true` for `` `command` ``, `false` for `$(command)`.
        back_quoted: bool,
        location: Range,
    },
    /// An arithmetic expansion: `$((...))`.
    ///
    /// `body` is kept as an unparsed [`Word`] (mrsh's own representation)
    /// rather than a `shell_arith::ArithmExpr`, because the text between
    /// `$((` and `))` is itself subject to parameter/command substitution
    /// *before* arithmetic parsing — the same two-pass structure POSIX
    /// specifies for arithmetic expansion, and the reason the arithmetic
    /// grammar lives in its own crate (see spec component E) rather than
    /// being parsed directly here.
    Arithmetic { body: Box<Word>, location: Range },
}

/// A sequence of [`WordPart`]s forming one token.
///
/// `double_quoted` is set on the parts of a word that were written between
/// `"..."`; unlike `'...'` this still permits parameter/command/arithmetic
/// expansion, it only suppresses field splitting and pathname expansion
/// downstream (out of this crate's scope), so it is tracked here purely so
/// a caller downstream of this crate can apply that suppression.
#[derive(Clone, Debug, PartialEq)]
pub struct Word {
    pub parts: Vec<WordPart>,
    pub double_quoted: bool,
    pub location: Range,
}

impl Word {
    /// An empty word with [`Range::invalid`] location, useful when
    /// building a word programmatically rather than from source text.
    #[must_use]
    pub fn empty() -> Self {
        Word {
            parts: Vec::new(),
            double_quoted: false,
            location: Range::invalid(),
        }
    }

    /// If this word is exactly one unquoted [`WordPart::String`], returns
    /// its value. Used to recognize reserved words and alias candidates,
    /// which must be plain, unexpandable text (per spec §4.A/§6 — a
    /// reserved word loses its special meaning the moment any part of it
    /// is quoted or substituted).
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [WordPart::String {
                value,
                single_quoted: false,
            }] => Some(value),
            _ => None,
        }
    }

    /// Resolves this word as a here-document delimiter: the concatenated
    /// text of its literal parts, plus whether any part of it was quoted.
    /// An unquoted delimiter's body still undergoes parameter/command/
    /// arithmetic expansion; a quoted one does not (POSIX quote removal on
    /// the delimiter only turns *off* that expansion, it does not require
    /// the whole word to be one single- or double-quoted run). `None` if
    /// the word contains a parameter, command, or arithmetic expansion —
    /// those can never appear in a delimiter.
    #[must_use]
    pub fn as_heredoc_delimiter(&self) -> Option<(String, bool)> {
        let mut text = String::new();
        let mut quoted = self.double_quoted;
        for part in &self.parts {
            match part {
                WordPart::String {
                    value,
                    single_quoted,
                } => {
                    text.push_str(value);
                    quoted |= *single_quoted;
                }
                _ => return None,
            }
        }
        Some((text, quoted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_literal_recognizes_single_unquoted_string_part() {
        let word = Word {
            parts: vec![WordPart::String {
                value: "if".to_owned(),
                single_quoted: false,
            }],
            double_quoted: false,
            location: Range::invalid(),
        };
        assert_eq!(word.as_literal(), Some("if"));
    }

    #[test]
    fn as_literal_rejects_single_quoted_part() {
        let word = Word {
            parts: vec![WordPart::String {
                value: "if".to_owned(),
                single_quoted: true,
            }],
            double_quoted: false,
            location: Range::invalid(),
        };
        assert_eq!(word.as_literal(), None);
    }

    #[test]
    fn as_literal_rejects_multi_part_word() {
        let word = Word {
            parts: vec![
                WordPart::String {
                    value: "a".to_owned(),
                    single_quoted: false,
                },
                WordPart::String {
                    value: "b".to_owned(),
                    single_quoted: false,
                },
            ],
            double_quoted: false,
            location: Range::invalid(),
        };
        assert_eq!(word.as_literal(), None);
    }

    #[test]
    fn heredoc_delimiter_concatenates_parts_and_tracks_quoting() {
        let unquoted = Word {
            parts: vec![WordPart::String {
                value: "EOF".to_owned(),
                single_quoted: false,
            }],
            double_quoted: false,
            location: Range::invalid(),
        };
        assert_eq!(
            unquoted.as_heredoc_delimiter(),
            Some(("EOF".to_owned(), false))
        );

        let quoted = Word {
            parts: vec![WordPart::String {
                value: "EOF".to_owned(),
                single_quoted: true,
            }],
            double_quoted: false,
            location: Range::invalid(),
        };
        assert_eq!(
            quoted.as_heredoc_delimiter(),
            Some(("EOF".to_owned(), true))
        );
    }

    #[test]
    fn heredoc_delimiter_rejects_expansion_parts() {
        let word = Word {
            parts: vec![WordPart::Parameter(ParameterExpansion {
                name: "x".to_owned(),
                length: false,
                op: None,
                colon: false,
                arg: None,
                location: Range::invalid(),
            })],
            double_quoted: false,
            location: Range::invalid(),
        };
        assert_eq!(word.as_heredoc_delimiter(), None);
    }
}
