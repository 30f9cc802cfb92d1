//! Lexical token kinds.
//!
//! The lexer itself stays ignorant of reserved words (`if`, `do`, `esac`,
//! ...): like mrsh and POSIX's own grammar, whether a word token is
//! "really" a keyword depends on its position in the surrounding grammar
//! (`case esac` is a word, not the `esac` keyword, when unquoted as a
//! pattern's own text would require quoting anyway) so that recognition is
//! the parser's job (see [`crate::parser`]), not the lexer's.

use crate::ast::Word;
use crate::source::Range;

/// A control operator: punctuation with syntactic meaning recognized
/// directly by the lexer via maximal munch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    /// `&`
    Amp,
    /// `&&`
    AmpAmp,
    /// `;`
    Semi,
    /// `;;`
    SemiSemi,
    /// `|`
    Pipe,
    /// `||`
    PipePipe,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `!`
    Bang,
    /// `<`
    Less,
    /// `>`
    Great,
    /// `>>`
    DGreat,
    /// `<<`
    DLess,
    /// `<<-`
    DLessDash,
    /// `<&`
    LessAnd,
    /// `>&`
    GreatAnd,
    /// `<>`
    LessGreat,
    /// `>|`
    Clobber,
}

/// One lexical token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Word(Word),
    Operator(Operator),
    /// A run of digits immediately (no intervening blank) followed by `<`
    /// or `>`: the file descriptor number prefix of a redirection, per
    /// spec §4.C. Recognized only in that exact lexical position; a digit
    /// run followed by anything else is an ordinary [`TokenKind::Word`].
    IoNumber(u32),
    Newline,
    EndOfInput,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Range,
}
