//! Turning a byte stream into [`Token`]s.
//!
//! This is the Rust counterpart of mrsh's hand-rolled lexer embedded in
//! its parser object (`mrsh_parser` owns both the buffer and the lexing
//! state), reworked into a standalone [`Lexer`] that the parser drives one
//! token at a time. Word scanning (quoting, escapes, parameter/command/
//! arithmetic substitution) and alias substitution (component C) both live
//! here, since both operate below the level of whole tokens.

pub mod token;

use crate::alias::Glossary;
use crate::ast::{ParameterExpansion, ParameterOp, Program, Word, WordPart};
use crate::buffer::SourceBuffer;
use crate::parser::{Config, Parser};
use crate::source::{Location, Position, Range, Source};
use std::rc::Rc;
pub use token::{Operator, Token, TokenKind};

/// Maximum alias-substitution recursion depth before giving up, the same
/// safeguard mrsh applies via its `mrsh_parser::alias_expansion` loop
/// guard: without it, `alias ls=ls` would substitute forever.
const MAX_ALIAS_DEPTH: usize = 64;

/// Whether the lexer is at a position where, grammatically, the next word
/// could still be a reserved word or an alias candidate (spec §4.A: only
/// the first word of a command, or the word after certain reserved words,
/// counts).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WordContext {
    /// An ordinary argument word: no alias or reserved-word recognition.
    Argument,
    /// The first word of a new command: both alias and reserved-word
    /// recognition apply.
    CommandName,
}

/// One input source spliced into the token stream: either the lexer's
/// original buffer, or replacement text pushed in front of it by an
/// alias substitution (spec §4.C: "the alias text is pushed as a new
/// input layer in front of the current input; re-scan proceeds from
/// there").
struct Layer {
    buffer: SourceBuffer,
    source: Rc<Source>,
    position: Position,
    /// The alias name this layer expanded, so [`Lexer::pop_exhausted_layers`]
    /// can remove it from `expanding` once this layer has nothing left to
    /// give — not when the replacement's first token is produced, but
    /// only once the whole replacement has actually been scanned, the way
    /// a real layer of pushed-back input would behave.
    alias_name: Option<String>,
}

/// Scans tokens out of a [`SourceBuffer`], substituting aliases as it
/// goes.
pub struct Lexer<'a> {
    /// Stack of active input layers; `layers[0]` is the lexer's own
    /// buffer and is never popped. The last entry is read from first;
    /// once it runs dry it is popped and reading falls through to the
    /// layer beneath, so a word (or any other token) can span the
    /// boundary between alias-replacement text and whatever follows it
    /// in the original input.
    layers: Vec<Layer>,
    glossary: Option<&'a dyn Glossary>,
    /// Names currently being expanded, to refuse re-expanding an alias
    /// into itself even indirectly (`alias a=b; alias b=a`).
    expanding: Vec<String>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(buffer: SourceBuffer, source: Source) -> Self {
        Lexer {
            layers: vec![Layer {
                buffer,
                source: Rc::new(source),
                position: Position::start(),
                alias_name: None,
            }],
            glossary: None,
            expanding: Vec::new(),
        }
    }

    /// Installs the alias table this lexer consults for command-name
    /// words.
    pub fn set_glossary(&mut self, glossary: &'a dyn Glossary) {
        self.glossary = Some(glossary);
    }

    fn here(&self) -> Position {
        self.layers.last().expect("base layer always present").position
    }

    /// Pops any layer at the top of the stack (other than the base
    /// layer) whose buffer has no more bytes left to give, removing the
    /// alias name it was guarding against recursive re-expansion.
    fn pop_exhausted_layers(&mut self) -> std::io::Result<()> {
        while self.layers.len() > 1 {
            let exhausted = self
                .layers
                .last_mut()
                .expect("just checked len > 1")
                .buffer
                .peek_byte()?
                .is_none();
            if !exhausted {
                break;
            }
            let layer = self.layers.pop().expect("just checked len > 1");
            if let Some(name) = layer.alias_name {
                if let Some(pos) = self.expanding.iter().rposition(|n| *n == name) {
                    self.expanding.remove(pos);
                }
            }
        }
        Ok(())
    }

    fn advance_byte(&mut self) -> std::io::Result<Option<u8>> {
        self.pop_exhausted_layers()?;
        let layer = self.layers.last_mut().expect("base layer always present");
        let byte = layer.buffer.advance()?;
        if let Some(b) = byte {
            layer.position = layer.position.advance(b);
        }
        Ok(byte)
    }

    fn peek_byte(&mut self) -> std::io::Result<Option<u8>> {
        self.pop_exhausted_layers()?;
        self.layers
            .last_mut()
            .expect("base layer always present")
            .buffer
            .peek_byte()
    }

    /// Looks `n` bytes ahead, transparently continuing into the layer
    /// beneath the top one if the top does not have enough bytes left
    /// (e.g. peeking past the last byte of an alias replacement at a
    /// multi-byte operator boundary).
    fn peek_at(&mut self, n: usize) -> std::io::Result<Option<u8>> {
        self.pop_exhausted_layers()?;
        let mut offset = n;
        for idx in (0..self.layers.len()).rev() {
            let available = self.layers[idx].buffer.peek(offset + 1)?;
            if offset < available.len() {
                return Ok(Some(available[offset]));
            }
            offset -= available.len();
        }
        Ok(None)
    }

    fn location(&self, begin: Position, end: Position) -> Location {
        Location {
            range: Range { begin, end },
            source: Rc::clone(&self.layers.last().expect("base layer always present").source),
        }
    }

    /// Skips blanks (spaces and tabs) and, if present, a `#` comment to
    /// end of line. Does not skip newlines: a newline is itself a
    /// significant token.
    fn skip_blanks_and_comment(&mut self) -> std::io::Result<()> {
        loop {
            match self.peek_byte()? {
                Some(b' ') | Some(b'\t') => {
                    self.advance_byte()?;
                }
                Some(b'#') => {
                    while !matches!(self.peek_byte()?, None | Some(b'\n')) {
                        self.advance_byte()?;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Whether the byte at the read cursor can start or continue an
    /// unquoted word (i.e. is not blank, newline, or a special operator
    /// character).
    fn is_word_byte(b: u8) -> bool {
        !matches!(
            b,
            b' ' | b'\t' | b'\n' | b'&' | b';' | b'|' | b'(' | b')' | b'{' | b'}' | b'<' | b'>'
        )
    }

    /// Scans the next token.
    pub fn next_token(&mut self, context: WordContext) -> Result<Token, LexError> {
        self.skip_blanks_and_comment()
            .map_err(|e| LexError::Io(e.to_string()))?;
        let begin = self.here();
        let Some(b) = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? else {
            return Ok(Token {
                kind: TokenKind::EndOfInput,
                location: self.location(begin, begin).range,
            });
        };

        if b == b'\n' {
            self.advance_byte().ok();
            return Ok(Token {
                kind: TokenKind::Newline,
                location: self.location(begin, self.here()).range,
            });
        }

        if let Some(op) = self.try_scan_operator()? {
            return Ok(Token {
                kind: TokenKind::Operator(op),
                location: self.location(begin, self.here()).range,
            });
        }

        if matches!(b, b'!' | b'(' | b')' | b'{' | b'}') {
            self.advance_byte().ok();
            let op = match b {
                b'!' => Operator::Bang,
                b'(' => Operator::LParen,
                b')' => Operator::RParen,
                b'{' => Operator::LBrace,
                _ => Operator::RBrace,
            };
            return Ok(Token {
                kind: TokenKind::Operator(op),
                location: self.location(begin, self.here()).range,
            });
        }

        let word = self.scan_word(begin)?;
        if let Some(n) = as_io_number(&word) {
            if matches!(
                self.peek_byte().map_err(|e| LexError::Io(e.to_string()))?,
                Some(b'<') | Some(b'>')
            ) {
                return Ok(Token {
                    kind: TokenKind::IoNumber(n),
                    location: word.location,
                });
            }
        }
        if let Some(layer) = self.prepare_alias_expansion(&word, context)? {
            self.layers.push(layer);
            // The replacement text is now the top input layer; re-scan
            // picks up its first token (which may itself be a reserved
            // word, an operator, or another alias) in place of the
            // literal word just read. Later calls to `next_token` keep
            // consuming this layer — and, once it runs dry, fall through
            // to whatever follows in the layer beneath it — so a
            // multi-word replacement like `alias ll='ls -l'` contributes
            // all of its words, not just the first.
            return self.next_token(context);
        }
        let location = word.location;
        Ok(Token {
            kind: TokenKind::Word(word),
            location,
        })
    }

    /// Tries to scan a multi-character operator starting at the read
    /// cursor via maximal munch, leaving the cursor untouched if the next
    /// bytes do not form one.
    fn try_scan_operator(&mut self) -> Result<Option<Operator>, LexError> {
        let b0 = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))?;
        let b1 = self.peek_at(1).map_err(|e| LexError::Io(e.to_string()))?;
        let (op, len) = match (b0, b1) {
            (Some(b'&'), Some(b'&')) => (Operator::AmpAmp, 2),
            (Some(b'&'), _) => (Operator::Amp, 1),
            (Some(b';'), Some(b';')) => (Operator::SemiSemi, 2),
            (Some(b';'), _) => (Operator::Semi, 1),
            (Some(b'|'), Some(b'|')) => (Operator::PipePipe, 2),
            (Some(b'|'), _) => (Operator::Pipe, 1),
            (Some(b'<'), Some(b'<')) => {
                if self.peek_at(2).map_err(|e| LexError::Io(e.to_string()))? == Some(b'-') {
                    (Operator::DLessDash, 3)
                } else {
                    (Operator::DLess, 2)
                }
            }
            (Some(b'<'), Some(b'&')) => (Operator::LessAnd, 2),
            (Some(b'<'), Some(b'>')) => (Operator::LessGreat, 2),
            (Some(b'<'), _) => (Operator::Less, 1),
            (Some(b'>'), Some(b'>')) => (Operator::DGreat, 2),
            (Some(b'>'), Some(b'&')) => (Operator::GreatAnd, 2),
            (Some(b'>'), Some(b'|')) => (Operator::Clobber, 2),
            (Some(b'>'), _) => (Operator::Great, 1),
            _ => return Ok(None),
        };
        for _ in 0..len {
            self.advance_byte().map_err(|e| LexError::Io(e.to_string()))?;
        }
        Ok(Some(op))
    }

    /// Scans one word, handling quoting, escapes, and `$`/`` ` `` based
    /// substitutions, up to (but not including) the next blank, newline,
    /// or operator character outside any quoting context.
    fn scan_word(&mut self, begin: Position) -> Result<Word, LexError> {
        let mut parts: Vec<WordPart> = Vec::new();
        let mut current = String::new();
        let mut any_double_quoted = false;

        loop {
            let Some(b) = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? else {
                break;
            };
            match b {
                b'\'' => {
                    self.advance_byte().ok();
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    let literal = self.scan_single_quoted()?;
                    parts.push(WordPart::String {
                        value: literal,
                        single_quoted: true,
                    });
                }
                b'"' => {
                    self.advance_byte().ok();
                    any_double_quoted = true;
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    self.scan_double_quoted(&mut parts)?;
                }
                b'\\' => {
                    self.advance_byte().ok();
                    match self.advance_byte().map_err(|e| LexError::Io(e.to_string()))? {
                        Some(escaped) => current.push(escaped as char),
                        None => {
                            return Err(LexError::UnterminatedEscape {
                                location: self.location(begin, self.here()).range,
                            })
                        }
                    }
                }
                b'$' => {
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    parts.push(self.scan_dollar()?);
                }
                b'`' => {
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    parts.push(self.scan_backquoted()?);
                }
                b if Self::is_word_byte(b) => {
                    self.advance_byte().ok();
                    current.push(b as char);
                }
                _ => break,
            }
        }

        if !current.is_empty() {
            parts.push(WordPart::String {
                value: current,
                single_quoted: false,
            });
        }

        Ok(Word {
            parts,
            double_quoted: any_double_quoted,
            location: Range {
                begin,
                end: self.here(),
            },
        })
    }

    fn scan_single_quoted(&mut self) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.advance_byte().map_err(|e| LexError::Io(e.to_string()))? {
                Some(b'\'') => return Ok(s),
                Some(b) => s.push(b as char),
                None => {
                    return Err(LexError::UnterminatedQuote {
                        location: self.location(self.here(), self.here()).range,
                    })
                }
            }
        }
    }

    fn scan_double_quoted(&mut self, parts: &mut Vec<WordPart>) -> Result<(), LexError> {
        let mut current = String::new();
        loop {
            let Some(b) = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? else {
                return Err(LexError::UnterminatedQuote {
                    location: self.location(self.here(), self.here()).range,
                });
            };
            match b {
                b'"' => {
                    self.advance_byte().ok();
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    return Ok(());
                }
                b'\\' => {
                    self.advance_byte().ok();
                    if let Some(escaped) =
                        self.advance_byte().map_err(|e| LexError::Io(e.to_string()))?
                    {
                        if matches!(escaped, b'$' | b'`' | b'"' | b'\\' | b'\n') {
                            if escaped != b'\n' {
                                current.push(escaped as char);
                            }
                        } else {
                            current.push('\\');
                            current.push(escaped as char);
                        }
                    }
                }
                b'$' => {
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    parts.push(self.scan_dollar()?);
                }
                b'`' => {
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    parts.push(self.scan_backquoted()?);
                }
                _ => {
                    self.advance_byte().ok();
                    current.push(b as char);
                }
            }
        }
    }

    /// Scans a `$...` form: `$name`, `${...}`, `$(...)`, or `$((...))`.
    fn scan_dollar(&mut self) -> Result<WordPart, LexError> {
        let begin = self.here();
        self.advance_byte().ok(); // consume '$'
        match self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? {
            Some(b'{') => self.scan_braced_parameter(begin),
            Some(b'(') => {
                if self.peek_at(1).map_err(|e| LexError::Io(e.to_string()))? == Some(b'(') {
                    self.scan_arithmetic_expansion(begin)
                } else {
                    self.scan_command_substitution(begin)
                }
            }
            Some(b) if b.is_ascii_digit() || matches!(b, b'?' | b'$' | b'#' | b'@' | b'*' | b'!' | b'-') => {
                self.advance_byte().ok();
                Ok(WordPart::Parameter(ParameterExpansion {
                    name: (b as char).to_string(),
                    length: false,
                    op: None,
                    colon: false,
                    arg: None,
                    location: Range {
                        begin,
                        end: self.here(),
                    },
                }))
            }
            Some(b) if is_name_start(b) => {
                let name = self.scan_name()?;
                Ok(WordPart::Parameter(ParameterExpansion {
                    name,
                    length: false,
                    op: None,
                    colon: false,
                    arg: None,
                    location: Range {
                        begin,
                        end: self.here(),
                    },
                }))
            }
            _ => Ok(WordPart::String {
                value: "$".to_owned(),
                single_quoted: false,
            }),
        }
    }

    fn scan_name(&mut self) -> Result<String, LexError> {
        let mut name = String::new();
        while let Some(b) = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? {
            if is_name_byte(b) {
                self.advance_byte().ok();
                name.push(b as char);
            } else {
                break;
            }
        }
        Ok(name)
    }

    fn scan_braced_parameter(&mut self, begin: Position) -> Result<WordPart, LexError> {
        self.advance_byte().ok(); // consume '{'
        let length = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? == Some(b'#')
            && !matches!(
                self.peek_at(1).map_err(|e| LexError::Io(e.to_string()))?,
                None | Some(b'}')
            );
        if length {
            self.advance_byte().ok();
        }
        let name = self.scan_name()?;
        if name.is_empty() && !length {
            return Err(LexError::EmptyParameterName {
                location: self.location(begin, self.here()).range,
            });
        }
        let colon = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? == Some(b':');
        if colon {
            self.advance_byte().ok();
        }
        let op = match self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? {
            Some(b'-') => Some(ParameterOp::Minus),
            Some(b'=') => Some(ParameterOp::Equal),
            Some(b'?') => Some(ParameterOp::Question),
            Some(b'+') => Some(ParameterOp::Plus),
            Some(b'%') => {
                self.advance_byte().ok();
                if self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? == Some(b'%') {
                    self.advance_byte().ok();
                    Some(ParameterOp::DPercent)
                } else {
                    return self.finish_braced_parameter(begin, name, length, colon, Some(ParameterOp::Percent));
                }
            }
            Some(b'#') => {
                self.advance_byte().ok();
                if self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? == Some(b'#') {
                    self.advance_byte().ok();
                    Some(ParameterOp::DHash)
                } else {
                    return self.finish_braced_parameter(begin, name, length, colon, Some(ParameterOp::Hash));
                }
            }
            _ => None,
        };
        if matches!(
            op,
            Some(ParameterOp::Minus | ParameterOp::Equal | ParameterOp::Question | ParameterOp::Plus)
        ) {
            self.advance_byte().ok();
        }
        self.finish_braced_parameter(begin, name, length, colon, op)
    }

    fn finish_braced_parameter(
        &mut self,
        begin: Position,
        name: String,
        length: bool,
        colon: bool,
        op: Option<ParameterOp>,
    ) -> Result<WordPart, LexError> {
        let arg = if op.is_some() {
            let mut parts = Vec::new();
            let mut current = String::new();
            loop {
                match self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? {
                    Some(b'}') | None => break,
                    Some(b'$') => {
                        if !current.is_empty() {
                            parts.push(WordPart::String {
                                value: std::mem::take(&mut current),
                                single_quoted: false,
                            });
                        }
                        parts.push(self.scan_dollar()?);
                    }
                    Some(b) => {
                        self.advance_byte().ok();
                        current.push(b as char);
                    }
                }
            }
            if !current.is_empty() {
                parts.push(WordPart::String {
                    value: current,
                    single_quoted: false,
                });
            }
            Some(Box::new(Word {
                parts,
                double_quoted: false,
                location: Range {
                    begin,
                    end: self.here(),
                },
            }))
        } else {
            None
        };
        match self.advance_byte().map_err(|e| LexError::Io(e.to_string()))? {
            Some(b'}') => {}
            _ => {
                return Err(LexError::UnterminatedParameterExpansion {
                    location: self.location(begin, self.here()).range,
                })
            }
        }
        Ok(WordPart::Parameter(ParameterExpansion {
            name,
            length,
            op,
            colon,
            arg,
            location: Range {
                begin,
                end: self.here(),
            },
        }))
    }

    fn scan_command_substitution(&mut self, begin: Position) -> Result<WordPart, LexError> {
        self.advance_byte().ok(); // consume '('
        let body = self.capture_substitution_body(begin)?;
        let end = self.here();
        let original = self.location(begin, end);
        let program = parse_nested_program(self.glossary, body, original)?;
        Ok(WordPart::Command {
            program: Box::new(program),
            back_quoted: false,
            location: Range { begin, end },
        })
    }

    /// Captures the raw text between the just-consumed opening `(` of a
    /// `$(...)` and its matching `)`, honoring quoting and nested
    /// `$(...)`/`` `...` `` so an unquoted `)` inside a quoted string or a
    /// nested substitution never closes this one prematurely. Reuses the
    /// ordinary quote/substitution scanners for the skipping itself,
    /// re-escaping double-quoted text before appending it so the captured
    /// body reparses to the same tree once handed to a fresh [`Parser`]
    /// (plain scanned values have already had their own escapes resolved,
    /// so appending them verbatim would let a literal `\$`, say, reappear
    /// as a live `$` on the second pass).
    fn capture_substitution_body(&mut self, begin: Position) -> Result<String, LexError> {
        let mut depth = 0u32;
        let mut body = String::new();
        loop {
            let Some(b) = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? else {
                return Err(LexError::UnterminatedSubstitution {
                    location: self.location(begin, self.here()).range,
                });
            };
            match b {
                b'(' => {
                    self.advance_byte().ok();
                    depth += 1;
                    body.push('(');
                }
                b')' => {
                    self.advance_byte().ok();
                    if depth == 0 {
                        return Ok(body);
                    }
                    depth -= 1;
                    body.push(')');
                }
                b'\'' => {
                    self.advance_byte().ok();
                    let literal = self.scan_single_quoted()?;
                    body.push('\'');
                    body.push_str(&literal);
                    body.push('\'');
                }
                b'"' => {
                    self.advance_byte().ok();
                    let mut parts = Vec::new();
                    self.scan_double_quoted(&mut parts)?;
                    body.push('"');
                    for part in &parts {
                        match part {
                            WordPart::String { value, .. } => {
                                body.push_str(&escape_for_double_quotes(value));
                            }
                            other => body.push_str(&other.to_string()),
                        }
                    }
                    body.push('"');
                }
                b'$' => {
                    let part = self.scan_dollar()?;
                    body.push_str(&part.to_string());
                }
                b'`' => {
                    let part = self.scan_backquoted()?;
                    body.push_str(&part.to_string());
                }
                b'\\' => {
                    self.advance_byte().ok();
                    body.push('\\');
                    if let Some(escaped) =
                        self.advance_byte().map_err(|e| LexError::Io(e.to_string()))?
                    {
                        body.push(escaped as char);
                    }
                }
                _ => {
                    self.advance_byte().ok();
                    body.push(b as char);
                }
            }
        }
    }

    fn scan_arithmetic_expansion(&mut self, begin: Position) -> Result<WordPart, LexError> {
        self.advance_byte().ok(); // first '('
        self.advance_byte().ok(); // second '('
        let mut depth = 1usize;
        let mut body = String::new();
        loop {
            let b = self.advance_byte().map_err(|e| LexError::Io(e.to_string()))?;
            match b {
                Some(b'(') => {
                    depth += 1;
                    body.push('(');
                }
                Some(b')') => {
                    if self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? == Some(b')') && depth == 1 {
                        self.advance_byte().ok();
                        break;
                    }
                    depth -= 1;
                    body.push(')');
                }
                Some(b) => body.push(b as char),
                None => {
                    return Err(LexError::UnterminatedSubstitution {
                        location: self.location(begin, self.here()).range,
                    })
                }
            }
        }
        let inner_location = Range {
            begin,
            end: self.here(),
        };
        Ok(WordPart::Arithmetic {
            body: Box::new(Word {
                parts: vec![WordPart::String {
                    value: body,
                    single_quoted: false,
                }],
                double_quoted: false,
                location: inner_location,
            }),
            location: inner_location,
        })
    }

    /// Scans `` `...` ``. Per POSIX, only `` \` ``, `\$`, and `\\` are
    /// unescaped inside a backquoted substitution; any other
    /// backslash-escaped character keeps its backslash.
    fn scan_backquoted(&mut self) -> Result<WordPart, LexError> {
        let begin = self.here();
        self.advance_byte().ok(); // consume opening '`'
        let mut body = String::new();
        loop {
            match self.advance_byte().map_err(|e| LexError::Io(e.to_string()))? {
                Some(b'`') => break,
                Some(b'\\') => {
                    match self.advance_byte().map_err(|e| LexError::Io(e.to_string()))? {
                        Some(escaped) if matches!(escaped, b'\\' | b'`' | b'$') => {
                            body.push(escaped as char);
                        }
                        Some(escaped) => {
                            body.push('\\');
                            body.push(escaped as char);
                        }
                        None => {
                            return Err(LexError::UnterminatedSubstitution {
                                location: self.location(begin, self.here()).range,
                            })
                        }
                    }
                }
                Some(b) => body.push(b as char),
                None => {
                    return Err(LexError::UnterminatedSubstitution {
                        location: self.location(begin, self.here()).range,
                    })
                }
            }
        }
        let end = self.here();
        let original = self.location(begin, end);
        let program = parse_nested_program(self.glossary, body, original)?;
        Ok(WordPart::Command {
            program: Box::new(program),
            back_quoted: true,
            location: Range { begin, end },
        })
    }

    /// Reads a here-document body following a `<<`/`<<-` redirect, up to
    /// (and consuming) its delimiter line.
    ///
    /// Called once the read cursor is already positioned right after the
    /// newline that ends the *entire* current input line — see
    /// `Parser::parse_simple_command_or_function_definition`, which
    /// collects every `<<`/`<<-` on a simple command before resolving any
    /// of their bodies, so `cmd <<A <<B` reads `A`'s body then `B`'s body
    /// in declaration order, each starting where the previous left off.
    ///
    /// `quoted` controls whether the body is expansion-aware: an unquoted
    /// delimiter (`<<EOF`) still allows parameter/command/arithmetic
    /// expansion inside the body, same as a double-quoted string; a quoted
    /// delimiter (`<<'EOF'`) makes the body fully literal.
    pub fn read_heredoc_body(
        &mut self,
        delimiter: &str,
        strip_tabs: bool,
        quoted: bool,
        delimiter_location: Location,
    ) -> Result<Vec<WordPart>, LexError> {
        let begin = self.here();
        let mut raw = String::new();
        loop {
            let Some(line) = self.read_raw_line()? else {
                return Err(LexError::UnterminatedHereDoc {
                    location: self.location(begin, self.here()).range,
                });
            };
            let candidate = if strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line.as_str()
            };
            if candidate == delimiter {
                break;
            }
            let content = if strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line.as_str()
            };
            raw.push_str(content);
            raw.push('\n');
        }
        if quoted {
            return Ok(vec![WordPart::String {
                value: raw,
                single_quoted: false,
            }]);
        }
        let mut scratch = Lexer::new(
            SourceBuffer::from_static(raw),
            Source::HereDoc {
                delimiter: delimiter_location,
            },
        );
        scratch.scan_heredoc_content()
    }

    /// Scans a here-document body for an unquoted delimiter: like
    /// [`Self::scan_double_quoted`], parameter/command/arithmetic
    /// expansions are recognized and `"` has no special meaning, but
    /// unlike a double-quoted string, only `\$`, `` \` ``, `\\`, and a
    /// trailing backslash-newline (removed as a line splice) are
    /// unescaped — any other backslash stays in the body verbatim.
    fn scan_heredoc_content(&mut self) -> Result<Vec<WordPart>, LexError> {
        let mut parts = Vec::new();
        let mut current = String::new();
        loop {
            let Some(b) = self.peek_byte().map_err(|e| LexError::Io(e.to_string()))? else {
                break;
            };
            match b {
                b'\\' => {
                    self.advance_byte().ok();
                    match self.advance_byte().map_err(|e| LexError::Io(e.to_string()))? {
                        Some(b'\n') => {}
                        Some(escaped) if matches!(escaped, b'$' | b'`' | b'\\') => {
                            current.push(escaped as char);
                        }
                        Some(escaped) => {
                            current.push('\\');
                            current.push(escaped as char);
                        }
                        None => {}
                    }
                }
                b'$' => {
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    parts.push(self.scan_dollar()?);
                }
                b'`' => {
                    if !current.is_empty() {
                        parts.push(WordPart::String {
                            value: std::mem::take(&mut current),
                            single_quoted: false,
                        });
                    }
                    parts.push(self.scan_backquoted()?);
                }
                _ => {
                    self.advance_byte().ok();
                    current.push(b as char);
                }
            }
        }
        if !current.is_empty() {
            parts.push(WordPart::String {
                value: current,
                single_quoted: false,
            });
        }
        Ok(parts)
    }

    /// Reads one line (without its trailing newline), or `None` at end of
    /// input with nothing left to read.
    fn read_raw_line(&mut self) -> Result<Option<String>, LexError> {
        let mut line = String::new();
        let mut saw_any = false;
        loop {
            match self.advance_byte().map_err(|e| LexError::Io(e.to_string()))? {
                Some(b'\n') => {
                    saw_any = true;
                    break;
                }
                Some(b) => {
                    saw_any = true;
                    line.push(b as char);
                }
                None => break,
            }
        }
        if saw_any {
            Ok(Some(line))
        } else {
            Ok(None)
        }
    }

    /// If `word` is a plain literal naming a currently-defined alias, and
    /// we have not already expanded it on this same recursion chain,
    /// returns the new input [`Layer`] that splices its replacement text
    /// in front of the rest of the input. This is the Rust equivalent of
    /// `mrsh_parser`'s alias-substitution loop; [`MAX_ALIAS_DEPTH`] is the
    /// same backstop mrsh applies, here measured by stack depth rather
    /// than an explicit counter.
    ///
    /// Outside command-name position, substitution still happens for an
    /// alias marked [`Alias::global`] (the `alias -g` extension), matching
    /// `substitute_alias`'s own `is_command_name || alias.global` check;
    /// any other non-command-name word is left alone.
    fn prepare_alias_expansion(
        &mut self,
        word: &Word,
        context: WordContext,
    ) -> Result<Option<Layer>, LexError> {
        let Some(glossary) = self.glossary else {
            return Ok(None);
        };
        let Some(name) = word.as_literal() else {
            return Ok(None);
        };
        if self.expanding.iter().any(|n| n == name) {
            return Ok(None);
        }
        let Some(alias) = glossary.lookup(name) else {
            return Ok(None);
        };
        if context != WordContext::CommandName && !alias.global {
            return Ok(None);
        }
        if self.layers.len() - 1 >= MAX_ALIAS_DEPTH {
            return Err(LexError::AliasRecursionLimit {
                location: word.location,
            });
        }
        let name = name.to_owned();
        let original = self.location(word.location.begin, word.location.end);
        self.expanding.push(name.clone());
        Ok(Some(Layer {
            buffer: SourceBuffer::from_static(alias.replacement.clone()),
            source: Rc::new(Source::Alias {
                name: name.clone(),
                original,
            }),
            position: Position::start(),
            alias_name: Some(name),
        }))
    }
}

/// If `word` is an unquoted run of one or more ASCII digits and nothing
/// else, returns its value as the io-number candidate it would become if
/// immediately followed by `<` or `>` (checked by the caller).
fn as_io_number(word: &Word) -> Option<u32> {
    let [WordPart::String {
        value,
        single_quoted: false,
    }] = word.parts.as_slice()
    else {
        return None;
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Parses captured `$(...)`/`` `...` `` body text into a real [`Program`]
/// by recursively invoking this crate's own parser, the same glossary (if
/// any) applying inside the substitution as outside it. Grounded on the
/// same "push a fresh input layer and re-scan" idea as
/// `Lexer::prepare_alias_expansion`, except here the new layer is a whole
/// nested parse rather than a lexer-level splice, since a substitution's
/// body is a full program, not just more words.
fn parse_nested_program(
    glossary: Option<&dyn Glossary>,
    body: String,
    original: Location,
) -> Result<Program, LexError> {
    let config = match glossary {
        Some(g) => Config::new().aliases(g),
        None => Config::new(),
    };
    let source = Source::CommandSubstitution {
        original: original.clone(),
    };
    let mut parser = Parser::new(SourceBuffer::from_static(body), source, config);
    parser.parse_program().map_err(|err| LexError::NestedSyntaxError {
        location: original.range,
        message: err.to_string(),
    })
}

/// Re-escapes a scanned double-quoted literal's value so that splicing it
/// back into reconstructed source text and reparsing it reproduces the
/// same value, instead of letting a literal `\$`/`` \` ``/`\"`/`\\`
/// reappear as a live special character on the second pass.
fn escape_for_double_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '$' | '`' | '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// An error arising during lexical analysis, before the parser ever sees a
/// malformed token.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated quoted string")]
    UnterminatedQuote { location: Range },
    #[error("backslash at end of input")]
    UnterminatedEscape { location: Range },
    #[error("unterminated substitution")]
    UnterminatedSubstitution { location: Range },
    #[error("unterminated parameter expansion")]
    UnterminatedParameterExpansion { location: Range },
    #[error("unterminated here-document, delimiter never found")]
    UnterminatedHereDoc { location: Range },
    #[error("a parameter expansion has no name")]
    EmptyParameterName { location: Range },
    #[error("alias substitution did not terminate")]
    AliasRecursionLimit { location: Range },
    #[error("syntax error in command substitution: {message}")]
    NestedSyntaxError { location: Range, message: String },
    #[error("i/o error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::{Alias, AliasSet};

    fn lex_all(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(SourceBuffer::from_static(source), Source::CommandString);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token(WordContext::Argument).unwrap();
            let done = matches!(token.kind, TokenKind::EndOfInput);
            out.push(token.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_simple_words_and_operators() {
        let tokens = lex_all("echo hi && ls");
        assert!(matches!(&tokens[0], TokenKind::Word(w) if w.as_literal() == Some("echo")));
        assert!(matches!(&tokens[1], TokenKind::Word(w) if w.as_literal() == Some("hi")));
        assert!(matches!(tokens[2], TokenKind::Operator(Operator::AmpAmp)));
        assert!(matches!(&tokens[3], TokenKind::Word(w) if w.as_literal() == Some("ls")));
    }

    #[test]
    fn scans_single_and_double_quotes() {
        let mut lexer = Lexer::new(
            SourceBuffer::from_static("'a b'\"c$x\""),
            Source::CommandString,
        );
        let token = lexer.next_token(WordContext::Argument).unwrap();
        let TokenKind::Word(word) = token.kind else {
            panic!("expected word")
        };
        assert_eq!(word.parts.len(), 3);
        assert_eq!(
            word.parts[0],
            WordPart::String {
                value: "a b".to_owned(),
                single_quoted: true
            }
        );
    }

    #[test]
    fn scans_parameter_expansion_with_default() {
        let mut lexer = Lexer::new(
            SourceBuffer::from_static("${foo:-bar}"),
            Source::CommandString,
        );
        let token = lexer.next_token(WordContext::Argument).unwrap();
        let TokenKind::Word(word) = token.kind else {
            panic!("expected word")
        };
        let WordPart::Parameter(expansion) = &word.parts[0] else {
            panic!("expected parameter")
        };
        assert_eq!(expansion.name, "foo");
        assert_eq!(expansion.op, Some(ParameterOp::Minus));
        assert!(expansion.colon);
    }

    #[test]
    fn scans_arithmetic_expansion() {
        let mut lexer = Lexer::new(
            SourceBuffer::from_static("$((1+2*3))"),
            Source::CommandString,
        );
        let token = lexer.next_token(WordContext::Argument).unwrap();
        let TokenKind::Word(word) = token.kind else {
            panic!("expected word")
        };
        assert!(matches!(&word.parts[0], WordPart::Arithmetic { .. }));
    }

    #[test]
    fn alias_expansion_substitutes_command_name() {
        let mut set = AliasSet::new();
        set.insert(Alias {
            name: "ll".to_owned(),
            replacement: "ls -l".to_owned(),
            global: false,
            origin: Location::unknown(),
        });
        let mut lexer = Lexer::new(SourceBuffer::from_static("ll"), Source::CommandString);
        lexer.set_glossary(&set);
        let token = lexer.next_token(WordContext::CommandName).unwrap();
        let TokenKind::Word(word) = token.kind else {
            panic!("expected word")
        };
        assert_eq!(word.as_literal(), Some("ls"));
    }

    #[test]
    fn self_referential_alias_does_not_recurse_forever() {
        let mut set = AliasSet::new();
        set.insert(Alias {
            name: "ls".to_owned(),
            replacement: "ls -l".to_owned(),
            global: false,
            origin: Location::unknown(),
        });
        let mut lexer = Lexer::new(SourceBuffer::from_static("ls"), Source::CommandString);
        lexer.set_glossary(&set);
        let token = lexer.next_token(WordContext::CommandName).unwrap();
        let TokenKind::Word(word) = token.kind else {
            panic!("expected word")
        };
        assert_eq!(word.as_literal(), Some("ls"));
    }
}
