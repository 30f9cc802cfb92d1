//! Recursive-descent parsing of the POSIX shell grammar.
//!
//! [`Parser`] drives a [`Lexer`] one token of lookahead at a time and
//! builds the [`ast`](crate::ast) types directly — there is no
//! intermediate parse tree, matching mrsh's own single-pass
//! `mrsh_parse_program`/`mrsh_parse_line`/`mrsh_parse_arithm_expr` API,
//! which this module's three entry points
//! ([`Parser::parse_program`], [`Parser::parse_line`],
//! [`Parser::parse_arithm_expr`]) mirror directly.

pub mod error;

use crate::alias::Glossary;
use crate::ast::{
    AndOrList, AndOrOp, Assignment, CaseItem, Command, CommandList, IoRedirect, Pipeline, Program,
    RedirectOp, Separator, Word, WordPart,
};
use crate::buffer::SourceBuffer;
use crate::lexer::{Lexer, Operator, Token, TokenKind, WordContext};
use crate::source::{Range, Source};
use error::{Error, SyntaxError};

/// Parser configuration: currently just the alias table consulted for
/// command-name words, mirroring `mrsh_parser_set_alias_func`. Built with
/// the chainable-setter pattern the teacher workspace uses for its own
/// `parser::Config`.
pub struct Config<'a> {
    glossary: Option<&'a dyn Glossary>,
}

impl<'a> Config<'a> {
    #[must_use]
    pub fn new() -> Self {
        Config { glossary: None }
    }

    #[must_use]
    pub fn aliases(mut self, glossary: &'a dyn Glossary) -> Self {
        self.glossary = Some(glossary);
        self
    }
}

impl<'a> Default for Config<'a> {
    fn default() -> Self {
        Config::new()
    }
}

/// The reserved words recognized in command-name position, per spec §4.A.
const KEYWORDS: &[&str] = &[
    "if", "then", "elif", "else", "fi", "for", "while", "until", "do", "done", "case", "esac",
    "in", "{", "}", "!",
];

fn is_keyword(word: &Word, text: &str) -> bool {
    word.as_literal() == Some(text)
}

/// Parses POSIX shell source text into an AST. Owns the [`Lexer`] that
/// supplies tokens and keeps one token of lookahead buffered.
///
/// Per spec §4.D/§7, this parser is fail-fast and sticky: once a parse
/// call returns an error, every later call returns that same error again
/// until [`Parser::reset`] is called, mirroring `mrsh_parser_error` /
/// `mrsh_parser_reset`.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
    error: Option<Error>,
    continuation_line: bool,
}

impl<'a> Parser<'a> {
    /// Creates a parser reading from `buffer`, whose text came from
    /// `source`.
    #[must_use]
    pub fn new(buffer: SourceBuffer, source: Source, config: Config<'a>) -> Self {
        let mut lexer = Lexer::new(buffer, source);
        if let Some(glossary) = config.glossary {
            lexer.set_glossary(glossary);
        }
        Parser {
            lexer,
            lookahead: None,
            error: None,
            continuation_line: false,
        }
    }

    /// The error recorded by the most recent failing parse call, if any
    /// (`mrsh_parser_error`). Cleared by [`Parser::reset`].
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Whether the most recent [`Parser::parse_line`] call ended inside an
    /// unterminated construct (open quote, here-document, substitution, or
    /// trailing `\`) rather than at a hard syntax error — the signal an
    /// interactive front-end uses to know it should read another line and
    /// try again (`mrsh_parser_continuation_line`, spec §4.A/§6, property
    /// P7).
    #[must_use]
    pub fn is_continuation_line(&self) -> bool {
        self.continuation_line
    }

    /// Whether the next token is end of input (`mrsh_parser_eof`).
    pub fn is_eof(&mut self) -> Result<bool, Error> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(matches!(
            self.peek(WordContext::CommandName)?.kind,
            TokenKind::EndOfInput
        ))
    }

    /// Clears a recorded error and any buffered lookahead token, allowing
    /// the parser to be used again (`mrsh_parser_reset`). Does not rewind
    /// the underlying buffer: a caller that wants to retry from scratch
    /// must supply a fresh [`Parser`] over the same source instead.
    pub fn reset(&mut self) {
        self.error = None;
        self.continuation_line = false;
        self.lookahead = None;
    }

    fn peek(&mut self, context: WordContext) -> Result<&Token, Error> {
        if self.lookahead.is_none() {
            let token = self.lex(context)?;
            self.lookahead = Some(token);
        }
        Ok(self.lookahead.as_ref().unwrap())
    }

    fn advance(&mut self, context: WordContext) -> Result<Token, Error> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.lex(context),
        }
    }

    fn lex(&mut self, context: WordContext) -> Result<Token, Error> {
        self.lexer.next_token(context).map_err(|err| {
            let (cause, location) = SyntaxError::from_lex_error(err);
            Error {
                cause,
                location: self.lexer_location(location),
            }
        })
    }

    fn lexer_location(&self, range: Range) -> crate::source::Location {
        crate::source::Location {
            range,
            source: std::rc::Rc::new(Source::Unknown),
        }
    }

    fn error_at(&self, cause: SyntaxError, range: Range) -> Error {
        Error {
            cause,
            location: self.lexer_location(range),
        }
    }

    /// Skips newline tokens (used between list items, where blank lines
    /// are insignificant).
    fn skip_newlines(&mut self, context: WordContext) -> Result<(), Error> {
        while matches!(self.peek(context)?.kind, TokenKind::Newline) {
            self.advance(context)?;
        }
        Ok(())
    }

    /// Entry point mirroring `mrsh_parse_program`: parses the entire input
    /// as one program.
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match self.parse_command_list(true) {
            Ok(body) => Ok(Program { body }),
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Entry point mirroring `mrsh_parse_line`: parses a single logical
    /// line (up to and including its terminating newline or end of
    /// input), useful for an interactive read-eval-print loop. Returns
    /// `Ok(None)` and sets [`Parser::is_continuation_line`] rather than
    /// erroring when the input ends inside an unterminated construct, so
    /// the caller can feed in another line and call again.
    pub fn parse_line(&mut self) -> Result<Option<CommandList>, Error> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match self.parse_command_list(true) {
            Ok(list) => {
                self.continuation_line = false;
                Ok(Some(list))
            }
            Err(err) if err.cause.is_incomplete() => {
                self.continuation_line = true;
                Ok(None)
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Whether the next token cannot start another and-or list in the
    /// current list, i.e. this list is finished. At the top level, only
    /// end of input closes a list; nested inside a compound command, a
    /// reserved closing keyword (or `}`/`)`/`;;`) closes it too.
    fn at_list_terminator(&mut self, top_level: bool) -> Result<bool, Error> {
        Ok(match &self.peek(WordContext::CommandName)?.kind {
            TokenKind::EndOfInput => true,
            TokenKind::Word(w) if !top_level => matches!(
                w.as_literal(),
                Some("then" | "elif" | "else" | "fi" | "do" | "done" | "esac")
            ),
            TokenKind::Operator(Operator::RBrace | Operator::RParen | Operator::SemiSemi)
                if !top_level =>
            {
                true
            }
            _ => false,
        })
    }

    fn parse_command_list(&mut self, top_level: bool) -> Result<CommandList, Error> {
        let begin = self.current_position(WordContext::CommandName)?;
        let mut items = Vec::new();
        self.skip_newlines(WordContext::CommandName)?;
        while !self.at_list_terminator(top_level)? {
            let and_or = self.parse_and_or()?;
            let separator = match self.peek(WordContext::Argument)?.kind {
                TokenKind::Operator(Operator::Amp) => {
                    self.advance(WordContext::Argument)?;
                    Separator::Background
                }
                TokenKind::Operator(Operator::Semi) => {
                    self.advance(WordContext::Argument)?;
                    Separator::Sequential
                }
                _ => Separator::Sequential,
            };
            items.push((and_or, separator));
            if matches!(
                self.peek(WordContext::CommandName)?.kind,
                TokenKind::Newline
            ) {
                self.skip_newlines(WordContext::CommandName)?;
            }
        }
        let end = self.current_position(WordContext::CommandName)?;
        Ok(CommandList {
            items,
            location: Range { begin, end },
        })
    }

    fn current_position(&mut self, context: WordContext) -> Result<crate::source::Position, Error> {
        Ok(self.peek(context)?.location.begin)
    }

    fn parse_and_or(&mut self) -> Result<AndOrList, Error> {
        let begin = self.current_position(WordContext::CommandName)?;
        let mut left = AndOrList::Pipeline(self.parse_pipeline()?);
        loop {
            let op = match self.peek(WordContext::CommandName)?.kind {
                TokenKind::Operator(Operator::AmpAmp) => AndOrOp::And,
                TokenKind::Operator(Operator::PipePipe) => AndOrOp::Or,
                _ => break,
            };
            self.advance(WordContext::CommandName)?;
            self.skip_newlines(WordContext::CommandName)?;
            let right = self.parse_pipeline()?;
            let end = right.location.end;
            left = AndOrList::BinOp {
                op,
                left: Box::new(left),
                right,
                location: Range { begin, end },
            };
        }
        Ok(left)
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, Error> {
        let begin = self.current_position(WordContext::CommandName)?;
        let bang = matches!(
            self.peek(WordContext::CommandName)?.kind,
            TokenKind::Operator(Operator::Bang)
        );
        if bang {
            self.advance(WordContext::CommandName)?;
        }
        let mut commands = vec![self.parse_command()?];
        loop {
            if !matches!(
                self.peek(WordContext::CommandName)?.kind,
                TokenKind::Operator(Operator::Pipe)
            ) {
                break;
            }
            self.advance(WordContext::CommandName)?;
            self.skip_newlines(WordContext::CommandName)?;
            commands.push(self.parse_command()?);
        }
        if commands.is_empty() {
            let end = self.current_position(WordContext::CommandName)?;
            return Err(self.error_at(SyntaxError::EmptyPipeline, Range { begin, end }));
        }
        let end = commands.last().unwrap().span_end();
        Ok(Pipeline {
            bang,
            commands,
            location: Range { begin, end },
        })
    }

    fn parse_command(&mut self) -> Result<Command, Error> {
        let token = self.peek(WordContext::CommandName)?.clone();
        match &token.kind {
            TokenKind::Word(word) if is_keyword(word, "if") => self.parse_if(),
            TokenKind::Word(word) if is_keyword(word, "for") => self.parse_for(),
            TokenKind::Word(word) if is_keyword(word, "while") => self.parse_loop(false),
            TokenKind::Word(word) if is_keyword(word, "until") => self.parse_loop(true),
            TokenKind::Word(word) if is_keyword(word, "case") => self.parse_case(),
            TokenKind::Operator(Operator::LBrace) => self.parse_brace_group(),
            TokenKind::Operator(Operator::LParen) => self.parse_subshell(),
            _ => self.parse_simple_command_or_function_definition(),
        }
    }

    fn expect_keyword(&mut self, text: &'static str) -> Result<Range, Error> {
        let token = self.advance(WordContext::CommandName)?;
        match &token.kind {
            TokenKind::Word(word) if is_keyword(word, text) => Ok(token.location),
            _ => Err(self.error_at(
                SyntaxError::MissingClosingKeyword { expected: text },
                token.location,
            )),
        }
    }

    fn expect_operator(&mut self, op: Operator) -> Result<Range, Error> {
        let token = self.advance(WordContext::CommandName)?;
        match &token.kind {
            TokenKind::Operator(found) if *found == op => Ok(token.location),
            _ => Err(self.error_at(SyntaxError::UnexpectedToken, token.location)),
        }
    }

    /// A `compound_list` used as a condition or clause body must contain
    /// at least one term (POSIX's `compound_list` production is never
    /// empty); `parse_command_list` itself accepts an empty list since it
    /// is also used for a bare program, where emptiness is fine.
    fn require_nonempty(&self, list: CommandList) -> Result<CommandList, Error> {
        if list.items.is_empty() {
            return Err(self.error_at(SyntaxError::MissingBody, list.location));
        }
        Ok(list)
    }

    fn parse_if(&mut self) -> Result<Command, Error> {
        let begin = self.expect_keyword("if")?.begin;
        let condition = self.parse_command_list(false)?;
        let condition = self.require_nonempty(condition)?;
        self.expect_keyword("then")?;
        let body = self.parse_command_list(false)?;
        let body = self.require_nonempty(body)?;
        let (else_part, end) = self.parse_else_tail()?;
        Ok(Command::If {
            condition,
            body,
            else_part,
            location: Range { begin, end },
        })
    }

    fn parse_else_tail(&mut self) -> Result<(Option<Box<Command>>, crate::source::Position), Error> {
        let token = self.peek(WordContext::CommandName)?.clone();
        match &token.kind {
            TokenKind::Word(word) if is_keyword(word, "elif") => {
                let begin = self.advance(WordContext::CommandName)?.location.begin;
                let condition = self.parse_command_list(false)?;
                let condition = self.require_nonempty(condition)?;
                self.expect_keyword("then")?;
                let body = self.parse_command_list(false)?;
                let body = self.require_nonempty(body)?;
                let (else_part, end) = self.parse_else_tail()?;
                Ok((
                    Some(Box::new(Command::If {
                        condition,
                        body,
                        else_part,
                        location: Range { begin, end },
                    })),
                    end,
                ))
            }
            TokenKind::Word(word) if is_keyword(word, "else") => {
                self.advance(WordContext::CommandName)?;
                let body = self.parse_command_list(false)?;
                let body = self.require_nonempty(body)?;
                let end = self.expect_keyword("fi")?.end;
                Ok((Some(Box::new(simple_wrapper(body))), end))
            }
            _ => {
                let end = self.expect_keyword("fi")?.end;
                Ok((None, end))
            }
        }
    }

    fn parse_for(&mut self) -> Result<Command, Error> {
        let begin = self.expect_keyword("for")?.begin;
        let name_token = self.advance(WordContext::Argument)?;
        let name = match &name_token.kind {
            TokenKind::Word(word) => match word.as_literal() {
                Some(literal) if is_valid_name(literal) => literal.to_owned(),
                _ => {
                    return Err(self.error_at(SyntaxError::InvalidLoopVariable, name_token.location))
                }
            },
            _ => return Err(self.error_at(SyntaxError::InvalidLoopVariable, name_token.location)),
        };
        self.skip_newlines(WordContext::CommandName)?;
        let values = if matches!(
            self.peek(WordContext::CommandName)?.kind,
            TokenKind::Word(ref w) if is_keyword(w, "in")
        ) {
            self.advance(WordContext::CommandName)?;
            let mut words = Vec::new();
            loop {
                match self.peek(WordContext::Argument)?.kind {
                    TokenKind::Word(_) => {
                        let token = self.advance(WordContext::Argument)?;
                        let TokenKind::Word(word) = token.kind else {
                            unreachable!()
                        };
                        words.push(word);
                    }
                    _ => break,
                }
            }
            Some(words)
        } else {
            None
        };
        self.skip_terminator()?;
        self.expect_keyword("do")?;
        let body = self.parse_command_list(false)?;
        let body = self.require_nonempty(body)?;
        let end = self.expect_keyword("done")?.end;
        Ok(Command::For {
            name,
            values,
            body,
            location: Range { begin, end },
        })
    }

    fn skip_terminator(&mut self) -> Result<(), Error> {
        match self.peek(WordContext::CommandName)?.kind {
            TokenKind::Operator(Operator::Semi) | TokenKind::Newline => {
                self.advance(WordContext::CommandName)?;
            }
            _ => {}
        }
        self.skip_newlines(WordContext::CommandName)?;
        Ok(())
    }

    fn parse_loop(&mut self, until: bool) -> Result<Command, Error> {
        let begin = self
            .expect_keyword(if until { "until" } else { "while" })?
            .begin;
        let condition = self.parse_command_list(false)?;
        let condition = self.require_nonempty(condition)?;
        self.expect_keyword("do")?;
        let body = self.parse_command_list(false)?;
        let body = self.require_nonempty(body)?;
        let end = self.expect_keyword("done")?.end;
        Ok(Command::Loop {
            until,
            condition,
            body,
            location: Range { begin, end },
        })
    }

    fn parse_case(&mut self) -> Result<Command, Error> {
        let begin = self.expect_keyword("case")?.begin;
        let word_token = self.advance(WordContext::Argument)?;
        let TokenKind::Word(word) = word_token.kind else {
            return Err(self.error_at(SyntaxError::UnexpectedToken, word_token.location));
        };
        self.skip_newlines(WordContext::CommandName)?;
        self.expect_keyword("in")?;
        self.skip_newlines(WordContext::CommandName)?;
        let mut items = Vec::new();
        while !matches!(
            self.peek(WordContext::CommandName)?.kind,
            TokenKind::Word(ref w) if is_keyword(w, "esac")
        ) {
            items.push(self.parse_case_item()?);
            self.skip_newlines(WordContext::CommandName)?;
        }
        let end = self.expect_keyword("esac")?.end;
        Ok(Command::Case {
            word,
            items,
            location: Range { begin, end },
        })
    }

    fn parse_case_item(&mut self) -> Result<CaseItem, Error> {
        let begin = self.current_position(WordContext::Argument)?;
        let leading_paren = matches!(
            self.peek(WordContext::Argument)?.kind,
            TokenKind::Operator(Operator::LParen)
        );
        if leading_paren {
            self.advance(WordContext::Argument)?;
        }
        let mut patterns = Vec::new();
        loop {
            let token = self.advance(WordContext::Argument)?;
            let TokenKind::Word(word) = token.kind else {
                return Err(self.error_at(SyntaxError::UnexpectedToken, token.location));
            };
            patterns.push(word);
            if matches!(
                self.peek(WordContext::Argument)?.kind,
                TokenKind::Operator(Operator::Pipe)
            ) {
                self.advance(WordContext::Argument)?;
            } else {
                break;
            }
        }
        self.expect_operator(Operator::RParen)?;
        self.skip_newlines(WordContext::CommandName)?;
        let body = self.parse_command_list(false)?;
        let end = match self.peek(WordContext::CommandName)?.kind {
            TokenKind::Operator(Operator::SemiSemi) => {
                self.advance(WordContext::CommandName)?.location.end
            }
            _ => self.current_position(WordContext::CommandName)?,
        };
        Ok(CaseItem {
            patterns,
            body,
            location: Range { begin, end },
        })
    }

    fn parse_brace_group(&mut self) -> Result<Command, Error> {
        let begin = self.expect_operator(Operator::LBrace)?.begin;
        let body = self.parse_command_list(false)?;
        let end = self.expect_operator(Operator::RBrace)?.end;
        Ok(Command::BraceGroup {
            body,
            location: Range { begin, end },
        })
    }

    fn parse_subshell(&mut self) -> Result<Command, Error> {
        let begin = self.expect_operator(Operator::LParen)?.begin;
        let body = self.parse_command_list(false)?;
        let end = self.expect_operator(Operator::RParen)?.end;
        Ok(Command::Subshell {
            body,
            location: Range { begin, end },
        })
    }

    fn parse_simple_command_or_function_definition(&mut self) -> Result<Command, Error> {
        let begin = self.current_position(WordContext::CommandName)?;
        let mut assignments = Vec::new();
        let mut words: Vec<Word> = Vec::new();
        let mut io_redirects = Vec::new();
        // Indices into `io_redirects` of `<<`/`<<-` redirects, resolved in
        // declaration order once this loop ends instead of right after
        // each delimiter is scanned — the only way `cmd <<A <<B` can give
        // `A` and `B` their correct, distinct bodies instead of the first
        // heredoc swallowing the rest of the line.
        let mut pending_heredocs: Vec<usize> = Vec::new();

        loop {
            let context = if words.is_empty() {
                WordContext::CommandName
            } else {
                WordContext::Argument
            };
            let kind = self.peek(context)?.kind.clone();
            match kind {
                TokenKind::Word(word) => {
                    if words.is_empty() {
                        if let Some(name) = assignment_name(&word) {
                            self.advance(context)?;
                            let value = assignment_value(&word);
                            assignments.push(Assignment {
                                name,
                                value,
                                location: word.location,
                            });
                            continue;
                        }
                    }
                    self.advance(context)?;
                    if words.is_empty()
                        && word
                            .as_literal()
                            .is_some_and(|literal| !is_reserved(literal))
                        && self.peek_is_lparen()
                    {
                        return self.parse_function_definition(word, begin);
                    }
                    words.push(word);
                }
                TokenKind::Operator(op)
                    if matches!(
                        op,
                        Operator::Less
                            | Operator::Great
                            | Operator::DGreat
                            | Operator::LessAnd
                            | Operator::GreatAnd
                            | Operator::LessGreat
                            | Operator::Clobber
                            | Operator::DLess
                            | Operator::DLessDash
                    ) =>
                {
                    let begin = self.current_position(context)?;
                    let redirect = self.parse_redirect_from(None, begin)?;
                    if matches!(redirect.op, RedirectOp::DLess | RedirectOp::DLessDash) {
                        pending_heredocs.push(io_redirects.len());
                    }
                    io_redirects.push(redirect);
                }
                TokenKind::IoNumber(n) => {
                    let number_begin = self.current_position(context)?;
                    self.advance(context)?;
                    let redirect = self.parse_redirect_from(Some(n), number_begin)?;
                    if matches!(redirect.op, RedirectOp::DLess | RedirectOp::DLessDash) {
                        pending_heredocs.push(io_redirects.len());
                    }
                    io_redirects.push(redirect);
                }
                _ => break,
            }
        }

        if assignments.is_empty() && words.is_empty() && io_redirects.is_empty() {
            let end = self.current_position(WordContext::Argument)?;
            return Err(self.error_at(SyntaxError::UnexpectedToken, Range { begin, end }));
        }

        if !pending_heredocs.is_empty() {
            // Whatever token comes next (most commonly the newline ending
            // this line) has already been lexed and buffered as
            // lookahead; discard it so the lexer's own read cursor, not
            // that buffered token, determines where the first heredoc
            // body starts.
            self.lookahead = None;
            for index in pending_heredocs {
                self.resolve_heredoc_body(&mut io_redirects, index)?;
            }
        }

        let end = self.current_position(WordContext::Argument)?;
        Ok(Command::Simple {
            assignments,
            words,
            io_redirects,
            location: Range { begin, end },
        })
    }

    fn resolve_heredoc_body(
        &mut self,
        io_redirects: &mut [IoRedirect],
        index: usize,
    ) -> Result<(), Error> {
        let redirect = &io_redirects[index];
        let delimiter_location = redirect.target.location;
        let Some((delimiter, quoted)) = redirect.target.as_heredoc_delimiter() else {
            return Err(self.error_at(SyntaxError::MissingRedirectTarget, delimiter_location));
        };
        let strip_tabs = matches!(redirect.op, RedirectOp::DLessDash);
        let parts = self
            .lexer
            .read_heredoc_body(
                &delimiter,
                strip_tabs,
                quoted,
                self.lexer_location(delimiter_location),
            )
            .map_err(|err| {
                let (cause, location) = SyntaxError::from_lex_error(err);
                self.error_at(cause, location)
            })?;
        io_redirects[index].here_doc_body = Some(Word {
            parts,
            double_quoted: false,
            location: delimiter_location,
        });
        Ok(())
    }

    fn peek_is_lparen(&mut self) -> bool {
        matches!(
            self.peek(WordContext::Argument),
            Ok(Token {
                kind: TokenKind::Operator(Operator::LParen),
                ..
            })
        )
    }

    fn parse_function_definition(
        &mut self,
        name_word: Word,
        begin: crate::source::Position,
    ) -> Result<Command, Error> {
        let name = name_word
            .as_literal()
            .map(str::to_owned)
            .unwrap_or_default();
        self.expect_operator(Operator::LParen)?;
        let close = self.advance(WordContext::Argument)?;
        if !matches!(close.kind, TokenKind::Operator(Operator::RParen)) {
            return Err(self.error_at(SyntaxError::InvalidFunctionDefinition, close.location));
        }
        self.skip_newlines(WordContext::CommandName)?;
        let body = self.parse_command()?;
        let end = body.span_end();
        Ok(Command::FunctionDefinition {
            name,
            body: Box::new(body),
            location: Range { begin, end },
        })
    }

    fn parse_redirect_from(
        &mut self,
        io_number: Option<u32>,
        begin: crate::source::Position,
    ) -> Result<IoRedirect, Error> {
        let token = self.advance(WordContext::Argument)?;
        let TokenKind::Operator(operator) = token.kind else {
            unreachable!()
        };
        let op = match operator {
            Operator::Less => RedirectOp::Less,
            Operator::Great => RedirectOp::Great,
            Operator::DGreat => RedirectOp::DGreat,
            Operator::LessAnd => RedirectOp::LessAnd,
            Operator::GreatAnd => RedirectOp::GreatAnd,
            Operator::LessGreat => RedirectOp::LessGreat,
            Operator::Clobber => RedirectOp::Clobber,
            Operator::DLess => RedirectOp::DLess,
            Operator::DLessDash => RedirectOp::DLessDash,
            _ => unreachable!(),
        };
        let target_token = self.advance(WordContext::Argument)?;
        let TokenKind::Word(target) = target_token.kind else {
            return Err(self.error_at(SyntaxError::MissingRedirectTarget, target_token.location));
        };
        // A `<<`/`<<-` target's body is filled in later, once every
        // redirect on this simple command has been parsed — see
        // `parse_simple_command_or_function_definition`.
        Ok(IoRedirect {
            io_number,
            op,
            target,
            here_doc_body: None,
            location: Range {
                begin,
                end: target_token.location.end,
            },
        })
    }

    /// Parses the arithmetic expression inside a `$((...))` expansion.
    /// Mirrors `mrsh_parse_arithm_expr`: this is a distinct entry point
    /// from [`Parser::parse_program`]/[`Parser::parse_line`] because
    /// arithmetic expressions have their own self-contained grammar,
    /// implemented in the sibling `shell-arith` crate (spec component E).
    pub fn parse_arithm_expr(source: &str) -> Result<shell_arith::ArithmExpr, Error> {
        shell_arith::parse(source).map_err(|err| Error {
            cause: SyntaxError::InvalidArithmeticExpression(err.to_string()),
            location: crate::source::Location::unknown(),
        })
    }
}

impl Command {
    fn span_end(&self) -> crate::source::Position {
        use crate::ast::Spanned;
        self.span().end
    }
}

impl Pipeline {
    fn span_end(&self) -> crate::source::Position {
        self.location.end
    }
}

/// Wraps a bare `CommandList` (the body of a trailing `else`) as a
/// synthetic `BraceGroup`-less pass-through command so `parse_else_tail`
/// has a single `Command` to return regardless of whether it parsed an
/// `elif` or a final `else`.
fn simple_wrapper(body: CommandList) -> Command {
    let location = body.location;
    Command::BraceGroup { body, location }
}

fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_reserved(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// If `word` begins with `name=` (an unquoted, valid identifier followed
/// by a literal `=`), returns `name`. Assignment recognition stays
/// deliberately "dumb" per spec §5/SPEC_FULL.md's resolved Open Question:
/// no `export`/`readonly`/`local`-specific special-casing, unlike the
/// teacher's `decl_util`-aware parser — and only the word's leading
/// literal text is consulted, since `=` can only ever appear as a plain,
/// unquoted character for assignment recognition to apply at all.
fn assignment_name(word: &Word) -> Option<String> {
    let Some(WordPart::String {
        value,
        single_quoted: false,
    }) = word.parts.first()
    else {
        return None;
    };
    let eq = value.find('=')?;
    let name = &value[..eq];
    if name.is_empty() || !is_valid_name(name) {
        return None;
    }
    Some(name.to_owned())
}

/// Rebuilds the value portion of a `name=value` word (everything after
/// the first unquoted `=`) as its own [`Word`], preserving any quoted or
/// substituted parts that followed the `=`.
fn assignment_value(word: &Word) -> Word {
    let mut parts = word.parts.clone();
    if let Some(WordPart::String { value, .. }) = parts.first_mut() {
        if let Some(eq) = value.find('=') {
            *value = value[eq + 1..].to_owned();
        }
    }
    Word {
        parts,
        double_quoted: word.double_quoted,
        location: word.location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SourceBuffer;

    fn parse(source: &str) -> Program {
        let mut parser = Parser::new(
            SourceBuffer::from_static(source),
            Source::CommandString,
            Config::new(),
        );
        parser.parse_program().unwrap()
    }

    fn first_command(program: &Program) -> &Command {
        let AndOrList::Pipeline(pipeline) = &program.body.items[0].0 else {
            panic!("expected a plain pipeline, not an and/or chain")
        };
        &pipeline.commands[0]
    }

    #[test]
    fn parses_simple_command() {
        let program = parse("echo hello world\n");
        assert_eq!(program.body.items.len(), 1);
        let Command::Simple { words, .. } = first_command(&program) else {
            panic!("expected simple command")
        };
        let literals: Vec<_> = words.iter().map(|w| w.as_literal().unwrap()).collect();
        assert_eq!(literals, vec!["echo", "hello", "world"]);
    }

    #[test]
    fn parses_assignment_and_params_and_if() {
        let program = parse("x=1\nif true; then echo $x; fi\n");
        assert_eq!(program.body.items.len(), 2);
    }

    #[test]
    fn parses_and_or_left_associative() {
        let program = parse("a && b || c\n");
        let AndOrList::BinOp { op, .. } = &program.body.items[0].0 else {
            panic!("expected binop")
        };
        assert_eq!(*op, AndOrOp::Or);
    }

    #[test]
    fn parses_arithmetic_scenario() {
        let expr = Parser::parse_arithm_expr("1+2*3").unwrap();
        let mut vars = std::collections::HashMap::new();
        assert_eq!(shell_arith::eval::eval(&expr, &mut vars).unwrap(), 7);
    }

    fn new_parser(source: &'static str) -> Parser<'static> {
        Parser::new(
            SourceBuffer::from_static(source),
            Source::CommandString,
            Config::new(),
        )
    }

    #[test]
    fn parse_line_reports_continuation_on_an_open_quote() {
        let mut parser = new_parser("echo \"unterminated\n");
        assert_eq!(parser.parse_line().unwrap(), None);
        assert!(parser.is_continuation_line());
        assert!(parser.error().is_none());
    }

    #[test]
    fn parse_line_reports_continuation_on_a_trailing_backslash() {
        let mut parser = new_parser("echo \\");
        assert_eq!(parser.parse_line().unwrap(), None);
        assert!(parser.is_continuation_line());
    }

    #[test]
    fn parse_line_reports_continuation_on_an_open_command_substitution() {
        let mut parser = new_parser("echo $(still going\n");
        assert_eq!(parser.parse_line().unwrap(), None);
        assert!(parser.is_continuation_line());
    }

    #[test]
    fn parse_line_reports_continuation_on_an_open_here_document() {
        let mut parser = new_parser("cat <<EOF\nbody without a delimiter\n");
        assert_eq!(parser.parse_line().unwrap(), None);
        assert!(parser.is_continuation_line());
    }

    #[test]
    fn parse_line_succeeds_on_a_complete_line() {
        let mut parser = new_parser("echo hi\n");
        let list = parser.parse_line().unwrap().expect("complete line");
        assert_eq!(list.items.len(), 1);
        assert!(!parser.is_continuation_line());
    }

    #[test]
    fn a_hard_syntax_error_is_sticky_until_reset() {
        let mut parser = new_parser("if true; then fi\n");
        let first = parser.parse_program().unwrap_err();
        assert_eq!(first.cause, SyntaxError::MissingBody);
        let second = parser.parse_program().unwrap_err();
        assert_eq!(second, first);

        parser.reset();
        assert!(parser.error().is_none());
    }

    #[test]
    fn missing_then_body_is_a_missing_body_error() {
        let mut parser = new_parser("if true; then fi\n");
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.cause, SyntaxError::MissingBody);
    }

    #[test]
    fn malformed_function_definition_parens_are_rejected() {
        let mut parser = new_parser("foo(x) { :; }\n");
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.cause, SyntaxError::InvalidFunctionDefinition);
    }

    #[test]
    fn here_document_missing_its_delimiter_line_is_an_error() {
        let mut parser = new_parser("cat <<EOF\nno closing delimiter here\n");
        let err = parser.parse_program().unwrap_err();
        assert_eq!(
            err.cause,
            SyntaxError::Lex(crate::parser::error::LexErrorKind::UnterminatedHereDoc)
        );
    }

    #[test]
    fn is_eof_is_true_at_end_of_input_and_false_before_it() {
        let mut parser = new_parser("echo hi\n");
        assert!(!parser.is_eof().unwrap());
        parser.parse_program().unwrap();
        assert!(parser.is_eof().unwrap());
    }
}
