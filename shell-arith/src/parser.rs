//! Recursive-descent, precedence-climbing parser for arithmetic expressions.
//!
//! The grammar implemented here is the precedence table of POSIX arithmetic
//! expansion (lowest to highest): assignment, conditional `?:`, logical OR,
//! logical AND, bitwise OR/XOR/AND, equality, relational, shift, additive,
//! multiplicative, unary, primary. The comma operator is not part of POSIX
//! shell arithmetic and is intentionally omitted, exactly as the spec this
//! parser implements says to.

use crate::ast::{ArithmExpr, BinaryOp, CompoundAssignOp, UnaryOp};
use crate::token::{Lexer, Operator, Token, TokenError, TokenValue};
use std::ops::Range;
use thiserror::Error;

/// Error produced while parsing an arithmetic expression.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParseError {
    /// The tokenizer rejected part of the input.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// A token appeared where it could not be used.
    #[error("unexpected token in arithmetic expression")]
    UnexpectedToken { location: Range<usize> },
    /// The input ended before a complete expression was read.
    #[error("unexpected end of arithmetic expression")]
    UnexpectedEndOfInput { location: Range<usize> },
    /// A `(` was never matched by a `)`.
    #[error("unmatched parenthesis in arithmetic expression")]
    UnmatchedParenthesis { opening_location: Range<usize> },
    /// Trailing input remained after a complete expression was parsed.
    #[error("extra token after arithmetic expression")]
    TrailingToken { location: Range<usize> },
}

/// Parses `source` as a complete arithmetic expression.
///
/// This is the entry point corresponding to `parse_arithm_expr` in the
/// shell parser's surface (see [`shell_syntax`](../shell_syntax/index.html)
/// crate documentation): callers that already have the raw text of a
/// `$((...))` word, or of a standalone `parse_arithm_expr` request, hand it
/// to this function.
pub fn parse(source: &str) -> Result<ArithmExpr, ParseError> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_assignment()?;
    let next = parser.peek()?;
    if next.value != TokenValue::EndOfInput {
        return Err(ParseError::TrailingToken {
            location: next.location,
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Vec<Token>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            lookahead: Vec::new(),
        }
    }

    fn fill(&mut self, n: usize) -> Result<(), ParseError> {
        while self.lookahead.len() <= n {
            let token = self.lexer.next_token()?;
            let at_end = token.value == TokenValue::EndOfInput;
            self.lookahead.push(token);
            if at_end {
                break;
            }
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        self.fill(0)?;
        Ok(self.lookahead.first().unwrap())
    }

    fn peek_at(&mut self, n: usize) -> Result<&Token, ParseError> {
        self.fill(n)?;
        Ok(self.lookahead.get(n).unwrap_or_else(|| self.lookahead.last().unwrap()))
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        self.fill(0)?;
        if self.lookahead.len() == 1 && self.lookahead[0].value == TokenValue::EndOfInput {
            Ok(self.lookahead[0].clone())
        } else {
            Ok(self.lookahead.remove(0))
        }
    }

    fn end_location(&mut self) -> Result<Range<usize>, ParseError> {
        Ok(self.peek()?.location.clone())
    }

    /// assignment-expression: conditional-expression
    ///                      | IDENTIFIER assignment-operator assignment-expression
    fn parse_assignment(&mut self) -> Result<ArithmExpr, ParseError> {
        if let TokenValue::Variable(_) = self.peek()?.value.clone() {
            let op = match self.peek_at(1)?.value {
                TokenValue::Operator(Operator::Equal) => Some(None),
                TokenValue::Operator(Operator::AsteriskEqual) => Some(Some(CompoundAssignOp::Multiply)),
                TokenValue::Operator(Operator::SlashEqual) => Some(Some(CompoundAssignOp::Divide)),
                TokenValue::Operator(Operator::PercentEqual) => Some(Some(CompoundAssignOp::Modulo)),
                TokenValue::Operator(Operator::PlusEqual) => Some(Some(CompoundAssignOp::Add)),
                TokenValue::Operator(Operator::MinusEqual) => Some(Some(CompoundAssignOp::Subtract)),
                TokenValue::Operator(Operator::LessLessEqual) => Some(Some(CompoundAssignOp::ShiftLeft)),
                TokenValue::Operator(Operator::GreaterGreaterEqual) => {
                    Some(Some(CompoundAssignOp::ShiftRight))
                }
                TokenValue::Operator(Operator::AndEqual) => Some(Some(CompoundAssignOp::BitAnd)),
                TokenValue::Operator(Operator::CaretEqual) => Some(Some(CompoundAssignOp::BitXor)),
                TokenValue::Operator(Operator::BarEqual) => Some(Some(CompoundAssignOp::BitOr)),
                _ => None,
            };
            if let Some(op) = op {
                let name_token = self.advance()?;
                let name = match name_token.value {
                    TokenValue::Variable(name) => name,
                    _ => unreachable!("peeked as Variable above"),
                };
                self.advance()?; // the assignment operator
                let value = self.parse_assignment()?;
                let location = name_token.location.start..value.location().end;
                return Ok(ArithmExpr::Assign {
                    op,
                    name,
                    value: Box::new(value),
                    location,
                });
            }
        }
        self.parse_conditional()
    }

    /// conditional-expression: logical-OR-expression
    ///                       | logical-OR-expression '?' assignment-expression ':' conditional-expression
    fn parse_conditional(&mut self) -> Result<ArithmExpr, ParseError> {
        let condition = self.parse_binary_chain(0)?;
        if self.peek()?.value == TokenValue::Operator(Operator::Question) {
            self.advance()?;
            let body = self.parse_assignment()?;
            self.expect_operator(Operator::Colon)?;
            let else_part = self.parse_conditional()?;
            let location = condition.location().start..else_part.location().end;
            return Ok(ArithmExpr::Cond {
                condition: Box::new(condition),
                body: Box::new(body),
                else_part: Box::new(else_part),
                location,
            });
        }
        Ok(condition)
    }

    fn expect_operator(&mut self, op: Operator) -> Result<(), ParseError> {
        let token = self.advance()?;
        if token.value == TokenValue::Operator(op) {
            Ok(())
        } else if token.value == TokenValue::EndOfInput {
            Err(ParseError::UnexpectedEndOfInput {
                location: token.location,
            })
        } else {
            Err(ParseError::UnexpectedToken {
                location: token.location,
            })
        }
    }

    /// Binary-operator precedence levels from lowest (`||`, level 0) to
    /// highest (`*`/`/`/`%`, level 9), left-associative at every level.
    fn parse_binary_chain(&mut self, level: usize) -> Result<ArithmExpr, ParseError> {
        const LEVELS: &[&[(Operator, BinaryOp)]] = &[
            &[(Operator::BarBar, BinaryOp::LogicalOr)],
            &[(Operator::AndAnd, BinaryOp::LogicalAnd)],
            &[(Operator::Bar, BinaryOp::BitOr)],
            &[(Operator::Caret, BinaryOp::BitXor)],
            &[(Operator::And, BinaryOp::BitAnd)],
            &[
                (Operator::EqualEqual, BinaryOp::Equal),
                (Operator::BangEqual, BinaryOp::NotEqual),
            ],
            &[
                (Operator::Less, BinaryOp::Less),
                (Operator::LessEqual, BinaryOp::LessEqual),
                (Operator::Greater, BinaryOp::Greater),
                (Operator::GreaterEqual, BinaryOp::GreaterEqual),
            ],
            &[
                (Operator::LessLess, BinaryOp::ShiftLeft),
                (Operator::GreaterGreater, BinaryOp::ShiftRight),
            ],
            &[(Operator::Plus, BinaryOp::Add), (Operator::Minus, BinaryOp::Subtract)],
            &[
                (Operator::Asterisk, BinaryOp::Multiply),
                (Operator::Slash, BinaryOp::Divide),
                (Operator::Percent, BinaryOp::Modulo),
            ],
        ];

        if level == LEVELS.len() {
            return self.parse_unary();
        }

        let mut left = self.parse_binary_chain(level + 1)?;
        loop {
            let found = LEVELS[level].iter().find_map(|&(op, kind)| {
                if self.lookahead_is(op) {
                    Some(kind)
                } else {
                    None
                }
            });
            let Some(kind) = found else { break };
            self.advance()?;
            let right = self.parse_binary_chain(level + 1)?;
            let location = left.location().start..right.location().end;
            left = ArithmExpr::BinOp {
                op: kind,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn lookahead_is(&mut self, op: Operator) -> bool {
        matches!(self.peek(), Ok(token) if token.value == TokenValue::Operator(op))
    }

    /// unary-expression: ('+' | '-' | '~' | '!') unary-expression | primary-expression
    fn parse_unary(&mut self) -> Result<ArithmExpr, ParseError> {
        let op = match self.peek()?.value {
            TokenValue::Operator(Operator::Plus) => Some(UnaryOp::Plus),
            TokenValue::Operator(Operator::Minus) => Some(UnaryOp::Minus),
            TokenValue::Operator(Operator::Tilde) => Some(UnaryOp::Tilde),
            TokenValue::Operator(Operator::Bang) => Some(UnaryOp::Bang),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.advance()?;
            let body = self.parse_unary()?;
            let location = token.location.start..body.location().end;
            return Ok(ArithmExpr::UnOp {
                op,
                body: Box::new(body),
                location,
            });
        }
        self.parse_primary()
    }

    /// primary-expression: LITERAL | IDENTIFIER | '(' assignment-expression ')'
    fn parse_primary(&mut self) -> Result<ArithmExpr, ParseError> {
        let token = self.advance()?;
        match token.value {
            TokenValue::Literal(value) => Ok(ArithmExpr::Literal {
                value,
                location: token.location,
            }),
            TokenValue::Variable(name) => Ok(ArithmExpr::Variable {
                name,
                location: token.location,
            }),
            TokenValue::Operator(Operator::OpenParen) => {
                let opening_location = token.location;
                let inner = self.parse_assignment()?;
                let close = self.advance()?;
                if close.value != TokenValue::Operator(Operator::CloseParen) {
                    return Err(ParseError::UnmatchedParenthesis { opening_location });
                }
                Ok(inner)
            }
            TokenValue::EndOfInput => {
                let location = self.end_location().unwrap_or(token.location);
                Err(ParseError::UnexpectedEndOfInput { location })
            }
            TokenValue::Operator(_) => Err(ParseError::UnexpectedToken {
                location: token.location,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn literal() {
        let expr = parse("42").unwrap();
        assert_matches!(expr, ArithmExpr::Literal { value: 42, .. });
    }

    #[test]
    fn precedence_of_plus_and_times() {
        // 1+2*3 must parse as 1+(2*3), not (1+2)*3.
        let expr = parse("1+2*3").unwrap();
        let ArithmExpr::BinOp {
            op: BinaryOp::Add,
            left,
            right,
            ..
        } = expr
        else {
            panic!("expected an addition at the top")
        };
        assert_matches!(*left, ArithmExpr::Literal { value: 1, .. });
        assert_matches!(
            *right,
            ArithmExpr::BinOp {
                op: BinaryOp::Multiply,
                ..
            }
        );
    }

    #[test]
    fn left_associativity_of_subtraction() {
        // 5-2-1 must parse as (5-2)-1 = 2, not 5-(2-1) = 4.
        let expr = parse("5-2-1").unwrap();
        let ArithmExpr::BinOp {
            op: BinaryOp::Subtract,
            left,
            right,
            ..
        } = expr
        else {
            panic!("expected a subtraction at the top")
        };
        assert_matches!(*right, ArithmExpr::Literal { value: 1, .. });
        assert_matches!(
            *left,
            ArithmExpr::BinOp {
                op: BinaryOp::Subtract,
                ..
            }
        );
    }

    #[test]
    fn parenthesized_expression() {
        let expr = parse("(1+2)*3").unwrap();
        assert_matches!(
            expr,
            ArithmExpr::BinOp {
                op: BinaryOp::Multiply,
                ..
            }
        );
    }

    #[test]
    fn conditional_is_right_associative() {
        let expr = parse("1?2:3?4:5").unwrap();
        let ArithmExpr::Cond { else_part, .. } = expr else {
            panic!("expected a conditional at the top")
        };
        assert_matches!(*else_part, ArithmExpr::Cond { .. });
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse("a=b=1").unwrap();
        let ArithmExpr::Assign { name, value, .. } = expr else {
            panic!("expected an assignment at the top")
        };
        assert_eq!(name, "a");
        assert_matches!(*value, ArithmExpr::Assign { .. });
    }

    #[test]
    fn compound_assignment() {
        let expr = parse("x += 1").unwrap();
        assert_matches!(
            expr,
            ArithmExpr::Assign {
                op: Some(CompoundAssignOp::Add),
                ..
            }
        );
    }

    #[test]
    fn unmatched_paren_is_an_error() {
        assert_matches!(parse("(1+2"), Err(ParseError::UnexpectedEndOfInput { .. }));
    }

    #[test]
    fn trailing_token_is_an_error() {
        assert_matches!(parse("1 2"), Err(ParseError::TrailingToken { .. }));
    }
}
