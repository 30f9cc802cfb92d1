//! POSIX shell arithmetic expression parsing and evaluation.
//!
//! This crate implements the arithmetic sub-grammar used inside `$((...))`
//! arithmetic expansions and by the shell parser's `parse_arithm_expr`
//! entry point. It is split out of the main `shell-syntax` crate as its own
//! package, the way `yash-arith` is split out of `yash-syntax` in the
//! workspace this crate is modeled on: the arithmetic grammar is a
//! self-contained recursive-descent, precedence-climbing parser (see
//! [`parser`]) producing its own expression tree (see [`ast`]), which a
//! caller can then evaluate (see [`eval`]) against any variable store that
//! implements [`eval::Var`].
//!
//! ```
//! use std::collections::HashMap;
//! use shell_arith::{eval::eval, parser::parse};
//!
//! let expr = parse("1 + 2 * 3").unwrap();
//! let mut vars = HashMap::new();
//! assert_eq!(eval(&expr, &mut vars).unwrap(), 7);
//! ```

pub mod ast;
pub mod eval;
pub mod parser;
pub mod token;

pub use ast::ArithmExpr;
pub use parser::{parse, ParseError};
