//! Evaluating a parsed arithmetic expression.
//!
//! This crate does not implement variable storage itself — the caller
//! supplies an implementation of [`Var`], exactly as `yash_arith::env::Env`
//! is supplied by the caller of `yash_arith::eval`. Evaluation uses
//! two's-complement signed 64-bit semantics with silent wrap-around on
//! overflow; division and modulo by zero are reported as [`EvalError`]
//! rather than panicking.

use crate::ast::{ArithmExpr, BinaryOp, CompoundAssignOp, UnaryOp};
use std::ops::Range;
use thiserror::Error;

/// Interface for accessing shell variables during arithmetic evaluation.
///
/// An unset variable is treated as the value `0`, per POSIX arithmetic
/// expansion rules, by returning `Ok(None)` from [`Var::get`].
pub trait Var {
    /// Error type returned by [`get`](Var::get) and [`assign`](Var::assign).
    type Error;

    /// Returns the current value of `name`, or `None` if it is unset.
    fn get(&self, name: &str) -> Result<Option<i64>, Self::Error>;

    /// Assigns `value` to `name`.
    fn assign(&mut self, name: &str, value: i64) -> Result<(), Self::Error>;
}

/// Error produced while evaluating an arithmetic expression.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EvalError<E> {
    /// Division where the divisor evaluates to zero.
    #[error("division by zero")]
    DivisionByZero { location: Range<usize> },
    /// Modulo where the divisor evaluates to zero.
    #[error("division by zero in modulo")]
    ModuloByZero { location: Range<usize> },
    /// The variable store returned an error.
    #[error("variable access failed")]
    Var { location: Range<usize>, error: E },
}

/// Evaluates `expr` against `vars`, returning the resulting 64-bit value.
pub fn eval<V: Var>(expr: &ArithmExpr, vars: &mut V) -> Result<i64, EvalError<V::Error>> {
    match expr {
        ArithmExpr::Literal { value, .. } => Ok(*value),

        ArithmExpr::Variable { name, location } => {
            vars.get(name)
                .map_err(|error| EvalError::Var {
                    location: location.clone(),
                    error,
                })
                .map(|value| value.unwrap_or(0))
        }

        ArithmExpr::UnOp { op, body, .. } => {
            let value = eval(body, vars)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => value.wrapping_neg(),
                UnaryOp::Tilde => !value,
                UnaryOp::Bang => i64::from(value == 0),
            })
        }

        ArithmExpr::BinOp {
            op,
            left,
            right,
            location,
        } => eval_binary(*op, left, right, location, vars),

        ArithmExpr::Cond {
            condition,
            body,
            else_part,
            ..
        } => {
            if eval(condition, vars)? != 0 {
                eval(body, vars)
            } else {
                eval(else_part, vars)
            }
        }

        ArithmExpr::Assign {
            op,
            name,
            value,
            location,
        } => {
            let new_value = match op {
                None => eval(value, vars)?,
                Some(op) => {
                    let current = vars
                        .get(name)
                        .map_err(|error| EvalError::Var {
                            location: location.clone(),
                            error,
                        })?
                        .unwrap_or(0);
                    let rhs = eval(value, vars)?;
                    apply_compound(*op, current, rhs, location)?
                }
            };
            vars.assign(name, new_value)
                .map_err(|error| EvalError::Var {
                    location: location.clone(),
                    error,
                })?;
            Ok(new_value)
        }
    }
}

fn eval_binary<V: Var>(
    op: BinaryOp,
    left: &ArithmExpr,
    right: &ArithmExpr,
    location: &Range<usize>,
    vars: &mut V,
) -> Result<i64, EvalError<V::Error>> {
    // Short-circuit && and || without evaluating the right operand.
    if op == BinaryOp::LogicalAnd {
        let l = eval(left, vars)?;
        if l == 0 {
            return Ok(0);
        }
        return Ok(i64::from(eval(right, vars)? != 0));
    }
    if op == BinaryOp::LogicalOr {
        let l = eval(left, vars)?;
        if l != 0 {
            return Ok(1);
        }
        return Ok(i64::from(eval(right, vars)? != 0));
    }

    let l = eval(left, vars)?;
    let r = eval(right, vars)?;
    Ok(match op {
        BinaryOp::Multiply => l.wrapping_mul(r),
        BinaryOp::Divide => {
            if r == 0 {
                return Err(EvalError::DivisionByZero {
                    location: location.clone(),
                });
            }
            l.wrapping_div(r)
        }
        BinaryOp::Modulo => {
            if r == 0 {
                return Err(EvalError::ModuloByZero {
                    location: location.clone(),
                });
            }
            l.wrapping_rem(r)
        }
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Subtract => l.wrapping_sub(r),
        BinaryOp::ShiftLeft => l.wrapping_shl(r as u32),
        BinaryOp::ShiftRight => l.wrapping_shr(r as u32),
        BinaryOp::Less => i64::from(l < r),
        BinaryOp::LessEqual => i64::from(l <= r),
        BinaryOp::Greater => i64::from(l > r),
        BinaryOp::GreaterEqual => i64::from(l >= r),
        BinaryOp::Equal => i64::from(l == r),
        BinaryOp::NotEqual => i64::from(l != r),
        BinaryOp::BitAnd => l & r,
        BinaryOp::BitXor => l ^ r,
        BinaryOp::BitOr => l | r,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => unreachable!("handled above"),
    })
}

fn apply_compound<E>(
    op: CompoundAssignOp,
    current: i64,
    rhs: i64,
    location: &Range<usize>,
) -> Result<i64, EvalError<E>> {
    Ok(match op {
        CompoundAssignOp::Multiply => current.wrapping_mul(rhs),
        CompoundAssignOp::Divide => {
            if rhs == 0 {
                return Err(EvalError::DivisionByZero {
                    location: location.clone(),
                });
            }
            current.wrapping_div(rhs)
        }
        CompoundAssignOp::Modulo => {
            if rhs == 0 {
                return Err(EvalError::ModuloByZero {
                    location: location.clone(),
                });
            }
            current.wrapping_rem(rhs)
        }
        CompoundAssignOp::Add => current.wrapping_add(rhs),
        CompoundAssignOp::Subtract => current.wrapping_sub(rhs),
        CompoundAssignOp::ShiftLeft => current.wrapping_shl(rhs as u32),
        CompoundAssignOp::ShiftRight => current.wrapping_shr(rhs as u32),
        CompoundAssignOp::BitAnd => current & rhs,
        CompoundAssignOp::BitXor => current ^ rhs,
        CompoundAssignOp::BitOr => current | rhs,
    })
}

impl Var for std::collections::HashMap<String, i64> {
    type Error = std::convert::Infallible;

    fn get(&self, name: &str) -> Result<Option<i64>, Self::Error> {
        Ok(self.get(name).copied())
    }

    fn assign(&mut self, name: &str, value: i64) -> Result<(), Self::Error> {
        self.insert(name.to_owned(), value);
        Ok(())
    }
}
