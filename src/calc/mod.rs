//! Safe arithmetic evaluation.
//!
//! Input is tokenized against a fixed whitelist ([`lexer`]), parsed by a
//! recursive-descent parser into an [`Expr`] tree ([`parser`]), and folded
//! to a [`Number`]. There is no name lookup, no call syntax and no
//! attribute access anywhere in the grammar, so nothing in the input is
//! ever executed.

pub mod lexer;
pub mod parser;

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use parser::{BinaryOp, Expr, UnaryOp};

/// Longest expression the evaluator accepts, in bytes.
pub const MAX_EXPRESSION_LEN: usize = 512;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The expression is outside the arithmetic grammar or its value is undefined.
///
/// Every variant carries the offending expression text.
#[derive(Debug, Error, Diagnostic)]
pub enum EvalError {
    #[error("unexpected character '{found}' at position {position} in \"{expression}\"")]
    #[diagnostic(
        code(agent::calc::unexpected_character),
        help("Only numbers, + - * / // % **, and parentheses are allowed.")
    )]
    UnexpectedCharacter {
        expression: String,
        found: char,
        position: usize,
    },

    #[error("invalid number \"{literal}\" in \"{expression}\"")]
    #[diagnostic(
        code(agent::calc::invalid_number),
        help("Write numbers like 42, 3.14, .5 or 1e3.")
    )]
    InvalidNumber { expression: String, literal: String },

    #[error("unexpected '{found}' at position {position} in \"{expression}\"")]
    #[diagnostic(
        code(agent::calc::unexpected_token),
        help("Check for missing operands or stray operators.")
    )]
    UnexpectedToken {
        expression: String,
        found: String,
        position: usize,
    },

    #[error("expression \"{expression}\" ends unexpectedly")]
    #[diagnostic(code(agent::calc::unexpected_end), help("An operand is missing at the end."))]
    UnexpectedEnd { expression: String },

    #[error("unbalanced parentheses in \"{expression}\"")]
    #[diagnostic(code(agent::calc::unbalanced), help("Every '(' needs a matching ')'."))]
    UnbalancedParens { expression: String },

    #[error("expression \"{expression}\" nests deeper than {max_depth} levels")]
    #[diagnostic(code(agent::calc::too_deep), help("Simplify the expression."))]
    TooDeep { expression: String, max_depth: usize },

    #[error("expression is {length} characters long (limit {max})")]
    #[diagnostic(code(agent::calc::too_long), help("Split the calculation into smaller pieces."))]
    TooLong {
        expression: String,
        length: usize,
        max: usize,
    },

    #[error("division by zero in \"{expression}\"")]
    #[diagnostic(code(agent::calc::division_by_zero))]
    DivisionByZero { expression: String },

    #[error("result of \"{expression}\" is not a finite number")]
    #[diagnostic(
        code(agent::calc::non_finite),
        help("The value overflowed or is undefined (e.g. a fractional power of a negative number).")
    )]
    NonFinite { expression: String },
}

impl EvalError {
    /// The expression that was rejected.
    pub fn expression(&self) -> &str {
        match self {
            Self::UnexpectedCharacter { expression, .. }
            | Self::InvalidNumber { expression, .. }
            | Self::UnexpectedToken { expression, .. }
            | Self::UnexpectedEnd { expression }
            | Self::UnbalancedParens { expression }
            | Self::TooDeep { expression, .. }
            | Self::TooLong { expression, .. }
            | Self::DivisionByZero { expression }
            | Self::NonFinite { expression } => expression,
        }
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Result of an evaluation: integers stay exact until they overflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(x) => x,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Int(n) => n == 0,
            Self::Float(x) => x == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Int(n) => write!(f, "{n}"),
            // Large floats in plain digits would read as integers.
            Self::Float(x) if x.is_finite() && x.abs() >= 1e16 => write!(f, "{x:e}"),
            Self::Float(x) if x.fract() == 0.0 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate an arithmetic expression.
///
/// ```
/// use message_agent::calc::{evaluate, Number};
///
/// assert_eq!(evaluate("2+3*5").unwrap(), Number::Int(17));
/// assert_eq!(evaluate("7 / 2").unwrap(), Number::Float(3.5));
/// assert!(evaluate("__import__('os')").is_err());
/// ```
pub fn evaluate(expression: &str) -> Result<Number, EvalError> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(EvalError::TooLong {
            expression: expression.to_string(),
            length: expression.len(),
            max: MAX_EXPRESSION_LEN,
        });
    }
    let tokens = lexer::tokenize(expression)?;
    let tree = parser::parse(expression, &tokens)?;
    Folder { expression }.fold(&tree)
}

struct Folder<'a> {
    expression: &'a str,
}

impl Folder<'_> {
    fn fold(&self, expr: &Expr) -> Result<Number, EvalError> {
        let value = match expr {
            Expr::Number(n) => *n,
            Expr::Unary(UnaryOp::Plus, inner) => self.fold(inner)?,
            Expr::Unary(UnaryOp::Minus, inner) => match self.fold(inner)? {
                Number::Int(n) => n
                    .checked_neg()
                    .map(Number::Int)
                    .unwrap_or(Number::Float(-(n as f64))),
                Number::Float(x) => Number::Float(-x),
            },
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.fold(lhs)?;
                let rhs = self.fold(rhs)?;
                self.apply(*op, lhs, rhs)?
            }
        };
        match value {
            Number::Float(x) if !x.is_finite() => Err(EvalError::NonFinite {
                expression: self.expression.to_string(),
            }),
            _ => Ok(value),
        }
    }

    fn apply(&self, op: BinaryOp, lhs: Number, rhs: Number) -> Result<Number, EvalError> {
        let zero_division = || EvalError::DivisionByZero {
            expression: self.expression.to_string(),
        };

        if matches!(op, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod) && rhs.is_zero() {
            return Err(zero_division());
        }

        if let (Number::Int(a), Number::Int(b)) = (lhs, rhs) {
            return Ok(match op {
                BinaryOp::Add => int_or_float(a.checked_add(b), || a as f64 + b as f64),
                BinaryOp::Sub => int_or_float(a.checked_sub(b), || a as f64 - b as f64),
                BinaryOp::Mul => int_or_float(a.checked_mul(b), || a as f64 * b as f64),
                BinaryOp::Div => Number::Float(a as f64 / b as f64),
                BinaryOp::FloorDiv => int_or_float(floor_div(a, b), || {
                    (a as f64 / b as f64).floor()
                }),
                BinaryOp::Mod => Number::Int(floor_mod(a, b)),
                BinaryOp::Pow => {
                    if b < 0 {
                        if a == 0 {
                            return Err(zero_division());
                        }
                        Number::Float((a as f64).powf(b as f64))
                    } else {
                        let checked = u32::try_from(b).ok().and_then(|e| a.checked_pow(e));
                        int_or_float(checked, || (a as f64).powf(b as f64))
                    }
                }
            });
        }

        let (a, b) = (lhs.as_f64(), rhs.as_f64());
        Ok(Number::Float(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::FloorDiv => (a / b).floor(),
            BinaryOp::Mod => {
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
            }
            BinaryOp::Pow => {
                if a == 0.0 && b < 0.0 {
                    return Err(zero_division());
                }
                a.powf(b)
            }
        }))
    }
}

fn int_or_float(exact: Option<i64>, approx: impl FnOnce() -> f64) -> Number {
    exact.map(Number::Int).unwrap_or_else(|| Number::Float(approx()))
}

/// Integer division rounding toward negative infinity. `None` on overflow.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.checked_rem(b).unwrap_or(0);
    if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> Number {
        evaluate(expr).unwrap_or_else(|e| panic!("{expr:?} failed: {e}"))
    }

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(eval("2+3*5"), Number::Int(17));
        assert_eq!(eval("2*(3+5)"), Number::Int(16));
        assert_eq!(eval("10 - 4 - 3"), Number::Int(3));
        assert_eq!(eval("2 * 3 % 4"), Number::Int(2));
        assert_eq!(eval("((1))"), Number::Int(1));
    }

    #[test]
    fn division_flavours() {
        assert_eq!(eval("7 / 2"), Number::Float(3.5));
        assert_eq!(eval("8 / 2"), Number::Float(4.0));
        assert_eq!(eval("7 // 2"), Number::Int(3));
        assert_eq!(eval("-7 // 2"), Number::Int(-4));
        assert_eq!(eval("7 // -2"), Number::Int(-4));
        assert_eq!(eval("7.5 // 2"), Number::Float(3.0));
    }

    #[test]
    fn modulo_takes_divisor_sign() {
        assert_eq!(eval("7 % 3"), Number::Int(1));
        assert_eq!(eval("-7 % 3"), Number::Int(2));
        assert_eq!(eval("7 % -3"), Number::Int(-2));
        assert_eq!(eval("-7.5 % 2"), Number::Float(0.5));
    }

    #[test]
    fn exponentiation() {
        assert_eq!(eval("2 ** 10"), Number::Int(1024));
        assert_eq!(eval("2 ** 3 ** 2"), Number::Int(512));
        assert_eq!(eval("-2 ** 2"), Number::Int(-4));
        assert_eq!(eval("(-2) ** 2"), Number::Int(4));
        assert_eq!(eval("2 ** -1"), Number::Float(0.5));
        assert_eq!(eval("4 ** 0.5"), Number::Float(2.0));
    }

    #[test]
    fn unary_signs() {
        assert_eq!(eval("-3 + +5"), Number::Int(2));
        assert_eq!(eval("--3"), Number::Int(3));
        assert_eq!(eval("-(2 + 3)"), Number::Int(-5));
    }

    #[test]
    fn integer_overflow_promotes_to_float() {
        assert_eq!(eval("9223372036854775807 + 1"), Number::Float(9223372036854775808.0));
        assert_eq!(eval("2 ** 64"), Number::Float(18446744073709551616.0));
    }

    #[test]
    fn arithmetic_faults_are_errors() {
        assert!(matches!(evaluate("1 / 0"), Err(EvalError::DivisionByZero { .. })));
        assert!(matches!(evaluate("1 // 0"), Err(EvalError::DivisionByZero { .. })));
        assert!(matches!(evaluate("1 % 0.0"), Err(EvalError::DivisionByZero { .. })));
        assert!(matches!(evaluate("0 ** -1"), Err(EvalError::DivisionByZero { .. })));
        assert!(matches!(evaluate("10.0 ** 400"), Err(EvalError::NonFinite { .. })));
        assert!(matches!(evaluate("(-8) ** 0.5"), Err(EvalError::NonFinite { .. })));
    }

    #[test]
    fn code_is_never_accepted() {
        for expr in [
            "__import__('os')",
            "__import__('os').system('ls')",
            "open('x')",
            "(1).__class__",
            "[x for x in range(3)]",
            "lambda: 1",
            "a = 1",
            "1; 2",
        ] {
            let err = evaluate(expr).unwrap_err();
            assert_eq!(err.expression(), expr);
        }
    }

    #[test]
    fn overly_long_input_is_rejected() {
        let long = "1+".repeat(MAX_EXPRESSION_LEN) + "1";
        assert!(matches!(evaluate(&long), Err(EvalError::TooLong { .. })));
    }

    #[test]
    fn display_follows_number_kind() {
        assert_eq!(Number::Int(17).to_string(), "17");
        assert_eq!(Number::Float(8.0).to_string(), "8.0");
        assert_eq!(Number::Float(3.5).to_string(), "3.5");
        assert_eq!(Number::Float(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn large_floats_use_exponent_form() {
        assert_eq!(Number::Float(1e16).to_string(), "1e16");
        assert_eq!(eval("1e16").to_string(), "1e16");
        assert_eq!(eval("2 ** 64").to_string(), "1.8446744073709552e19");
        assert_eq!(
            eval("-9223372036854775808 // -1").to_string(),
            "9.223372036854776e18"
        );
        assert_eq!(Number::Float(9999999999999998.0).to_string(), "9999999999999998.0");
    }
}
