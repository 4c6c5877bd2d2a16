//! Recursive-descent parser over the whitelisted arithmetic grammar.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '//' | '%') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('**' unary)?
//! atom   := NUMBER | '(' expr ')'
//! ```
//!
//! `**` is right-associative and binds tighter than a unary sign on its left,
//! so `-2**2` is `-(2**2)` and `2**-1` is `2**(-1)`.

use super::lexer::{Token, TokenKind};
use super::{EvalError, Number};

/// Maximum nesting of parentheses and unary signs.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Parse a token stream into an expression tree.
pub fn parse(expression: &str, tokens: &[Token]) -> Result<Expr, EvalError> {
    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(parser.unexpected(token));
    }
    Ok(expr)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn unexpected(&self, token: Token) -> EvalError {
        EvalError::UnexpectedToken {
            expression: self.expression.to_string(),
            found: token.kind.describe(),
            position: token.span.start,
        }
    }

    fn end(&self) -> EvalError {
        EvalError::UnexpectedEnd {
            expression: self.expression.to_string(),
        }
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep {
                expression: self.expression.to_string(),
                max_depth: MAX_DEPTH,
            });
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.term()?;
        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Minus,
            _ => return self.power(),
        };
        self.pos += 1;
        self.descend()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.atom()?;
        if matches!(self.peek().map(|t| t.kind), Some(TokenKind::DoubleStar)) {
            self.pos += 1;
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, EvalError> {
        let token = self.bump().ok_or_else(|| self.end())?;
        match token.kind {
            TokenKind::Int(n) => Ok(Expr::Number(Number::Int(n))),
            TokenKind::Float(x) => Ok(Expr::Number(Number::Float(x))),
            TokenKind::LParen => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(self.unexpected(other)),
                    None => Err(EvalError::UnbalancedParens {
                        expression: self.expression.to_string(),
                    }),
                }
            }
            _ => Err(self.unexpected(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::lexer::tokenize;

    fn parse_str(expr: &str) -> Result<Expr, EvalError> {
        parse(expr, &tokenize(expr)?)
    }

    fn int(n: i64) -> Box<Expr> {
        Box::new(Expr::Number(Number::Int(n)))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_str("2+3*5").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                int(2),
                Box::new(Expr::Binary(BinaryOp::Mul, int(3), int(5)))
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse_str("8-3-2").unwrap(),
            Expr::Binary(
                BinaryOp::Sub,
                Box::new(Expr::Binary(BinaryOp::Sub, int(8), int(3))),
                int(2)
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            parse_str("2**3**2").unwrap(),
            Expr::Binary(
                BinaryOp::Pow,
                int(2),
                Box::new(Expr::Binary(BinaryOp::Pow, int(3), int(2)))
            )
        );
    }

    #[test]
    fn unary_minus_wraps_power() {
        assert_eq!(
            parse_str("-2**2").unwrap(),
            Expr::Unary(
                UnaryOp::Minus,
                Box::new(Expr::Binary(BinaryOp::Pow, int(2), int(2)))
            )
        );
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(parse_str("(1+2"), Err(EvalError::UnbalancedParens { .. })));
        assert!(matches!(parse_str("1+2)"), Err(EvalError::UnexpectedToken { .. })));
        assert!(matches!(parse_str("1+"), Err(EvalError::UnexpectedEnd { .. })));
        assert!(matches!(parse_str(""), Err(EvalError::UnexpectedEnd { .. })));
        assert!(matches!(parse_str("()"), Err(EvalError::UnexpectedToken { .. })));
        assert!(matches!(parse_str("1 2"), Err(EvalError::UnexpectedToken { .. })));
        assert!(matches!(parse_str("*3"), Err(EvalError::UnexpectedToken { .. })));
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse_str(&deep), Err(EvalError::TooDeep { .. })));

        let signs = format!("{}1", "-".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse_str(&signs), Err(EvalError::TooDeep { .. })));

        let ok = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse_str(&ok).is_ok());
    }
}
