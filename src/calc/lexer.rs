//! Tokenizer for arithmetic expressions.
//!
//! Only digits, `.`, exponent markers inside a number, the operator characters
//! `+ - * / %`, parentheses and whitespace are accepted. Anything else is
//! rejected here, before the parser ever sees it.

use super::EvalError;

/// Byte-level source span for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Kinds of tokens in the arithmetic grammar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
}

impl TokenKind {
    /// Surface form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::DoubleSlash => "//".into(),
            Self::Percent => "%".into(),
            Self::DoubleStar => "**".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
        }
    }
}

/// A single lexical token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Split an expression into tokens.
pub fn tokenize(expression: &str) -> Result<Vec<Token>, EvalError> {
    let bytes = expression.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || c == b'.' {
            let (kind, end) = lex_number(expression, start)?;
            tokens.push(Token {
                kind,
                span: Span { start, end },
            });
            pos = end;
            continue;
        }

        let (kind, width) = match (c, bytes.get(pos + 1).copied()) {
            (b'*', Some(b'*')) => (TokenKind::DoubleStar, 2),
            (b'/', Some(b'/')) => (TokenKind::DoubleSlash, 2),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            _ => {
                let found = expression[start..].chars().next().unwrap_or('?');
                return Err(EvalError::UnexpectedCharacter {
                    expression: expression.to_string(),
                    found,
                    position: start,
                });
            }
        };
        pos += width;
        tokens.push(Token {
            kind,
            span: Span { start, end: pos },
        });
    }

    Ok(tokens)
}

/// Lex a numeric literal starting at `start`: `123`, `1.5`, `.5`, `2.`, `1e3`, `2.5E-4`.
fn lex_number(expression: &str, start: usize) -> Result<(TokenKind, usize), EvalError> {
    let bytes = expression.as_bytes();
    let mut pos = start;
    let mut is_float = false;

    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        is_float = true;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut look = pos + 1;
        if look < bytes.len() && (bytes[look] == b'+' || bytes[look] == b'-') {
            look += 1;
        }
        if look < bytes.len() && bytes[look].is_ascii_digit() {
            is_float = true;
            pos = look;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let literal = &expression[start..pos];
    let invalid = || EvalError::InvalidNumber {
        expression: expression.to_string(),
        literal: literal.to_string(),
    };

    if literal == "." {
        return Err(invalid());
    }

    let kind = if is_float {
        TokenKind::Float(literal.parse::<f64>().map_err(|_| invalid())?)
    } else {
        match literal.parse::<i64>() {
            Ok(n) => TokenKind::Int(n),
            // Too large for i64: keep going as a float, like an overflowed result.
            Err(_) => TokenKind::Float(literal.parse::<f64>().map_err(|_| invalid())?),
        }
    };
    Ok((kind, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(expr: &str) -> Vec<TokenKind> {
        tokenize(expr).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_operators_and_numbers() {
        assert_eq!(
            kinds("2 ** 3 // 4 % (1.5)"),
            vec![
                TokenKind::Int(2),
                TokenKind::DoubleStar,
                TokenKind::Int(3),
                TokenKind::DoubleSlash,
                TokenKind::Int(4),
                TokenKind::Percent,
                TokenKind::LParen,
                TokenKind::Float(1.5),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn number_forms() {
        assert_eq!(kinds(".5"), vec![TokenKind::Float(0.5)]);
        assert_eq!(kinds("2."), vec![TokenKind::Float(2.0)]);
        assert_eq!(kinds("1e3"), vec![TokenKind::Float(1000.0)]);
        assert_eq!(kinds("2.5E-1"), vec![TokenKind::Float(0.25)]);
    }

    #[test]
    fn exponent_marker_without_digits_is_not_consumed() {
        // "2e" leaves the 'e' behind, which is then rejected as a name.
        let err = tokenize("2e").unwrap_err();
        assert!(matches!(err, EvalError::UnexpectedCharacter { found: 'e', position: 1, .. }));
    }

    #[test]
    fn spans_track_positions() {
        let tokens = tokenize("12 + 3").unwrap();
        assert_eq!(tokens[0].span, Span { start: 0, end: 2 });
        assert_eq!(tokens[1].span, Span { start: 3, end: 4 });
        assert_eq!(tokens[2].span, Span { start: 5, end: 6 });
    }

    #[test]
    fn rejects_names_and_punctuation() {
        for expr in ["abs(1)", "__import__('os')", "1 . real", "x", "[1]", "1, 2", "2 ^ 3"] {
            assert!(tokenize(expr).is_err(), "{expr:?} should be rejected");
        }
    }

    #[test]
    fn lone_dot_is_invalid() {
        assert!(matches!(
            tokenize("1 + ."),
            Err(EvalError::InvalidNumber { .. })
        ));
    }
}
