//! Evaluation of `#if` / `#elif` conditions.
//!
//! The preprocessor replaces `defined` operators and expands macros before the
//! tokens reach this module, so any identifier left over evaluates to 0.

use crate::lexer::{Token, TokenKind};
use crate::pp::preprocessor::PPError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PPBinaryOp {
    LogicOr,
    LogicAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LShift,
    RShift,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PPUnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicNot,
}

/// A value of a conditional expression. Arithmetic is done in 64 bits; a
/// value is unsigned when a `u` suffix or an out-of-range literal made it so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PPValue {
    bits: u64,
    unsigned: bool,
}

impl PPValue {
    pub fn signed(value: i64) -> Self {
        PPValue {
            bits: value as u64,
            unsigned: false,
        }
    }

    pub fn unsigned(value: u64) -> Self {
        PPValue {
            bits: value,
            unsigned: true,
        }
    }

    fn truth(value: bool) -> Self {
        PPValue::signed(value as i64)
    }

    pub fn is_true(self) -> bool {
        self.bits != 0
    }

    fn as_signed(self) -> i64 {
        self.bits as i64
    }

    fn with_bits(self, bits: u64) -> Self {
        PPValue { bits, ..self }
    }
}

#[derive(Debug)]
pub enum PPExpr {
    Number(PPValue),
    Identifier(String),
    Binary(PPBinaryOp, Box<PPExpr>, Box<PPExpr>),
    Unary(PPUnaryOp, Box<PPExpr>),
    Conditional(Box<PPExpr>, Box<PPExpr>, Box<PPExpr>),
}

impl PPExpr {
    pub fn evaluate(&self) -> Result<PPValue, PPError> {
        match self {
            PPExpr::Number(n) => Ok(*n),
            PPExpr::Identifier(name) => Ok(PPValue::truth(name == "true")),
            PPExpr::Binary(PPBinaryOp::LogicAnd, left, right) => {
                if !left.evaluate()?.is_true() {
                    return Ok(PPValue::truth(false));
                }
                Ok(PPValue::truth(right.evaluate()?.is_true()))
            }
            PPExpr::Binary(PPBinaryOp::LogicOr, left, right) => {
                if left.evaluate()?.is_true() {
                    return Ok(PPValue::truth(true));
                }
                Ok(PPValue::truth(right.evaluate()?.is_true()))
            }
            PPExpr::Binary(op, left, right) => binary(*op, left.evaluate()?, right.evaluate()?),
            PPExpr::Unary(op, operand) => {
                let o = operand.evaluate()?;
                Ok(match op {
                    PPUnaryOp::Plus => o,
                    PPUnaryOp::Minus => o.with_bits(o.bits.wrapping_neg()),
                    PPUnaryOp::BitNot => o.with_bits(!o.bits),
                    PPUnaryOp::LogicNot => PPValue::truth(!o.is_true()),
                })
            }
            PPExpr::Conditional(cond, true_e, false_e) => {
                if cond.evaluate()?.is_true() {
                    true_e.evaluate()
                } else {
                    false_e.evaluate()
                }
            }
        }
    }
}

/// Apply `op` after the usual arithmetic conversions: one unsigned operand
/// makes the operation unsigned. Shifts keep the type of the left operand.
fn binary(op: PPBinaryOp, l: PPValue, r: PPValue) -> Result<PPValue, PPError> {
    let unsigned = l.unsigned || r.unsigned;
    let result = |bits: u64| PPValue { bits, unsigned };
    let compare = |ordering: std::cmp::Ordering| match unsigned {
        true => l.bits.cmp(&r.bits) == ordering,
        false => l.as_signed().cmp(&r.as_signed()) == ordering,
    };
    let value = match op {
        PPBinaryOp::BitOr => result(l.bits | r.bits),
        PPBinaryOp::BitXor => result(l.bits ^ r.bits),
        PPBinaryOp::BitAnd => result(l.bits & r.bits),
        PPBinaryOp::Equal => PPValue::truth(l.bits == r.bits),
        PPBinaryOp::NotEqual => PPValue::truth(l.bits != r.bits),
        PPBinaryOp::Less => PPValue::truth(compare(std::cmp::Ordering::Less)),
        PPBinaryOp::LessEqual => PPValue::truth(!compare(std::cmp::Ordering::Greater)),
        PPBinaryOp::Greater => PPValue::truth(compare(std::cmp::Ordering::Greater)),
        PPBinaryOp::GreaterEqual => PPValue::truth(!compare(std::cmp::Ordering::Less)),
        PPBinaryOp::LShift => l.with_bits(l.bits.wrapping_shl(r.bits as u32)),
        PPBinaryOp::RShift => match l.unsigned {
            true => l.with_bits(l.bits.wrapping_shr(r.bits as u32)),
            false => l.with_bits(l.as_signed().wrapping_shr(r.bits as u32) as u64),
        },
        PPBinaryOp::Add => result(l.bits.wrapping_add(r.bits)),
        PPBinaryOp::Sub => result(l.bits.wrapping_sub(r.bits)),
        PPBinaryOp::Mul => result(l.bits.wrapping_mul(r.bits)),
        PPBinaryOp::Div | PPBinaryOp::Mod if r.bits == 0 => return Err(PPError::DivisionByZero),
        PPBinaryOp::Div if unsigned => result(l.bits / r.bits),
        PPBinaryOp::Div => result(l.as_signed().wrapping_div(r.as_signed()) as u64),
        PPBinaryOp::Mod if unsigned => result(l.bits % r.bits),
        PPBinaryOp::Mod => result(l.as_signed().wrapping_rem(r.as_signed()) as u64),
        PPBinaryOp::LogicAnd => PPValue::truth(l.is_true() && r.is_true()),
        PPBinaryOp::LogicOr => PPValue::truth(l.is_true() || r.is_true()),
    };
    Ok(value)
}

/// Recursive descent parser for conditional expressions
pub struct Interpreter<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Interpreter { tokens, pos: 0 }
    }

    /// Parse and evaluate the whole token list.
    pub fn evaluate(tokens: &'a [Token]) -> Result<bool, PPError> {
        let mut interpreter = Interpreter::new(tokens);
        let expr = interpreter.parse_expression()?;
        if interpreter.pos != tokens.len() {
            return Err(PPError::InvalidConditionalExpression);
        }
        Ok(expr.evaluate()?.is_true())
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub fn parse_expression(&mut self) -> Result<PPExpr, PPError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<PPExpr, PPError> {
        let cond = self.parse_binary(0)?;
        if self.peek() == Some(TokenKind::Question) {
            self.pos += 1;
            let true_e = self.parse_conditional()?;
            if self.peek() != Some(TokenKind::Colon) {
                return Err(PPError::InvalidConditionalExpression);
            }
            self.pos += 1;
            let false_e = self.parse_conditional()?;
            return Ok(PPExpr::Conditional(Box::new(cond), Box::new(true_e), Box::new(false_e)));
        }
        Ok(cond)
    }

    fn binary_operator(kind: TokenKind) -> Option<(PPBinaryOp, u8)> {
        let op = match kind {
            TokenKind::PipePipe => (PPBinaryOp::LogicOr, 0),
            TokenKind::AmperAmper => (PPBinaryOp::LogicAnd, 1),
            TokenKind::Pipe => (PPBinaryOp::BitOr, 2),
            TokenKind::Caret => (PPBinaryOp::BitXor, 3),
            TokenKind::Ampersand => (PPBinaryOp::BitAnd, 4),
            TokenKind::EqualEqual => (PPBinaryOp::Equal, 5),
            TokenKind::ExclaimEqual => (PPBinaryOp::NotEqual, 5),
            TokenKind::Less => (PPBinaryOp::Less, 6),
            TokenKind::LessEqual => (PPBinaryOp::LessEqual, 6),
            TokenKind::Greater => (PPBinaryOp::Greater, 6),
            TokenKind::GreaterEqual => (PPBinaryOp::GreaterEqual, 6),
            TokenKind::LessLess => (PPBinaryOp::LShift, 7),
            TokenKind::GreaterGreater => (PPBinaryOp::RShift, 7),
            TokenKind::Plus => (PPBinaryOp::Add, 8),
            TokenKind::Minus => (PPBinaryOp::Sub, 8),
            TokenKind::Star => (PPBinaryOp::Mul, 9),
            TokenKind::Slash => (PPBinaryOp::Div, 9),
            TokenKind::Percent => (PPBinaryOp::Mod, 9),
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing over the left-associative binary levels.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<PPExpr, PPError> {
        let mut left = self.parse_unary()?;
        while let Some((op, precedence)) = self.peek().and_then(Self::binary_operator) {
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.parse_binary(precedence + 1)?;
            left = PPExpr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<PPExpr, PPError> {
        let op = match self.peek() {
            Some(TokenKind::Plus) => PPUnaryOp::Plus,
            Some(TokenKind::Minus) => PPUnaryOp::Minus,
            Some(TokenKind::Tilde) => PPUnaryOp::BitNot,
            Some(TokenKind::Exclaim) => PPUnaryOp::LogicNot,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(PPExpr::Unary(op, Box::new(operand)))
    }

    fn parse_primary(&mut self) -> Result<PPExpr, PPError> {
        let token = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or(PPError::InvalidConditionalExpression)?;
        self.pos += 1;
        match token.kind {
            TokenKind::NumericLiteral => parse_integer(token.spell()).map(PPExpr::Number),
            TokenKind::CharLiteral | TokenKind::WideCharLiteral => parse_char(token.spell()).map(PPExpr::Number),
            kind if kind.is_identifier_like() => Ok(PPExpr::Identifier(token.spell().to_string())),
            TokenKind::LeftParen => {
                let result = self.parse_expression()?;
                if self.peek() != Some(TokenKind::RightParen) {
                    return Err(PPError::InvalidConditionalExpression);
                }
                self.pos += 1;
                Ok(result)
            }
            _ => Err(PPError::InvalidConditionalExpression),
        }
    }
}

fn parse_integer(text: &str) -> Result<PPValue, PPError> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let suffix = &text[digits.len()..];
    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<u64>()
    };
    let value = parsed.map_err(|_| PPError::InvalidConditionalExpression)?;
    // too large for a signed value
    if suffix.contains(['u', 'U']) || value > i64::MAX as u64 {
        Ok(PPValue::unsigned(value))
    } else {
        Ok(PPValue::signed(value as i64))
    }
}

fn parse_char(text: &str) -> Result<PPValue, PPError> {
    let inner = text
        .trim_start_matches('L')
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .ok_or(PPError::InvalidConditionalExpression)?;
    let mut chars = inner.chars();
    let value = match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => '\n' as i64,
            Some('t') => '\t' as i64,
            Some('r') => '\r' as i64,
            Some('0') => 0,
            Some('a') => 7,
            Some('b') => 8,
            Some('f') => 12,
            Some('v') => 11,
            Some(c) => c as i64,
            None => return Err(PPError::InvalidConditionalExpression),
        },
        Some(c) => c as i64,
        None => return Err(PPError::InvalidConditionalExpression),
    };
    Ok(PPValue::signed(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang_options::LanguageFeatures;
    use crate::lexer::tokenize;

    fn eval(text: &str) -> Result<bool, PPError> {
        let mut tokens = tokenize(text, LanguageFeatures::default());
        tokens.pop();
        Interpreter::evaluate(&tokens)
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        assert_eq!(eval("1 + 2 * 3 == 7"), Ok(true));
        assert_eq!(eval("(1 + 2) * 3 == 7"), Ok(false));
        assert_eq!(eval("0x10 == 020"), Ok(true));
        assert_eq!(eval("1 << 4 > 15UL"), Ok(true));
        assert_eq!(eval("'a' == 97"), Ok(true));
        assert_eq!(eval("1 ? 0 : 1"), Ok(false));
        assert_eq!(eval("!UNDEFINED && ~0"), Ok(true));
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("1 / 0"), Err(PPError::DivisionByZero));
        assert_eq!(eval("0 && 1 / 0"), Ok(false));
        assert_eq!(eval("(1"), Err(PPError::InvalidConditionalExpression));
        assert_eq!(eval("1 2"), Err(PPError::InvalidConditionalExpression));
    }

    #[test]
    fn test_unsigned_arithmetic() {
        assert_eq!(eval("0xFFFFFFFFFFFFFFFF > 0"), Ok(true));
        assert_eq!(eval("18446744073709551615 == -1"), Ok(true));
        assert_eq!(eval("-1 < 0u"), Ok(false));
        assert_eq!(eval("-1 < 0"), Ok(true));
        assert_eq!(eval("-1 > 0U"), Ok(true));
        assert_eq!(eval("(0u - 1) / 2 > 0"), Ok(true));
        assert_eq!(eval("-4 / 2 == -2"), Ok(true));
        assert_eq!(eval("-8 >> 1 == -4"), Ok(true));
        assert_eq!(eval("0x7FFFFFFFFFFFFFFF > 0"), Ok(true));
    }
}
