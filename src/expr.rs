//! 写像式 f(x) の小さな AST と評価器。
//!
//! 対応する構文は `+ - * / **`、括弧、変数 `x`、数値リテラル（`0.5` などの小数は
//! 正確な有理数として扱う）。優先順位は `**` > 単項マイナス > `* /` > `+ -` で、`**` は右結合かつ
//! 左側の単項マイナスより強く結合する（`-x**2 == -(x**2)`）。

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{EvalError, RuleError};

/// `**` の指数の上限（これを超える指数は評価を拒否する）
const MAX_EXPONENT: u32 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "**",
        }
    }
}

/// 写像式の構文木
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// 変数 x
    Var,
    /// 有理数リテラル
    Lit(BigRational),
    /// 単項マイナス
    Neg(Box<Expr>),
    /// 二項演算
    Bin(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// 式テキストを構文解析する。末尾に余分なトークンがあればエラー。
    pub fn parse(input: &str) -> Result<Expr, RuleError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens: &tokens,
            pos: 0,
        };
        let expr = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(parse_error(input, tok.offset, "unexpected trailing input"));
        }
        Ok(expr)
    }

    /// x を束縛して正確に評価する。
    pub fn eval(&self, x: &BigRational) -> Result<BigRational, EvalError> {
        match self {
            Expr::Var => Ok(x.clone()),
            Expr::Lit(v) => Ok(v.clone()),
            Expr::Neg(inner) => Ok(-inner.eval(x)?),
            Expr::Bin(op, lhs, rhs) => {
                let a = lhs.eval(x)?;
                let b = rhs.eval(x)?;
                match op {
                    BinOp::Add => Ok(a + b),
                    BinOp::Sub => Ok(a - b),
                    BinOp::Mul => Ok(a * b),
                    BinOp::Div => {
                        if b.is_zero() {
                            return Err(EvalError::DivisionByZero);
                        }
                        Ok(a / b)
                    }
                    BinOp::Pow => pow_rational(&a, &b),
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var => write!(f, "x"),
            Expr::Lit(v) => write!(f, "{}", v),
            Expr::Neg(inner) => write!(f, "-({})", inner),
            Expr::Bin(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}

fn pow_rational(base: &BigRational, exponent: &BigRational) -> Result<BigRational, EvalError> {
    if !exponent.is_integer() {
        return Err(EvalError::NonIntegerExponent(exponent.to_string()));
    }
    let e = exponent.to_integer();
    let magnitude = e
        .abs()
        .to_u32()
        .filter(|&m| m <= MAX_EXPONENT)
        .ok_or_else(|| EvalError::ExponentTooLarge(e.to_string()))?;

    let numer = base.numer().pow(magnitude);
    let denom = base.denom().pow(magnitude);
    if e.is_negative() {
        if numer.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        Ok(BigRational::new(denom, numer))
    } else {
        Ok(BigRational::new(numer, denom))
    }
}

// ============================================================
// 字句解析（条件式 `x % M == R` と共用）
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Num(BigRational),
    X,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    EqEq,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// 入力中の文字位置（エラー表示用）
    pub offset: usize,
}

pub(crate) fn parse_error(input: &str, position: usize, message: &str) -> RuleError {
    RuleError::Parse {
        input: input.to_string(),
        position,
        message: message.to_string(),
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, RuleError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let offset = i;
        let kind = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let (value, next) = lex_number(input, &chars, i)?;
                i = next;
                tokens.push(Token {
                    kind: TokenKind::Num(value),
                    offset,
                });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if name != "x" {
                    return Err(parse_error(input, start, &format!("unknown name `{}`", name)));
                }
                tokens.push(Token {
                    kind: TokenKind::X,
                    offset,
                });
                continue;
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                TokenKind::StarStar
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' if chars.get(i + 1) == Some(&'=') => {
                i += 1;
                TokenKind::EqEq
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            other => {
                return Err(parse_error(input, i, &format!("unexpected character `{}`", other)));
            }
        };
        i += 1;
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

/// 10進リテラルを正確な有理数として読む。`1.25` → 5/4
fn lex_number(input: &str, chars: &[char], start: usize) -> Result<(BigRational, usize), RuleError> {
    let mut i = start;
    let mut digits = String::new();
    let mut frac_len = 0u32;
    let mut seen_dot = false;

    while i < chars.len() {
        match chars[i] {
            d @ '0'..='9' => {
                digits.push(d);
                if seen_dot {
                    frac_len += 1;
                }
            }
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        i += 1;
    }

    if digits.is_empty() {
        return Err(parse_error(input, start, "malformed number"));
    }
    let numer: BigInt = digits
        .parse()
        .map_err(|_| parse_error(input, start, "malformed number"))?;
    let denom = BigInt::from(10u32).pow(frac_len);
    Ok((BigRational::new(numer, denom), i))
}

// ============================================================
// 再帰下降パーサ
// ============================================================

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|t| &t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn end_offset(&self) -> usize {
        self.input.chars().count()
    }

    // expr := term (('+'|'-') term)*
    fn expr(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.term()?;
        loop {
            let op = if self.eat(&TokenKind::Plus) {
                BinOp::Add
            } else if self.eat(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // term := factor (('*'|'/') factor)*
    fn term(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.factor()?;
        loop {
            let op = if self.eat(&TokenKind::Star) {
                BinOp::Mul
            } else if self.eat(&TokenKind::Slash) {
                BinOp::Div
            } else {
                return Ok(lhs);
            };
            let rhs = self.factor()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // factor := ('-'|'+') factor | power
    fn factor(&mut self) -> Result<Expr, RuleError> {
        if self.eat(&TokenKind::Minus) {
            return Ok(Expr::Neg(Box::new(self.factor()?)));
        }
        if self.eat(&TokenKind::Plus) {
            return self.factor();
        }
        self.power()
    }

    // power := atom ('**' factor)?
    fn power(&mut self) -> Result<Expr, RuleError> {
        let base = self.atom()?;
        if self.eat(&TokenKind::StarStar) {
            let exponent = self.factor()?;
            return Ok(Expr::Bin(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, RuleError> {
        let Some(tok) = self.peek() else {
            return Err(parse_error(self.input, self.end_offset(), "unexpected end of input"));
        };
        self.pos += 1;
        match &tok.kind {
            TokenKind::Num(v) => Ok(Expr::Lit(v.clone())),
            TokenKind::X => Ok(Expr::Var),
            TokenKind::LParen => {
                let inner = self.expr()?;
                if !self.eat(&TokenKind::RParen) {
                    let at = self.peek().map_or_else(|| self.end_offset(), |t| t.offset);
                    return Err(parse_error(self.input, at, "expected `)`"));
                }
                Ok(inner)
            }
            _ => Err(parse_error(self.input, tok.offset, "expected a number, `x` or `(`")),
        }
    }
}

/// 整数を有理数に持ち上げるヘルパー
pub(crate) fn ratio_of(n: &BigInt) -> BigRational {
    BigRational::new(n.clone(), BigInt::one())
}
