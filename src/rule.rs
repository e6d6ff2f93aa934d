//! 規則抽出: `x % M == R` 形式の条件テキストと写像式テキストを
//! (M, R) の組と評価可能な写像に変換する。

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::ToPrimitive;

use crate::error::{EvalError, RuleError};
use crate::expr::{self, Expr, TokenKind};

/// 評価可能な写像 f(x)。元のテキストも保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    source: String,
    expr: Expr,
}

impl Mapping {
    pub fn parse(source: &str) -> Result<Self, RuleError> {
        Ok(Mapping {
            source: source.trim().to_string(),
            expr: Expr::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// 整数 x での値
    pub fn call(&self, x: &BigInt) -> Result<BigRational, EvalError> {
        self.expr.eval(&expr::ratio_of(x))
    }

    /// 有理数 x での値
    pub fn call_rational(&self, x: &BigRational) -> Result<BigRational, EvalError> {
        self.expr.eval(x)
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// 1つの規則: x ≡ residue (mod modulus) のとき mapping を適用する。
/// 不変条件: residue < modulus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    modulus: u64,
    residue: u64,
    mapping: Mapping,
}

impl Rule {
    pub fn new(modulus: u64, residue: u64, mapping: Mapping) -> Result<Self, RuleError> {
        if modulus == 0 {
            return Err(RuleError::ZeroModulus {
                input: format!("x % 0 == {}", residue),
            });
        }
        if residue >= modulus {
            return Err(RuleError::ResidueOutOfRange { residue, modulus });
        }
        Ok(Rule {
            modulus,
            residue,
            mapping,
        })
    }

    /// 条件テキストと写像テキストから規則を作る
    pub fn parse(condition: &str, mapping: &str) -> Result<Self, RuleError> {
        let (modulus, residue) = parse_condition(condition)?;
        Rule::new(modulus, residue, Mapping::parse(mapping)?)
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn residue(&self) -> u64 {
        self.residue
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// 残基 r（0 ≤ r < max_modulus）がこの規則の剰余類に属するか
    #[inline]
    pub fn claims(&self, r: u64) -> bool {
        r % self.modulus == self.residue
    }

    /// 任意の整数 x がこの規則の剰余類に属するか（負数は床除算の剰余で判定）
    pub fn matches(&self, x: &BigInt) -> bool {
        use num_integer::Integer;
        let m = BigInt::from(self.modulus);
        x.mod_floor(&m) == BigInt::from(self.residue)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x % {} == {} => {}", self.modulus, self.residue, self.mapping)
    }
}

/// `x % M == R` を (M, R) に変換する。
/// 比較演算子は `==` のみ、M と R は非負整数リテラルのみ受け付ける。
pub fn parse_condition(condition: &str) -> Result<(u64, u64), RuleError> {
    let tokens = expr::tokenize(condition)?;

    if !tokens.iter().any(|t| t.kind == TokenKind::Percent) {
        return Err(RuleError::MissingModulus {
            input: condition.to_string(),
        });
    }

    let shape_error = |idx: usize| {
        let at = tokens
            .get(idx)
            .map_or_else(|| condition.chars().count(), |t| t.offset);
        expr::parse_error(condition, at, "expected `x % M == R` with integer literals")
    };

    if tokens.len() != 5 {
        return Err(shape_error(tokens.len().min(5)));
    }
    if tokens[0].kind != TokenKind::X {
        return Err(shape_error(0));
    }
    if tokens[1].kind != TokenKind::Percent {
        return Err(shape_error(1));
    }
    if tokens[3].kind != TokenKind::EqEq {
        return Err(shape_error(3));
    }

    let literal = |idx: usize| -> Result<u64, RuleError> {
        match &tokens[idx].kind {
            TokenKind::Num(v) if v.is_integer() => v.to_integer().to_u64().ok_or_else(|| shape_error(idx)),
            _ => Err(shape_error(idx)),
        }
    };
    let modulus = literal(2)?;
    let residue = literal(4)?;

    if modulus == 0 {
        return Err(RuleError::ZeroModulus {
            input: condition.to_string(),
        });
    }
    if residue >= modulus {
        return Err(RuleError::ResidueOutOfRange { residue, modulus });
    }
    Ok((modulus, residue))
}

/// 条件列と写像列を順序どおりに抽出する。
/// 戻り値: ((M, R) の列, 写像の列)
pub fn extract_rules<C, M>(conditions: &[C], mappings: &[M]) -> Result<(Vec<(u64, u64)>, Vec<Mapping>), RuleError>
where
    C: AsRef<str>,
    M: AsRef<str>,
{
    let pairs = conditions
        .iter()
        .map(|c| parse_condition(c.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let functions = mappings
        .iter()
        .map(|m| Mapping::parse(m.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((pairs, functions))
}
