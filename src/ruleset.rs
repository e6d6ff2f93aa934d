//! 一般化コラッツ写像の規則集合と、その検証（整合性・充足性）。
//!
//! ```text
//! T(x) = { f_0(x)  if x ≡ v_0 (mod m_0)
//!          f_1(x)  if x ≡ v_1 (mod m_1)
//!          ... }
//! ```
//!
//! 整合的 (conformative): 各法 m について、m 以下のすべての法が m を割り切る。
//! 例えば {2, 4, 4} は整合的だが、{2, 3, 6} は 2 ∤ 3 のため整合的でない。
//! 整合的でない規則集合は剰余類が必ず交差する。
//!
//! 充足的 (full): 最大法 m_max の全残基 {0, …, m_max−1} がちょうど1つの規則に
//! 割り当てられる（重複も欠落もない）。

use std::collections::{BTreeSet, HashMap};

use num_bigint::BigInt;
use num_rational::BigRational;
use tracing::warn;

use crate::error::{EvalError, RuleError};
use crate::rule::{Mapping, Rule};

/// `iterate` の既定ステップ上限
pub const DEFAULT_ITERATE_LIMIT: usize = 1000;

/// 受け付ける最大法の上限。充足性検査は 0..max_modulus の全残基を保持するため。
pub const MAX_MODULUS: u64 = 1 << 24;

/// 充足性検査の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// 全残基がちょうど1回ずつ割り当てられた
    Full,
    /// どの規則にも属さない残基がある
    Gap { missing: Vec<u64> },
    /// 残基 `residue` (mod `modulus`) が規則 `earlier_rule` と `rule` の両方に属する
    Overlap {
        residue: u64,
        modulus: u64,
        rule: usize,
        earlier_rule: usize,
    },
}

impl Coverage {
    pub fn is_full(&self) -> bool {
        matches!(self, Coverage::Full)
    }
}

/// 軌道の停止理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrbitHalt {
    /// values[start] と同じ値に戻った
    Cycle { start: usize },
    /// 写像の値が整数でなくなった
    NonInteger(BigRational),
    /// どの規則にも属さない値に到達した
    Uncovered,
    /// ステップ上限に達した
    StepLimit,
}

/// 一般化写像の軌道
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orbit {
    /// 開始値を含む訪問値の列
    pub values: Vec<BigInt>,
    pub halt: OrbitHalt,
}

/// 規則集合。構築後は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    max_modulus: u64,
}

impl RuleSet {
    /// 条件テキスト列と写像テキスト列から規則集合を構築する（順序対応）。
    pub fn new<C, M>(conditions: &[C], mappings: &[M]) -> Result<Self, RuleError>
    where
        C: AsRef<str>,
        M: AsRef<str>,
    {
        if conditions.len() != mappings.len() {
            return Err(RuleError::CountMismatch {
                conditions: conditions.len(),
                mappings: mappings.len(),
            });
        }
        let (pairs, functions) = crate::rule::extract_rules(conditions, mappings)?;
        let rules = pairs
            .into_iter()
            .zip(functions)
            .map(|((modulus, residue), mapping)| Rule::new(modulus, residue, mapping))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rules(rules)
    }

    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let max_modulus = rules
            .iter()
            .map(Rule::modulus)
            .max()
            .ok_or(RuleError::Empty)?;
        if max_modulus > MAX_MODULUS {
            return Err(RuleError::ModulusTooLarge {
                modulus: max_modulus,
                limit: MAX_MODULUS,
            });
        }
        Ok(RuleSet { rules, max_modulus })
    }

    /// 写像を持たない条件だけの規則集合（検証専用、写像は恒等写像）
    pub fn from_conditions<C: AsRef<str>>(conditions: &[C]) -> Result<Self, RuleError> {
        let identity = vec!["x"; conditions.len()];
        Self::new(conditions, identity.as_slice())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn max_modulus(&self) -> u64 {
        self.max_modulus
    }

    /// 全規則の法（重複を含む、規則順）
    pub fn moduli(&self) -> Vec<u64> {
        self.rules.iter().map(Rule::modulus).collect()
    }

    /// 各法 m について、m 以下のすべての法が m を割り切るか。
    pub fn is_conformative(&self) -> bool {
        let distinct: BTreeSet<u64> = self.rules.iter().map(Rule::modulus).collect();
        distinct.iter().all(|&m| {
            self.rules
                .iter()
                .map(Rule::modulus)
                .filter(|&t| t <= m)
                .all(|t| m % t == 0)
        })
    }

    /// 残基集合 {0, …, max_modulus−1} を規則順に消し込み、結果を返す。
    /// 時間・メモリとも O(max_modulus)（上限は `MAX_MODULUS`）。
    ///
    /// 前提: `is_conformative()` が真であること。整合的でない規則集合に対しては
    /// 誤解を招く判定を返しうる。
    pub fn coverage(&self) -> Coverage {
        let mut unclaimed: BTreeSet<u64> = (0..self.max_modulus).collect();

        for (idx, rule) in self.rules.iter().enumerate() {
            let mut r = rule.residue();
            while r < self.max_modulus {
                if !unclaimed.remove(&r) {
                    let earlier_rule = self.rules[..idx]
                        .iter()
                        .position(|earlier| earlier.claims(r))
                        .unwrap_or(idx);
                    return Coverage::Overlap {
                        residue: r,
                        modulus: self.max_modulus,
                        rule: idx,
                        earlier_rule,
                    };
                }
                r += rule.modulus();
            }
        }

        if unclaimed.is_empty() {
            Coverage::Full
        } else {
            Coverage::Gap {
                missing: unclaimed.into_iter().collect(),
            }
        }
    }

    /// 充足性の真偽。重複・欠落は warn ログで報告する。
    ///
    /// 前提は `coverage()` と同じ（整合性を先に確認すること）。
    pub fn is_full(&self) -> bool {
        match self.coverage() {
            Coverage::Full => true,
            Coverage::Overlap {
                residue,
                modulus,
                rule,
                earlier_rule,
            } => {
                warn!(
                    residue,
                    modulus,
                    rule = %self.rules[rule],
                    earlier_rule = %self.rules[earlier_rule],
                    "overlapping residue {} mod {}",
                    residue,
                    modulus
                );
                false
            }
            Coverage::Gap { missing } => {
                warn!(
                    modulus = self.max_modulus,
                    count = missing.len(),
                    "uncovered residues mod {}: {:?}",
                    self.max_modulus,
                    missing
                );
                false
            }
        }
    }

    /// 整合的かつ充足的
    pub fn is_complete(&self) -> bool {
        self.is_conformative() && self.is_full()
    }

    /// x が属する最初の規則（規則順）
    pub fn rule_for(&self, x: &BigInt) -> Option<(usize, &Rule)> {
        self.rules.iter().enumerate().find(|(_, rule)| rule.matches(x))
    }

    /// 一般化写像 T(x)。どの規則にも属さなければ None。
    pub fn apply(&self, x: &BigInt) -> Result<Option<BigRational>, EvalError> {
        self.rule_for(x)
            .map(|(_, rule)| rule.mapping().call(x))
            .transpose()
    }

    /// 写像を反復する。整数でない値・未定義の値・既出の値に到達するか、
    /// limit ステップで停止する。
    pub fn iterate(&self, start: &BigInt, limit: usize) -> Result<Orbit, EvalError> {
        let mut values = vec![start.clone()];
        let mut seen: HashMap<BigInt, usize> = HashMap::new();
        seen.insert(start.clone(), 0);
        let mut current = start.clone();

        for _ in 0..limit {
            let Some(next) = self.apply(&current)? else {
                return Ok(Orbit {
                    values,
                    halt: OrbitHalt::Uncovered,
                });
            };
            if !next.is_integer() {
                return Ok(Orbit {
                    values,
                    halt: OrbitHalt::NonInteger(next),
                });
            }
            current = next.to_integer();
            if let Some(&first) = seen.get(&current) {
                values.push(current);
                return Ok(Orbit {
                    values,
                    halt: OrbitHalt::Cycle { start: first },
                });
            }
            seen.insert(current.clone(), values.len());
            values.push(current.clone());
        }

        Ok(Orbit {
            values,
            halt: OrbitHalt::StepLimit,
        })
    }

    /// 規則ごとの写像（規則順）
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.rules.iter().map(Rule::mapping)
    }
}
