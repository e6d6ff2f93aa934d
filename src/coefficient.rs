//! ラベル列から定数 c を求める。
//!
//! 偶数ステップ v → v/e、奇数ステップ v → o·v + a を記号的に展開すると、
//! 開始値 n、終了値 f、ラベル中の '0' の数 z、'1' の数 k について
//!
//! ```text
//! e^z · f = o^k · n + c,   c = a · Σ_{位置 i が '1'} o^(i より後の '1' の数) · e^(i より前の '0' の数)
//! ```
//!
//! が成り立つ。x = n, y = f とおけば o^k·x − e^z·y = −c となり、
//! 古典的写像 (2, 3, 1) ではディオファントス方程式 3^k·x − 2^z·y = −c そのもの。

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::Zero;

use crate::trajectory::{Label, MapParams, Step};

/// ラベルに対する定数 c（任意精度）
pub fn coefficient(label: &Label, params: MapParams) -> BigInt {
    let even = BigInt::from(params.even());
    let odd = BigInt::from(params.odd());
    let ones = label.ones();
    if ones == 0 {
        return BigInt::zero();
    }

    // odd^(残り '1' の数) を割り算で減らしていく
    let mut odd_pow = odd.pow(ones - 1);
    let mut even_pow = BigInt::from(1u32);
    let mut remaining = ones;
    let mut c = BigInt::zero();

    for step in label.steps() {
        match step {
            Step::Odd => {
                remaining -= 1;
                c += &odd_pow * &even_pow;
                if remaining > 0 {
                    odd_pow /= &odd;
                }
            }
            Step::Even => even_pow *= &even,
        }
    }
    c * BigInt::from(params.add())
}

/// 閉じた式 (o^k·n + c) / e^z。ラベルが n の実際の軌道なら終了値に一致する。
pub fn closed_form(label: &Label, n: &BigInt, params: MapParams) -> BigRational {
    let odd = BigInt::from(params.odd());
    let even = BigInt::from(params.even());
    let numer = odd.pow(label.ones()) * n + coefficient(label, params);
    BigRational::new(numer, even.pow(label.zeros()))
}

/// 短縮写像（奇数ステップの直後に1回の除算を含める）での定数 c。
/// e^(z+k) · f = o^k · n + c が成り立つ。
pub fn shortcut_coefficient(label: &Label, params: MapParams) -> BigInt {
    let even = BigInt::from(params.even());
    let odd = BigInt::from(params.odd());
    let mut remaining = label.ones();
    let mut divisions = 0u32;
    let mut c = BigInt::zero();

    for step in label.steps() {
        match step {
            Step::Odd => {
                remaining -= 1;
                c += odd.pow(remaining) * even.pow(divisions);
                divisions += 1;
            }
            Step::Even => divisions += 1,
        }
    }
    c * BigInt::from(params.add())
}

/// 短縮写像での e^(z+k) − o^k
pub fn diff_of_powers(label: &Label, params: MapParams) -> BigInt {
    let ones = label.ones();
    let even = BigInt::from(params.even());
    let odd = BigInt::from(params.odd());
    even.pow(label.zeros() + ones) - odd.pow(ones)
}

/// 短縮写像の周期判定に使う組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutCycle {
    pub coefficient: BigInt,
    pub modulus: BigInt,
    /// coefficient mod modulus（床除算の剰余、符号は modulus に従う）
    pub residue: BigInt,
}

impl ShortcutCycle {
    /// ラベルを繰り返す整数周期が存在する
    pub fn is_integer_cycle(&self) -> bool {
        self.residue.is_zero()
    }

    /// 周期の開始値 c / m
    pub fn start(&self) -> BigRational {
        BigRational::new(self.coefficient.clone(), self.modulus.clone())
    }
}

/// (c, m, c mod m)。m = 0（空ラベル）のときは None。
pub fn shortcut_cycle(label: &Label, params: MapParams) -> Option<ShortcutCycle> {
    let modulus = diff_of_powers(label, params);
    if modulus.is_zero() {
        return None;
    }
    let coefficient = shortcut_coefficient(label, params);
    let residue = coefficient.mod_floor(&modulus);
    Some(ShortcutCycle {
        coefficient,
        modulus,
        residue,
    })
}

/// ラベルを無限に繰り返す軌道の有理数不動点 c / (e^z − o^k)。
/// 分母が 0 なら None。
pub fn rational_cycle(label: &Label, params: MapParams) -> Option<BigRational> {
    let even = BigInt::from(params.even());
    let odd = BigInt::from(params.odd());
    let denom = even.pow(label.zeros()) - odd.pow(label.ones());
    if denom.is_zero() {
        return None;
    }
    Some(BigRational::new(coefficient(label, params), denom))
}

/// 長さ bit_count の全ラベルを辞書順（'0' < '1'）で列挙する。
/// 末尾から繰り上げる odometer 方式なので長さに上限はない（2^bit_count 個を遅延生成）。
pub fn labels(bit_count: u32) -> impl Iterator<Item = Label> {
    let first = vec![Step::Even; bit_count as usize];
    std::iter::successors(Some(first), |prev| {
        let mut next = prev.clone();
        let mut i = next.len();
        while i > 0 {
            i -= 1;
            if next[i] == Step::Even {
                next[i] = Step::Odd;
                return Some(next);
            }
            next[i] = Step::Even;
        }
        None
    })
    .map(|steps| {
        let mut label = Label::default();
        for step in steps {
            label.push(step);
        }
        label
    })
}
