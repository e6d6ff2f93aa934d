//! 3^a·x − 2^b·y = −c の特殊解。
//!
//! gcd(3^a, 2^b) = 1 なので、(3^a, 2^b) に拡張ユークリッド互除法を適用し、
//! 記録したステップ列を後ろから畳み込んで（逆代入）1 の整数結合を得て、c 倍する。

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::debug;

use crate::coefficient;
use crate::error::SolveError;
use crate::trajectory::{Label, MapParams};

/// 互除法の1行: target = source·quotient + remainder。
/// factor は逆代入で使う係数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EuclidianStep {
    pub target: BigInt,
    pub source: BigInt,
    pub quotient: BigInt,
    pub remainder: BigInt,
    pub factor: BigInt,
}

impl EuclidianStep {
    /// target ÷ source（床除算、0 ≤ remainder < source）
    pub fn divide(target: BigInt, source: BigInt) -> Result<Self, SolveError> {
        if source.is_zero() {
            return Err(SolveError::DegenerateStep);
        }
        let (quotient, remainder) = target.div_mod_floor(&source);
        Ok(EuclidianStep {
            target,
            source,
            quotient,
            remainder,
            factor: BigInt::one(),
        })
    }

    /// 後段ステップ self と前段ステップ prior を1つに畳み込む。
    ///
    /// self が 1 = ±(factor·t − quotient·s) を表すとき、結果は prior の
    /// (target, source) について符号を反転した同じ形の恒等式を表す。
    pub fn back_substitution(&self, prior: &EuclidianStep) -> EuclidianStep {
        EuclidianStep {
            target: prior.source.clone(),
            source: self.target.clone(),
            factor: self.quotient.clone(),
            quotient: &self.factor + &self.quotient * &prior.quotient,
            remainder: BigInt::one(),
        }
    }
}

impl fmt::Display for EuclidianStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ({}) * {} + {}", self.target, self.quotient, self.source, self.remainder)
    }
}

/// 3^a·x − 2^b·y = −c
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiophantineProblem {
    pub power_of_three: u32,
    pub power_of_two: u32,
    pub constant: BigInt,
}

/// 特殊解 (x, y) と、一般解の周期 (2^b, 3^a)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub x: BigInt,
    pub y: BigInt,
    /// x の周期 2^b
    pub x_period: BigInt,
    /// y の周期 3^a
    pub y_period: BigInt,
}

impl Solution {
    /// 一般解 (x + k·2^b, y + k·3^a)
    pub fn general(&self, k: &BigInt) -> (BigInt, BigInt) {
        (&self.x + k * &self.x_period, &self.y + k * &self.y_period)
    }

    /// 0 ≤ x < 2^b となる解
    pub fn canonical(&self) -> Solution {
        let k = -self.x.div_floor(&self.x_period);
        let (x, y) = self.general(&k);
        Solution {
            x,
            y,
            x_period: self.x_period.clone(),
            y_period: self.y_period.clone(),
        }
    }

    /// 代入して方程式を満たすか
    pub fn satisfies(&self, problem: &DiophantineProblem) -> bool {
        let three = BigInt::from(3u32).pow(problem.power_of_three);
        let two = BigInt::from(2u32).pow(problem.power_of_two);
        three * &self.x - two * &self.y == -&problem.constant
    }
}

impl DiophantineProblem {
    pub fn new(power_of_three: u32, power_of_two: u32, constant: BigInt) -> Self {
        DiophantineProblem {
            power_of_three,
            power_of_two,
            constant,
        }
    }

    /// ラベルの '1' の数を a、'0' の数を b、古典的写像での係数を c とする
    pub fn from_label(label: &Label) -> Self {
        DiophantineProblem {
            power_of_three: label.ones(),
            power_of_two: label.zeros(),
            constant: coefficient::coefficient(label, MapParams::default()),
        }
    }

    /// (3^a, 2^b) の互除法ステップ列。先頭の商が 0 のステップは捨てる。
    /// 戻り値の bool は先頭ステップを捨てたか（= 2^b が target 側になったか）。
    pub fn euclidean_steps(&self) -> Result<(Vec<EuclidianStep>, bool), SolveError> {
        if self.power_of_three == 0 || self.power_of_two == 0 {
            return Err(SolveError::Domain {
                power_of_three: self.power_of_three,
                power_of_two: self.power_of_two,
            });
        }
        let three = BigInt::from(3u32).pow(self.power_of_three);
        let two = BigInt::from(2u32).pow(self.power_of_two);

        let mut steps = Vec::new();
        let mut step = EuclidianStep::divide(three, two)?;
        let swapped = step.quotient.is_zero();
        if !swapped {
            steps.push(step.clone());
        }
        while !step.remainder.is_one() {
            step = EuclidianStep::divide(step.source.clone(), step.remainder.clone())?;
            steps.push(step.clone());
        }
        Ok((steps, swapped))
    }

    /// 特殊解を求める。
    pub fn solve(&self) -> Result<Solution, SolveError> {
        let (steps, swapped) = self.euclidean_steps()?;
        let Some((last, earlier)) = steps.split_last() else {
            return Err(SolveError::DegenerateStep);
        };

        // 後ろから畳み込む
        let folded = earlier
            .iter()
            .rev()
            .fold(last.clone(), |later, prior| later.back_substitution(prior));

        // 畳み込み後: 1 = (−1)^(k−1) · (factor·t1 − quotient·s1)
        // (t1, s1) は先頭ステップを捨てていなければ (3^a, 2^b)、捨てていれば (2^b, 3^a)
        let k = steps.len();
        let even_count = k % 2 == 0;
        let scale = if even_count != swapped {
            self.constant.clone()
        } else {
            -&self.constant
        };
        let (x, y) = if swapped {
            (&scale * &folded.quotient, &scale * &folded.factor)
        } else {
            (&scale * &folded.factor, &scale * &folded.quotient)
        };

        debug!(
            power_of_three = self.power_of_three,
            power_of_two = self.power_of_two,
            steps = k,
            swapped,
            "solved 3^a x - 2^b y = -c"
        );

        Ok(Solution {
            x,
            y,
            x_period: BigInt::from(2u32).pow(self.power_of_two),
            y_period: BigInt::from(3u32).pow(self.power_of_three),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(a: u32, b: u32, c: i64) -> Solution {
        let problem = DiophantineProblem::new(a, b, BigInt::from(c));
        let solution = problem.solve().unwrap();
        assert!(solution.satisfies(&problem), "3^{} x - 2^{} y = {} not satisfied", a, b, -c);
        solution
    }

    #[test]
    fn test_single_step() {
        // 3 = 1·2 + 1
        let s = solve(1, 1, 1);
        assert_eq!((s.x, s.y), (BigInt::from(-1), BigInt::from(-1)));
    }

    #[test]
    fn test_dropped_first_step() {
        // 3 < 4: 先頭の商 0 のステップは捨てられる
        let problem = DiophantineProblem::new(1, 2, BigInt::from(1));
        let (steps, swapped) = problem.euclidean_steps().unwrap();
        assert!(swapped);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].target, BigInt::from(4));
        assert_eq!(steps[0].source, BigInt::from(3));
        solve(1, 2, 1);
    }

    #[test]
    fn test_two_steps_fold() {
        // 27 = 6·4 + 3, 4 = 1·3 + 1
        let problem = DiophantineProblem::new(3, 2, BigInt::from(1));
        let (steps, swapped) = problem.euclidean_steps().unwrap();
        assert!(!swapped);
        assert_eq!(steps.len(), 2);
        let folded = steps[1].back_substitution(&steps[0]);
        assert_eq!(folded.factor, BigInt::from(1));
        assert_eq!(folded.quotient, BigInt::from(7));
        let s = solve(3, 2, 1);
        assert_eq!((s.x, s.y), (BigInt::from(1), BigInt::from(7)));
    }

    #[test]
    fn test_step_display() {
        let problem = DiophantineProblem::new(3, 2, BigInt::from(1));
        let (steps, _) = problem.euclidean_steps().unwrap();
        let lines: Vec<String> = steps.iter().map(|s| s.to_string()).collect();
        assert_eq!(lines, vec!["27 = (6) * 4 + 3", "4 = (1) * 3 + 1"]);
    }

    #[test]
    fn test_remainders_follow_floor_division() {
        let problem = DiophantineProblem::new(7, 9, BigInt::from(5));
        let (steps, _) = problem.euclidean_steps().unwrap();
        for s in &steps {
            assert_eq!(s.target, &s.source * &s.quotient + &s.remainder);
            assert!(s.remainder >= BigInt::zero() && s.remainder < s.source);
        }
        assert!(steps.last().unwrap().remainder.is_one());
        for w in steps.windows(2) {
            assert_eq!(w[1].target, w[0].source);
            assert_eq!(w[1].source, w[0].remainder);
        }
    }

    #[test]
    fn test_domain_error() {
        for (a, b) in [(0, 3), (4, 0), (0, 0)] {
            assert_eq!(
                DiophantineProblem::new(a, b, BigInt::from(1)).solve(),
                Err(SolveError::Domain {
                    power_of_three: a,
                    power_of_two: b
                })
            );
        }
    }

    #[test]
    fn test_small_grid_by_substitution() {
        for a in 1..=12 {
            for b in 1..=12 {
                for c in [-7i64, 0, 1, 13] {
                    solve(a, b, c);
                }
            }
        }
    }

    #[test]
    fn test_canonical_and_general() {
        let s = solve(5, 8, 41);
        let canon = s.canonical();
        assert!(canon.x >= BigInt::zero() && canon.x < BigInt::from(256));
        let problem = DiophantineProblem::new(5, 8, BigInt::from(41));
        assert!(canon.satisfies(&problem));
        let (x, y) = s.general(&BigInt::from(-3));
        let shifted = Solution { x, y, ..s };
        assert!(shifted.satisfies(&problem));
    }
}
