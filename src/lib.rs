//! 一般化コラッツ型写像の解析
//!
//! - 規則抽出: `x % M == R` 条件と写像式 f(x) を (M, R) と評価可能な写像に変換
//! - 規則集合の検証: 整合性（法の整除鎖）と充足性（最大法の全残基をちょうど1回被覆）
//! - 停止ラベル: 2分岐写像の軌道を '0'（除算）/'1'（乗算+加算）列に符号化
//! - 係数関数: ラベルから e^z·f = o^k·n + c の c を求める
//! - ディオファントスソルバ: 拡張ユークリッド互除法の逆代入で 3^a·x − 2^b·y = −c を解く

pub mod coefficient;
pub mod diophantine;
pub mod error;
pub mod expr;
pub mod rule;
pub mod ruleset;
pub mod survey;
pub mod trajectory;

pub use coefficient::{closed_form, coefficient, diff_of_powers, labels, rational_cycle, shortcut_coefficient, shortcut_cycle, ShortcutCycle};
pub use diophantine::{DiophantineProblem, EuclidianStep, Solution};
pub use error::{EvalError, LabelError, ParamsError, RuleError, SolveError};
pub use expr::Expr;
pub use rule::{extract_rules, parse_condition, Mapping, Rule};
pub use ruleset::{Coverage, Orbit, OrbitHalt, RuleSet, DEFAULT_ITERATE_LIMIT, MAX_MODULUS};
pub use survey::{survey_range, survey_range_parallel, SurveyResult};
pub use trajectory::{find_collatz_stop_binary, reducing_path, stop_binary_with, Halt, Label, MapParams, Step, StopResult, Trajectory, DEFAULT_STEP_LIMIT};
