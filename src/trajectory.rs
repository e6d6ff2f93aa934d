use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Signed;
use tracing::debug;

use crate::error::{LabelError, ParamsError};

/// 既定のステップ上限
pub const DEFAULT_STEP_LIMIT: u64 = 120_000;

/// 2分岐写像のパラメータ。
/// n ≡ 0 (mod even) なら n / even、そうでなければ odd·n + add。
/// 既定値 (2, 3, 1) が古典的コラッツ写像。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapParams {
    even: u64,
    odd: u64,
    add: i64,
}

impl Default for MapParams {
    fn default() -> Self {
        MapParams {
            even: 2,
            odd: 3,
            add: 1,
        }
    }
}

impl MapParams {
    pub fn new(even: u64, odd: u64, add: i64) -> Result<Self, ParamsError> {
        if even < 2 {
            return Err(ParamsError::EvenTooSmall(even));
        }
        if odd < 1 {
            return Err(ParamsError::OddTooSmall(odd));
        }
        Ok(MapParams { even, odd, add })
    }

    pub fn even(&self) -> u64 {
        self.even
    }

    pub fn odd(&self) -> u64 {
        self.odd
    }

    pub fn add(&self) -> i64 {
        self.add
    }

    /// 古典的コラッツ写像 (2, 3, 1) か
    pub fn is_classical(&self) -> bool {
        *self == MapParams::default()
    }
}

/// 1ステップの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 除算ステップ ('0')
    Even,
    /// 乗算+加算ステップ ('1')
    Odd,
}

/// ステップ列の2進ラベル（時系列順、'0' = 偶数ステップ、'1' = 奇数ステップ）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn parse(s: &str) -> Result<Self, LabelError> {
        if let Some((position, found)) = s.chars().enumerate().find(|&(_, c)| c != '0' && c != '1') {
            return Err(LabelError::InvalidChar { position, found });
        }
        Ok(Label(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// '1' の数（奇数ステップ数）
    pub fn ones(&self) -> u32 {
        self.0.bytes().filter(|&b| b == b'1').count() as u32
    }

    /// '0' の数（偶数ステップ数）
    pub fn zeros(&self) -> u32 {
        self.0.bytes().filter(|&b| b == b'0').count() as u32
    }

    pub fn steps(&self) -> impl Iterator<Item = Step> + '_ {
        self.0.bytes().map(|b| if b == b'1' { Step::Odd } else { Step::Even })
    }

    pub fn push(&mut self, step: Step) {
        self.0.push(match step {
            Step::Even => '0',
            Step::Odd => '1',
        });
    }

    /// ラベルを times 回繰り返したもの
    pub fn repeat(&self, times: usize) -> Label {
        Label(self.0.repeat(times))
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::parse(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 停止理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// |n| が開始値の絶対値以下に戻った
    ReachedFloor,
    /// ステップ上限に達した（結論なし。上限を増やして再試行できる）
    StepLimit,
}

/// 停止ラベル計算の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopResult {
    /// 開始値
    pub start: BigInt,
    /// 偶数ステップ数
    pub even_steps: u64,
    /// 奇数ステップ数
    pub odd_steps: u64,
    /// 総ステップ数
    pub total_steps: u64,
    /// ステップ列ラベル
    pub label: Label,
    /// 開始値と途中の値の最大値（停止時の値は含めない）
    pub max_value: BigInt,
    /// 停止時の値
    pub final_value: BigInt,
    pub halt: Halt,
}

impl StopResult {
    /// 開始値の絶対値以下に戻ったか（false ならステップ上限で打ち切り）
    pub fn is_conclusive(&self) -> bool {
        self.halt == Halt::ReachedFloor
    }
}

/// 訪問値の列付きの軌道
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trajectory {
    /// 開始値と、そこから1ステップ進めた各値（停止時の値 `result.final_value` は含めない）
    pub values: Vec<BigInt>,
    pub result: StopResult,
}

/// 古典的写像・既定上限での停止ラベル
pub fn find_collatz_stop_binary(n: &BigInt) -> StopResult {
    stop_binary_with(n, MapParams::default(), DEFAULT_STEP_LIMIT)
}

/// 少なくとも1ステップ進め、|n| ≤ |start| となるか limit ステップに達するまで反復する。
pub fn stop_binary_with(start: &BigInt, params: MapParams, limit: u64) -> StopResult {
    walk(start, params, limit, |_| {})
}

/// `stop_binary_with` と同じ反復で、ステップを進める前の値を順に記録する。
/// 長さは `result.total_steps` に等しい。
pub fn reducing_path(start: &BigInt, params: MapParams, limit: u64) -> Trajectory {
    let mut values = Vec::new();
    let result = walk(start, params, limit, |n| values.push(n.clone()));
    Trajectory { values, result }
}

fn walk(start: &BigInt, params: MapParams, limit: u64, mut visit: impl FnMut(&BigInt)) -> StopResult {
    let even = BigInt::from(params.even);
    let odd = BigInt::from(params.odd);
    let add = BigInt::from(params.add);
    let floor = start.abs();

    let mut n = start.clone();
    let mut max_value = start.clone();
    let mut label = Label::default();
    let mut even_steps = 0u64;
    let mut odd_steps = 0u64;

    // 最大値と訪問値はこれから1ステップ進める値だけを数える（停止時の値は含めない）
    let halt = loop {
        visit(&n);
        if n > max_value {
            max_value = n.clone();
        }

        if n.is_multiple_of(&even) {
            n /= &even;
            even_steps += 1;
            label.push(Step::Even);
        } else {
            n = &odd * &n + &add;
            odd_steps += 1;
            label.push(Step::Odd);
        }

        if n.abs() <= floor {
            break Halt::ReachedFloor;
        }
        if even_steps + odd_steps >= limit {
            debug!(start = %start, limit, "step limit reached before returning to the starting magnitude");
            break Halt::StepLimit;
        }
    };

    StopResult {
        start: start.clone(),
        even_steps,
        odd_steps,
        total_steps: even_steps + odd_steps,
        label,
        max_value,
        final_value: n,
        halt,
    }
}
