use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::trajectory::{self, MapParams};

/// 1チャンクあたりの開始値の数
const CHUNK_SIZE: i64 = 10_000;

/// 範囲調査の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyResult {
    /// 調べた開始値の数
    pub total_checked: u64,
    /// 全開始値が上限内で開始値の絶対値以下に戻ったか
    pub all_conclusive: bool,
    /// 最長の総ステップ数
    pub longest_total_steps: u64,
    /// 最長の総ステップ数を持つ開始値
    pub longest_start: BigInt,
    /// 観測した最大値
    pub highest_value: BigInt,
    /// 最大値を観測した開始値
    pub highest_start: BigInt,
    /// ステップ上限で打ち切られた開始値（昇順）
    pub inconclusive: Vec<BigInt>,
}

impl SurveyResult {
    fn empty(start: &BigInt) -> Self {
        SurveyResult {
            total_checked: 0,
            all_conclusive: true,
            longest_total_steps: 0,
            longest_start: start.clone(),
            highest_value: start.clone(),
            highest_start: start.clone(),
            inconclusive: Vec::new(),
        }
    }

    fn record(&mut self, n: &BigInt, params: MapParams, limit: u64) {
        let r = trajectory::stop_binary_with(n, params, limit);
        self.total_checked += 1;

        if self.total_checked == 1
            || r.total_steps > self.longest_total_steps
            || (r.total_steps == self.longest_total_steps && *n < self.longest_start)
        {
            self.longest_total_steps = r.total_steps;
            self.longest_start = n.clone();
        }
        if self.total_checked == 1
            || r.max_value > self.highest_value
            || (r.max_value == self.highest_value && *n < self.highest_start)
        {
            self.highest_value = r.max_value.clone();
            self.highest_start = n.clone();
        }
        if !r.is_conclusive() {
            self.all_conclusive = false;
            self.inconclusive.push(n.clone());
        }
    }

    /// 2つの部分結果を合成する。同値なら小さい開始値を優先するので合成順に依存しない。
    fn merge(mut self, other: SurveyResult) -> SurveyResult {
        if other.total_checked == 0 {
            return self;
        }
        if self.total_checked == 0 {
            return other;
        }
        if other.longest_total_steps > self.longest_total_steps
            || (other.longest_total_steps == self.longest_total_steps && other.longest_start < self.longest_start)
        {
            self.longest_total_steps = other.longest_total_steps;
            self.longest_start = other.longest_start;
        }
        if other.highest_value > self.highest_value
            || (other.highest_value == self.highest_value && other.highest_start < self.highest_start)
        {
            self.highest_value = other.highest_value;
            self.highest_start = other.highest_start;
        }
        self.total_checked += other.total_checked;
        self.all_conclusive &= other.all_conclusive;
        self.inconclusive.extend(other.inconclusive);
        self
    }
}

/// [start, end] の全整数で停止ラベルを計算する（シングルスレッド版）。
/// progress_callback: (完了数, 総数) を定期的に呼ぶ。
pub fn survey_range(
    start: &BigInt,
    end: &BigInt,
    params: MapParams,
    limit: u64,
    progress_callback: impl Fn(u64, u64),
) -> SurveyResult {
    let total = if end >= start {
        (end - start + BigInt::one()).to_u64().unwrap_or(u64::MAX)
    } else {
        0
    };

    let mut result = SurveyResult::empty(start);
    let mut n = start.clone();
    while n <= *end {
        result.record(&n, params, limit);
        if result.total_checked % 1000 == 0 {
            progress_callback(result.total_checked, total);
        }
        n += 1u32;
    }
    progress_callback(result.total_checked, total);
    result
}

/// [start, end] の全整数で停止ラベルを計算する（並列版）。
/// Rayon でチャンク分割して並列処理。i64 に収まらない範囲はシングルスレッド版に任せる。
pub fn survey_range_parallel(
    start: &BigInt,
    end: &BigInt,
    params: MapParams,
    limit: u64,
    progress_callback: impl Fn(u64, u64) + Sync,
) -> SurveyResult {
    match (start.to_i64(), end.to_i64()) {
        (Some(s), Some(e)) => survey_range_parallel_i64(s, e, params, limit, &progress_callback),
        _ => survey_range(start, end, params, limit, progress_callback),
    }
}

fn survey_range_parallel_i64(
    start: i64,
    end: i64,
    params: MapParams,
    limit: u64,
    progress_callback: &(impl Fn(u64, u64) + Sync),
) -> SurveyResult {
    let first = BigInt::from(start);
    if start > end {
        return SurveyResult::empty(&first);
    }

    let total = (end as i128 - start as i128 + 1) as u64;
    let num_chunks = (total as i128 + CHUNK_SIZE as i128 - 1) / CHUNK_SIZE as i128;
    let global_done = AtomicU64::new(0);

    let mut result = (0..num_chunks as i64)
        .into_par_iter()
        .map(|chunk_idx| {
            let chunk_start = start as i128 + chunk_idx as i128 * CHUNK_SIZE as i128;
            let chunk_end = (chunk_start + CHUNK_SIZE as i128 - 1).min(end as i128);

            let mut local = SurveyResult::empty(&BigInt::from(chunk_start));
            let mut unreported = 0u64;
            let mut n = chunk_start;
            while n <= chunk_end {
                local.record(&BigInt::from(n), params, limit);
                unreported += 1;
                n += 1;

                // チャンク内でも定期的に進捗報告
                if unreported >= 100 {
                    let done = global_done.fetch_add(unreported, Ordering::Relaxed) + unreported;
                    progress_callback(done, total);
                    unreported = 0;
                }
            }
            if unreported > 0 {
                let done = global_done.fetch_add(unreported, Ordering::Relaxed) + unreported;
                progress_callback(done, total);
            }
            local
        })
        .reduce(|| SurveyResult::empty(&first), SurveyResult::merge);

    result.inconclusive.sort();
    result
}
