use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use collatz_rules::*;
use num_bigint::BigInt;
use std::fs::File;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 一般化コラッツ型写像の解析ツール
#[derive(Parser)]
#[command(name = "collatz-rules", version, about = "一般化コラッツ型写像: 規則検証・停止ラベル・3^a x - 2^b y = -c")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone, Copy)]
struct MapArgs {
    /// 除算ステップの除数
    #[arg(long, default_value_t = 2)]
    even: u64,
    /// 奇数ステップの乗数
    #[arg(long, default_value_t = 3)]
    odd: u64,
    /// 奇数ステップの加数
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    add: i64,
    /// 1開始値あたりの最大ステップ数
    #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
    limit: u64,
}

impl MapArgs {
    fn params(&self) -> Result<MapParams> {
        Ok(MapParams::new(self.even, self.odd, self.add)?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// 規則集合の整合性・充足性を検証する
    Rules {
        /// "x % M == R => 写像式" 形式の規則（順序どおり）
        #[arg(long = "rule", required = true)]
        rules: Vec<String>,
        /// この値で写像を評価する
        #[arg(long, allow_hyphen_values = true)]
        apply: Option<BigInt>,
        /// この値から写像を反復する
        #[arg(long, allow_hyphen_values = true)]
        iterate: Option<BigInt>,
        /// 反復の最大ステップ数
        #[arg(long, default_value_t = DEFAULT_ITERATE_LIMIT)]
        iterate_limit: usize,
    },
    /// 開始値 n の停止ラベルと係数 c、対応するディオファントス方程式の解
    Stop {
        #[arg(allow_hyphen_values = true)]
        n: BigInt,
        #[command(flatten)]
        map: MapArgs,
    },
    /// 3^a x - 2^b y = -c を解く
    Solve {
        a: u32,
        b: u32,
        #[arg(allow_hyphen_values = true)]
        c: BigInt,
    },
    /// [start, end] の全整数の停止ラベルを並列に調べる
    Survey {
        #[arg(allow_hyphen_values = true)]
        start: BigInt,
        #[arg(allow_hyphen_values = true)]
        end: BigInt,
        #[command(flatten)]
        map: MapArgs,
        /// スレッド数（省略時は全コア）
        #[arg(long)]
        threads: Option<usize>,
        /// サマリーの保存先ディレクトリ
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match Cli::parse().command {
        Command::Rules {
            rules,
            apply,
            iterate,
            iterate_limit,
        } => cmd_rules(&rules, apply.as_ref(), iterate.as_ref(), iterate_limit),
        Command::Stop { n, map } => cmd_stop(&n, &map),
        Command::Solve { a, b, c } => cmd_solve(a, b, c),
        Command::Survey {
            start,
            end,
            map,
            threads,
            output,
        } => cmd_survey(&start, &end, &map, threads, output.as_deref()),
    }
}

fn split_rule(text: &str) -> Result<(&str, &str)> {
    text.split_once("=>")
        .map(|(cond, mapping)| (cond.trim(), mapping.trim()))
        .ok_or_else(|| anyhow!("規則 `{}` に `=>` がありません (例: \"x % 2 == 0 => x / 2\")", text))
}

fn cmd_rules(texts: &[String], apply: Option<&BigInt>, iterate: Option<&BigInt>, iterate_limit: usize) -> Result<()> {
    let (conditions, mappings): (Vec<&str>, Vec<&str>) = texts
        .iter()
        .map(|t| split_rule(t))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unzip();
    let set = RuleSet::new(conditions.as_slice(), mappings.as_slice())?;

    println!("規則 (最大法 = {})", set.max_modulus());
    for (i, rule) in set.rules().iter().enumerate() {
        println!("  [{}] {}", i, rule);
    }
    println!();

    let conformative = set.is_conformative();
    println!("整合的 (conformative) = {}", if conformative { "はい" } else { "いいえ" });
    if conformative {
        match set.coverage() {
            Coverage::Full => println!("充足的 (full)         = はい"),
            Coverage::Gap { missing } => {
                println!("充足的 (full)         = いいえ (欠落)");
                println!("  mod {} で未被覆の残基: {:?}", set.max_modulus(), missing);
            }
            Coverage::Overlap {
                residue,
                modulus,
                rule,
                earlier_rule,
            } => {
                println!("充足的 (full)         = いいえ (重複)");
                println!(
                    "  残基 {} mod {} が規則 [{}] と [{}] の両方に属する",
                    residue, modulus, earlier_rule, rule
                );
            }
        }
    } else {
        println!("充足性は整合的な規則集合でのみ判定できます");
    }
    println!("完全 (complete)       = {}", if set.is_complete() { "はい" } else { "いいえ" });

    if let Some(x) = apply {
        println!();
        match set.apply(x)? {
            Some(v) => println!("T({}) = {}", x, v),
            None => println!("T({}) は未定義 (どの規則にも属さない)", x),
        }
    }

    if let Some(x) = iterate {
        let orbit = set.iterate(x, iterate_limit)?;
        println!();
        println!("軌道 ({} 値):", orbit.values.len());
        for (i, v) in orbit.values.iter().enumerate() {
            println!("  {:>6}  {}", i, format_big(v));
        }
        match orbit.halt {
            OrbitHalt::Cycle { start } => println!("停止: 周期 (値 #{} に戻った)", start),
            OrbitHalt::NonInteger(v) => println!("停止: 整数でない値 {}", v),
            OrbitHalt::Uncovered => println!("停止: どの規則にも属さない値"),
            OrbitHalt::StepLimit => println!("停止: ステップ上限 {}", iterate_limit),
        }
    }
    Ok(())
}

fn cmd_stop(n: &BigInt, map: &MapArgs) -> Result<()> {
    let params = map.params()?;
    let timer = Instant::now();
    let result = stop_binary_with(n, params, map.limit);
    let elapsed = timer.elapsed();

    println!("n = {}", format_big(n));
    println!("写像 = n/{} (n ≡ 0 mod {}) | {}n{:+}", params.even(), params.even(), params.odd(), params.add());
    println!();
    println!("--- 結果 ---");
    println!("偶数ステップ = {}", result.even_steps);
    println!("奇数ステップ = {}", result.odd_steps);
    println!("総ステップ   = {}", result.total_steps);
    println!("ラベル       = {}", format_label(&result.label));
    println!("最大値       = {}", format_big(&result.max_value));
    println!("終了値       = {}", format_big(&result.final_value));
    match result.halt {
        Halt::ReachedFloor => println!("停止理由     = |n| 以下に到達"),
        Halt::StepLimit => println!("停止理由     = ステップ上限 {} (結論なし、--limit を増やして再試行)", map.limit),
    }

    let c = coefficient(&result.label, params);
    println!();
    println!("c = {}", format_big(&c));
    println!(
        "{}^{}·f = {}^{}·n + c",
        params.even(),
        result.label.zeros(),
        params.odd(),
        result.label.ones()
    );

    if params.is_classical() {
        let problem = DiophantineProblem::from_label(&result.label);
        match problem.solve() {
            Ok(solution) => {
                let canon = solution.canonical();
                println!();
                println!("--- D(x, y): 3^{} x - 2^{} y = -c ---", problem.power_of_three, problem.power_of_two);
                println!("特殊解 x = {}", format_big(&solution.x));
                println!("特殊解 y = {}", format_big(&solution.y));
                println!("正規解 x = {} (0 ≤ x < 2^{})", format_big(&canon.x), problem.power_of_two);
                println!("正規解 y = {}", format_big(&canon.y));
            }
            Err(e) => println!("\nディオファントス方程式は解けません: {}", e),
        }
    }
    println!("計算時間 = {:?}", elapsed);
    Ok(())
}

fn cmd_solve(a: u32, b: u32, c: BigInt) -> Result<()> {
    let problem = DiophantineProblem::new(a, b, c);
    let timer = Instant::now();
    let solution = problem.solve()?;
    let elapsed = timer.elapsed();
    let canon = solution.canonical();

    println!("3^{} x - 2^{} y = {}", a, b, format_big(&-&problem.constant));
    println!();
    let (steps, _) = problem.euclidean_steps()?;
    println!("--- 互除法 ({} ステップ) ---", steps.len());
    for step in steps.iter().take(40) {
        println!("  {}", step);
    }
    if steps.len() > 40 {
        println!("  ... (残り {} ステップ)", steps.len() - 40);
    }
    println!();
    println!("特殊解 x = {}", format_big(&solution.x));
    println!("特殊解 y = {}", format_big(&solution.y));
    println!("正規解 x = {}", format_big(&canon.x));
    println!("正規解 y = {}", format_big(&canon.y));
    println!("一般解   = (x + k·2^{}, y + k·3^{})", b, a);
    println!("代入検算 = {}", if solution.satisfies(&problem) { "OK" } else { "NG" });
    println!("計算時間 = {:?}", elapsed);
    Ok(())
}

fn cmd_survey(start: &BigInt, end: &BigInt, map: &MapArgs, threads: Option<usize>, output: Option<&Path>) -> Result<()> {
    let params = map.params()?;
    if let Some(t) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(t)
            .build_global()
            .context("スレッドプールを初期化できません")?;
    }
    let num_threads = rayon::current_num_threads();

    println!("範囲調査: [{}, {}]", start, end);
    println!("(最大 {} ステップ/数、{}スレッド並列)", map.limit, num_threads);
    println!();

    let timer = Instant::now();
    let last_print = Mutex::new(Instant::now());
    let result = survey_range_parallel(start, end, params, map.limit, |done, total| {
        if total == 0 {
            return;
        }
        let now = Instant::now();
        if let Ok(mut lp) = last_print.try_lock() {
            if now.duration_since(*lp).as_millis() >= 500 {
                let elapsed = timer.elapsed();
                let pct = done as f64 / total as f64 * 100.0;
                let nps = done as f64 / elapsed.as_secs_f64();
                eprint!(
                    "\x1b[2K\r  [{:.1}s] {}/{} ({:.1}%) | {:.0} nums/s",
                    elapsed.as_secs_f64(), done, total, pct, nps
                );
                *lp = now;
            }
        }
    });
    let elapsed = timer.elapsed();
    eprintln!();

    println!("--- 結果 ---");
    println!("調べた開始値の数    = {}", result.total_checked);
    println!("全て結論あり        = {}", if result.all_conclusive { "はい" } else { "いいえ" });
    println!("最長ステップ数      = {} (n={})", result.longest_total_steps, result.longest_start);
    println!("最大値              = {} (n={})", format_big(&result.highest_value), result.highest_start);
    println!("計算時間            = {:?}", elapsed);
    if !result.inconclusive.is_empty() {
        println!("上限で打ち切った数  = {} 個", result.inconclusive.len());
        for n in result.inconclusive.iter().take(10) {
            println!("  {}", n);
        }
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(dir).with_context(|| format!("{} を作成できません", dir.display()))?;
        let filename = format!("survey_{}n{:+}_{}-{}_s{}.txt", params.odd(), params.add(), short_n(start), short_n(end), map.limit);
        let path = dir.join(filename);
        write_summary(&path, start, end, params, map.limit, num_threads, &result, elapsed)
            .with_context(|| format!("{} に書き込めません", path.display()))?;
        println!("\n保存: {}", path.display());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_summary(
    path: &Path,
    start: &BigInt,
    end: &BigInt,
    params: MapParams,
    limit: u64,
    threads: usize,
    result: &SurveyResult,
    elapsed: std::time::Duration,
) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "# collatz-rules survey")?;
    writeln!(f, "range = [{}, {}]", start, end)?;
    writeln!(f, "even = {}", params.even())?;
    writeln!(f, "odd = {}", params.odd())?;
    writeln!(f, "add = {}", params.add())?;
    writeln!(f, "max_steps_per_number = {}", limit)?;
    writeln!(f, "threads = {}", threads)?;
    writeln!(f, "total_checked = {}", result.total_checked)?;
    writeln!(f, "all_conclusive = {}", result.all_conclusive)?;
    writeln!(f, "longest_total_steps = {}", result.longest_total_steps)?;
    writeln!(f, "longest_start = {}", result.longest_start)?;
    writeln!(f, "highest_value = {}", result.highest_value)?;
    writeln!(f, "highest_start = {}", result.highest_start)?;
    writeln!(f, "inconclusive = {}", result.inconclusive.len())?;
    writeln!(f, "elapsed = {:?}", elapsed)?;
    if !result.inconclusive.is_empty() {
        writeln!(f, "\n# 上限で打ち切った数:")?;
        for n in &result.inconclusive {
            writeln!(f, "{}", n)?;
        }
    }
    Ok(())
}

fn short_n(n: &BigInt) -> String {
    let s = n.to_string();
    if s.len() <= 16 {
        s
    } else {
        format!("{}..{}d", &s[..6], s.len())
    }
}

fn format_big(n: &BigInt) -> String {
    let s = n.to_string();
    if s.len() <= 50 {
        s
    } else {
        format!("{}...{} ({}桁)", &s[..20], &s[s.len() - 20..], s.len())
    }
}

fn format_label(label: &Label) -> String {
    let s = label.as_str();
    if s.len() <= 80 {
        s.to_string()
    } else {
        format!("{}... ({}ステップ)", &s[..80], s.len())
    }
}
