use collatz_rules::*;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::One;

/// 軌道と閉じた式・ディオファントス方程式の整合を検証するヘルパー
fn verify_large_trajectory(n: &BigInt) -> StopResult {
    let classic = MapParams::default();
    let r = find_collatz_stop_binary(n);

    // 2^z·f = 3^k·n + c はラベルの長さに依らず成り立つ
    let value = closed_form(&r.label, n, classic);
    assert_eq!(value, BigRational::from_integer(r.final_value.clone()), "closed form mismatch");

    let problem = DiophantineProblem::from_label(&r.label);
    let solution = problem.solve().unwrap();
    assert!(solution.satisfies(&problem), "solver mismatch for {} steps", r.total_steps);
    assert_eq!(solution.canonical().x, n.mod_floor(&solution.x_period));
    r
}

/// 2^61 未満で最大の遅延を持つ数 (約19桁)
#[test]
fn test_record_holder_2pow61() {
    let n: BigInt = "1980976057694848447".parse().unwrap();
    let r = verify_large_trajectory(&n);
    assert!(r.is_conclusive());
    assert!(r.final_value < n);
}

/// 2^100 - 1 (約30桁) のテスト
#[test]
fn test_2pow100_minus1() {
    let n = (BigInt::one() << 100u32) - BigInt::one();
    let r = verify_large_trajectory(&n);
    // 2^k - 1 は最初の 2k ステップで "10" を k 回繰り返す
    assert!(r.label.as_str().starts_with(&"10".repeat(100)));
}

/// 2^1000 - 1 (約301桁) のテスト
#[test]
fn test_2pow1000_minus1() {
    let n = (BigInt::one() << 1000u32) - BigInt::one();
    let r = verify_large_trajectory(&n);
    assert!(r.max_value > n);
}

/// 負の大数
#[test]
fn test_negative_2pow200_plus1() {
    let n = -((BigInt::one() << 200u32) + BigInt::one());
    verify_large_trajectory(&n);
}

/// 大きな指数の方程式を代入で検証
#[test]
fn test_solve_large_exponents() {
    for (a, b) in [(100u32, 159u32), (631, 1000), (1000, 1585), (2000, 1000), (1, 4000)] {
        let c: BigInt = BigInt::from(3u32).pow(a / 2) + BigInt::from(7u32);
        let problem = DiophantineProblem::new(a, b, c);
        let solution = problem.solve().unwrap();
        assert!(solution.satisfies(&problem), "a={}, b={}", a, b);
        let canon = solution.canonical();
        assert!(canon.x >= BigInt::from(0) && canon.x < canon.x_period);
        assert!(canon.satisfies(&problem));
    }
}

/// 長いラベルでの係数と短縮係数の関係:
/// 短縮写像は奇数ステップ直後の偶数ステップを吸収したもの
#[test]
fn test_shortcut_coefficient_on_long_trajectory() {
    let classic = MapParams::default();
    let n = (BigInt::one() << 300u32) - BigInt::one();
    let r = find_collatz_stop_binary(&n);
    let plain = r.label.as_str();

    // "10" を "1" に置き換えたラベルは短縮写像の同じ軌道
    let shortcut = Label::parse(&plain.replace("10", "1")).unwrap();
    assert_eq!(
        shortcut_coefficient(&shortcut, classic),
        coefficient(&r.label, classic)
    );
}

#[test]
fn test_survey_medium_range() {
    let params = MapParams::default();
    let seq = survey_range(
        &BigInt::from(1),
        &BigInt::from(100_000),
        params,
        DEFAULT_STEP_LIMIT,
        |_, _| {},
    );
    let par = survey_range_parallel(
        &BigInt::from(1),
        &BigInt::from(100_000),
        params,
        DEFAULT_STEP_LIMIT,
        |_, _| {},
    );
    assert_eq!(seq, par);
    assert!(seq.all_conclusive);
    assert_eq!(seq.total_checked, 100_000);
}
