//! 代数的恒等式の性質テスト。

use collatz_rules::*;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use proptest::prelude::*;

fn residue_rules(modulus: u64, residues: &[u64]) -> RuleSet {
    let conditions: Vec<String> = residues
        .iter()
        .map(|r| format!("x % {} == {}", modulus, r))
        .collect();
    RuleSet::from_conditions(conditions.as_slice()).unwrap()
}

// =============================================================================
// ディオファントス方程式
// =============================================================================

proptest! {
    /// 特殊解は 3^a x - 2^b y = -c を満たす
    #[test]
    fn prop_solution_satisfies_equation(a in 1u32..60, b in 1u32..60, c: i64) {
        let problem = DiophantineProblem::new(a, b, BigInt::from(c));
        let solution = problem.solve().unwrap();
        prop_assert!(solution.satisfies(&problem));
        prop_assert!(solution.canonical().satisfies(&problem));
    }

    /// 一般解もすべて方程式を満たす
    #[test]
    fn prop_general_solution(a in 1u32..30, b in 1u32..30, c in -1000i64..1000, k in -50i64..50) {
        let problem = DiophantineProblem::new(a, b, BigInt::from(c));
        let solution = problem.solve().unwrap();
        let (x, y) = solution.general(&BigInt::from(k));
        let shifted = Solution { x, y, ..solution };
        prop_assert!(shifted.satisfies(&problem));
    }
}

// =============================================================================
// 軌道と係数
// =============================================================================

proptest! {
    /// 停止ラベルの閉じた式は終了値に一致し、正規解の x は n mod 2^b
    #[test]
    fn prop_trajectory_round_trip(n in 3i64..1_000_000_000) {
        let n = BigInt::from(2 * (n / 2) + 1);
        let r = find_collatz_stop_binary(&n);
        prop_assert!(r.is_conclusive());

        let value = closed_form(&r.label, &n, MapParams::default());
        prop_assert_eq!(value, BigRational::from_integer(r.final_value.clone()));

        let problem = DiophantineProblem::from_label(&r.label);
        let solution = problem.solve().unwrap();
        prop_assert_eq!(solution.canonical().x, n.mod_floor(&solution.x_period));
    }

    /// 任意のラベルで、ラベル通りに記号的に進めた値と閉じた式が一致する
    #[test]
    fn prop_closed_form_follows_label(bits in "[01]{0,40}", n in -10_000i64..10_000, add in -5i64..6) {
        let params = MapParams::new(2, 3, add).unwrap();
        let label = Label::parse(&bits).unwrap();

        let two = BigRational::from_integer(BigInt::from(2));
        let three = BigRational::from_integer(BigInt::from(3));
        let add = BigRational::from_integer(BigInt::from(add));
        let mut value = BigRational::from_integer(BigInt::from(n));
        for step in label.steps() {
            value = match step {
                Step::Even => value / &two,
                Step::Odd => value * &three + &add,
            };
        }
        prop_assert_eq!(closed_form(&label, &BigInt::from(n), params), value);
    }

    /// 停止ラベルの '0' と '1' の数はステップ数に一致する
    #[test]
    fn prop_label_counts(n in -100_000i64..100_000) {
        let r = find_collatz_stop_binary(&BigInt::from(n));
        prop_assert_eq!(r.total_steps as usize, r.label.len());
        prop_assert_eq!(r.even_steps, r.label.zeros() as u64);
        prop_assert_eq!(r.odd_steps, r.label.ones() as u64);
        prop_assert!(r.total_steps >= 1);
    }
}

// =============================================================================
// 規則集合
// =============================================================================

proptest! {
    /// 単一の法の全残基は充足的、1つ欠ければ欠落、1つ重複すれば重複
    #[test]
    fn prop_single_modulus_coverage(modulus in 1u64..40, pick in 0u64..40) {
        let all: Vec<u64> = (0..modulus).collect();
        let set = residue_rules(modulus, &all);
        prop_assert!(set.is_conformative());
        prop_assert_eq!(set.coverage(), Coverage::Full);

        let dropped = pick % modulus;
        let fewer: Vec<u64> = all.iter().copied().filter(|&r| r != dropped).collect();
        if !fewer.is_empty() {
            prop_assert_eq!(
                residue_rules(modulus, &fewer).coverage(),
                Coverage::Gap { missing: vec![dropped] }
            );
        }

        let mut more = all.clone();
        more.push(dropped);
        let overlapping = residue_rules(modulus, &more).coverage();
        prop_assert!(
            matches!(overlapping, Coverage::Overlap { residue, .. } if residue == dropped),
            "expected overlap at {}, got {:?}",
            dropped,
            overlapping
        );
    }

    /// 検査は何度呼んでも同じ結果で、規則集合を変えない
    #[test]
    fn prop_checks_idempotent(modulus in 1u64..20, residues in proptest::collection::vec(0u64..20, 1..10)) {
        let residues: Vec<u64> = residues.into_iter().map(|r| r % modulus).collect();
        let set = residue_rules(modulus, &residues);
        let before = set.clone();
        let first = (set.is_conformative(), set.coverage());
        let second = (set.is_conformative(), set.coverage());
        prop_assert_eq!(first, second);
        prop_assert_eq!(set, before);
    }
}

// =============================================================================
// 写像式
// =============================================================================

proptest! {
    /// "p*x + q" は p·x + q を返す
    #[test]
    fn prop_linear_mapping(p in -1000i64..1000, q in -1000i64..1000, x in -10_000i64..10_000) {
        let mapping = Mapping::parse(&format!("{} * x + {}", p, q)).unwrap();
        let value = mapping.call(&BigInt::from(x)).unwrap();
        prop_assert_eq!(value, BigRational::from_integer(BigInt::from(p * x + q)));
    }
}
