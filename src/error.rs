use thiserror::Error;

/// 規則テキストの抽出・規則集合の構築で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("cannot parse `{input}` at column {position}: {message}")]
    Parse {
        input: String,
        position: usize,
        message: String,
    },
    #[error("condition `{input}` has no `x % M == R` term")]
    MissingModulus { input: String },
    #[error("condition `{input}` uses modulus 0")]
    ZeroModulus { input: String },
    #[error("residue {residue} is not below modulus {modulus}")]
    ResidueOutOfRange { residue: u64, modulus: u64 },
    #[error("{conditions} conditions but {mappings} mappings")]
    CountMismatch { conditions: usize, mappings: usize },
    #[error("modulus {modulus} exceeds the coverage limit {limit}")]
    ModulusTooLarge { modulus: u64, limit: u64 },
    #[error("rule set is empty")]
    Empty,
}

/// 写像式の評価エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("exponent {0} is not an integer")]
    NonIntegerExponent(String),
    #[error("exponent {0} is too large")]
    ExponentTooLarge(String),
}

/// ラベル文字列（'0'/'1' 列）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("label contains {found:?} at position {position}; only '0' and '1' are allowed")]
    InvalidChar { position: usize, found: char },
}

/// 写像パラメータのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("even divisor must be >= 2, got {0}")]
    EvenTooSmall(u64),
    #[error("odd multiplier must be >= 1, got {0}")]
    OddTooSmall(u64),
}

/// ディオファントス方程式ソルバのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("3^{power_of_three} x - 2^{power_of_two} y = -c needs both exponents >= 1")]
    Domain { power_of_three: u32, power_of_two: u32 },
    #[error("euclidean step divides by zero")]
    DegenerateStep,
}
