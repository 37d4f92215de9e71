use std::path::PathBuf;

use thiserror::Error;

/// Invalid arguments to the instance generator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("target must be positive (in cents)")]
    NonPositiveTarget,
    #[error("count must be >= 2, got {0}")]
    CountTooSmall(usize),
    #[error(
        "invalid target '{0}': use cents (e.g. 6867467) or reais (e.g. 68674,67 or R$ 68.674,67)"
    )]
    InvalidAmount(String),
    #[error("output path is empty")]
    EmptyPath,
    #[error("output file must have a .csv extension, e.g. instances_30k.csv: {}", .0.display())]
    NotCsv(PathBuf),
}

/// The batch header lacks required columns; nothing in the batch is processed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("CSV header must contain the columns name,pool,target (missing: {})", .missing.join(","))]
pub struct RecordFormatError {
    pub missing: Vec<&'static str>,
}

/// A single record that can't be solved; the row is skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowDataError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("invalid pool value '{0}'")]
    InvalidPoolValue(String),
    #[error("invalid target '{0}'")]
    InvalidTarget(String),
    #[error("negative values/target are not supported")]
    Negative,
    #[error("malformed record: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("target {target} exceeds the solver limit of {max}")]
    TargetTooLarge { target: u64, max: u64 },
    #[error("reachability layers need {words} words, over the budget of {max}")]
    LayersTooLarge { words: usize, max: usize },
    #[error("could not allocate {words} words for reachability layers")]
    OutOfMemory { words: usize },
}
