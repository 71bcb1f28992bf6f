use thiserror::Error;

/// Rejected round or composition settings. Blocks the round from starting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("minimum ({min}) must be lower than maximum ({max})")]
    MinNotBelowMax { min: i32, max: i32 },

    #[error("minimum must not be negative (got {0})")]
    NegativeMinimum(i32),

    #[error("range {min}..{max} is too narrow: maximum must be at least twice the minimum")]
    RangeTooNarrow { min: i32, max: i32 },

    #[error("a round needs at least one problem")]
    EmptyRound,

    #[error("a round holds at most {limit} problems (got {count})")]
    TooManyProblems { count: usize, limit: usize },

    #[error("maximum must not exceed {limit} (got {max})")]
    MaximumTooLarge { max: i32, limit: i32 },

    #[error("composition range {min}..{max} is inverted")]
    InvertedRange { min: i32, max: i32 },

    #[error("repetitions must be at least 1")]
    NoRepetitions,

    #[error("at most {limit} repetitions (got {repetitions})")]
    TooManyRepetitions { repetitions: u32, limit: u32 },
}

/// Rejected answer submission. The round state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("please enter a number")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("option {index} does not exist (only {available} shown)")]
    UnknownOption { index: usize, available: usize },

    #[error("no round is in progress")]
    NoActiveRound,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid import: {0}")]
    InvalidImport(String),

    #[error("invalid configuration in import: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}
