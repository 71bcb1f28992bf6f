use serde::{Deserialize, Serialize};

use super::OperationMode;
use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundConfiguration {
    #[serde(default = "default_min_number")]
    pub min_number: i32,

    #[serde(default = "default_max_number")]
    pub max_number: i32,

    #[serde(default = "default_problem_count", alias = "examplesCount")]
    pub problem_count: usize,

    #[serde(default, alias = "operationType")]
    pub operation_mode: OperationMode,
}

/// Longest round a configuration may ask for.
pub const MAX_PROBLEM_COUNT: usize = 100;

fn default_min_number() -> i32 {
    1
}
fn default_max_number() -> i32 {
    10
}
fn default_problem_count() -> usize {
    5
}

impl Default for RoundConfiguration {
    fn default() -> Self {
        RoundConfiguration {
            min_number: default_min_number(),
            max_number: default_max_number(),
            problem_count: default_problem_count(),
            operation_mode: OperationMode::default(),
        }
    }
}

impl RoundConfiguration {
    pub fn new(
        min_number: i32,
        max_number: i32,
        problem_count: usize,
        operation_mode: OperationMode,
    ) -> Self {
        Self {
            min_number,
            max_number,
            problem_count,
            operation_mode,
        }
    }

    /// Both operations draw their first operand from `[min, max - min]` or
    /// `[2 * min, max]`, so the range must hold at least twice the minimum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_number < 0 {
            return Err(ConfigError::NegativeMinimum(self.min_number));
        }
        if self.min_number >= self.max_number {
            return Err(ConfigError::MinNotBelowMax {
                min: self.min_number,
                max: self.max_number,
            });
        }
        // min >= 0 and min < max here, so the subtraction cannot overflow
        if self.min_number > self.max_number - self.min_number {
            return Err(ConfigError::RangeTooNarrow {
                min: self.min_number,
                max: self.max_number,
            });
        }
        if self.problem_count == 0 {
            return Err(ConfigError::EmptyRound);
        }
        if self.problem_count > MAX_PROBLEM_COUNT {
            return Err(ConfigError::TooManyProblems {
                count: self.problem_count,
                limit: MAX_PROBLEM_COUNT,
            });
        }
        Ok(())
    }
}
