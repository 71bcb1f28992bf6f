use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Range of target numbers for a composition session and how many times
/// each target is asked.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionConfiguration {
    #[serde(default = "default_min_number")]
    pub min_number: i32,

    #[serde(default = "default_max_number")]
    pub max_number: i32,

    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
}

/// Largest number a composition quiz may decompose.
pub const MAX_COMPOSITION_TARGET: i32 = 100;

pub const MAX_REPETITIONS: u32 = 10;

fn default_min_number() -> i32 {
    1
}
fn default_max_number() -> i32 {
    10
}
fn default_repetitions() -> u32 {
    1
}

impl Default for CompositionConfiguration {
    fn default() -> Self {
        Self {
            min_number: default_min_number(),
            max_number: default_max_number(),
            repetitions: default_repetitions(),
        }
    }
}

impl CompositionConfiguration {
    pub fn new(min_number: i32, max_number: i32, repetitions: u32) -> Self {
        Self {
            min_number,
            max_number,
            repetitions,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_number < 0 {
            return Err(ConfigError::NegativeMinimum(self.min_number));
        }
        if self.min_number > self.max_number {
            return Err(ConfigError::InvertedRange {
                min: self.min_number,
                max: self.max_number,
            });
        }
        if self.max_number > MAX_COMPOSITION_TARGET {
            return Err(ConfigError::MaximumTooLarge {
                max: self.max_number,
                limit: MAX_COMPOSITION_TARGET,
            });
        }
        if self.repetitions == 0 {
            return Err(ConfigError::NoRepetitions);
        }
        if self.repetitions > MAX_REPETITIONS {
            return Err(ConfigError::TooManyRepetitions {
                repetitions: self.repetitions,
                limit: MAX_REPETITIONS,
            });
        }
        Ok(())
    }

    pub fn targets_per_repetition(&self) -> usize {
        let span = i64::from(self.max_number) - i64::from(self.min_number) + 1;
        usize::try_from(span).unwrap_or(0)
    }

    /// Display form used in history, e.g. "1-10".
    pub fn range_label(&self) -> String {
        format!("{}-{}", self.min_number, self.max_number)
    }
}
