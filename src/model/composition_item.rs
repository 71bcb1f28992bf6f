use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One option of a composition quiz, e.g. "3 + 4".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionItem {
    pub text: String,
    #[serde(rename = "result")]
    pub implied_sum: i32,
    pub is_correct: bool,
}

impl CompositionItem {
    pub fn new(a: i32, b: i32, target: i32) -> Self {
        let implied_sum = a + b;
        Self {
            text: format!("{} + {}", a, b),
            implied_sum,
            is_correct: implied_sum == target,
        }
    }
}

impl Display for CompositionItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMistake {
    ShouldHaveSelected,
    ShouldNotHaveSelected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissedComposition {
    pub example: String,
    pub mistake: SelectionMistake,
}

/// Outcome of scoring one composition quiz against the player's selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionVerdict {
    pub correct_selections: u32,
    pub mistakes: Vec<MissedComposition>,
}

impl SelectionVerdict {
    pub fn is_fully_correct(&self) -> bool {
        self.mistakes.is_empty()
    }
}
