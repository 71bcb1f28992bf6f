use std::time::Duration;

use super::{ArithmeticRecord, CompositionRecord, SelectionVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundState {
    #[default]
    Idle,
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_answer: i32,
    pub user_answer: i32,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub enum RoundEvent {
    /// Advisory clock update; carries no game state.
    Tick {
        elapsed: Duration,
    },
    AnswerChecked(AnswerOutcome),
    SelectionChecked {
        target: i32,
        verdict: SelectionVerdict,
    },
    ArithmeticFinished(ArithmeticRecord),
    CompositionFinished(CompositionRecord),
    Abandoned,
}
