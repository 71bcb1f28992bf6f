mod composition_configuration;
mod composition_item;
pub mod game_record;
mod operation;
mod player_statistics;
mod problem;
mod round_configuration;
mod round_event;
mod timer_state;

pub use composition_configuration::{
    CompositionConfiguration, MAX_COMPOSITION_TARGET, MAX_REPETITIONS,
};
pub use composition_item::{CompositionItem, MissedComposition, SelectionMistake, SelectionVerdict};
pub use game_record::{ArithmeticRecord, CompositionRecord, GameRecord};
pub use operation::{Operation, OperationMode};
pub use player_statistics::{DailyStats, PlayerStatistics};
pub use problem::{MissedProblem, Problem};
pub use round_configuration::{RoundConfiguration, MAX_PROBLEM_COUNT};
pub use round_event::{AnswerOutcome, RoundEvent, RoundState};
pub use timer_state::TimerState;
