pub mod composition_generator;
pub mod composition_runner;
mod environment;
pub mod problem_generator;
pub mod round_runner;
pub mod stats_aggregator;

pub use composition_generator::{evaluate_selection, generate_composition_round};
pub use composition_runner::CompositionRunner;
pub use environment::Environment;
pub use problem_generator::generate_round;
pub use round_runner::{parse_answer, RoundResults, RoundRunner};
pub use stats_aggregator::{compute_statistics, daily_stats};
