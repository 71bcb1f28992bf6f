use chrono::Utc;
use log::{debug, info, trace};
use rand::RngCore;
use std::time::{Duration, SystemTime};

use super::problem_generator::generate_round;
use crate::destroyable::Destroyable;
use crate::error::{ConfigError, InputError};
use crate::events::EventEmitter;
use crate::model::{
    game_record::percentage, AnswerOutcome, ArithmeticRecord, MissedProblem, Problem,
    RoundConfiguration, RoundEvent, RoundState, TimerState,
};

/// Parses a typed answer. Surrounding whitespace is ignored.
pub fn parse_answer(input: &str) -> Result<i32, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| InputError::NotANumber(trimmed.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResults {
    pub score: u32,
    pub total: u32,
    pub wrong_examples: Vec<MissedProblem>,
    pub percentage: u32,
}

/// Drives one addition/subtraction round: Idle -> Active -> Finished.
pub struct RoundRunner {
    state: RoundState,
    config: RoundConfiguration,
    problems: Vec<Problem>,
    current_index: usize,
    score: u32,
    wrong_examples: Vec<MissedProblem>,
    timer_state: Option<TimerState>,
    player_name: String,
    rng: Box<dyn RngCore>,
    round_event_emitter: EventEmitter<RoundEvent>,
    last_record: Option<ArithmeticRecord>,
}

impl Destroyable for RoundRunner {
    fn destroy(&mut self) {
        self.abandon();
    }
}

impl RoundRunner {
    pub fn new(
        player_name: &str,
        round_event_emitter: EventEmitter<RoundEvent>,
        rng: Box<dyn RngCore>,
    ) -> Self {
        Self {
            state: RoundState::Idle,
            config: RoundConfiguration::default(),
            problems: Vec::new(),
            current_index: 0,
            score: 0,
            wrong_examples: Vec::new(),
            timer_state: None,
            player_name: player_name.to_string(),
            rng,
            round_event_emitter,
            last_record: None,
        }
    }

    pub fn set_player_name(&mut self, player_name: &str) {
        self.player_name = player_name.to_string();
    }

    /// Starts a fresh round, superseding any round still in progress. An
    /// invalid configuration leaves the runner untouched.
    pub fn start(&mut self, config: RoundConfiguration) -> Result<(), ConfigError> {
        let problems = generate_round(&config, self.rng.as_mut())?;
        if self.state == RoundState::Active {
            debug!(target: "round", "Superseding round at problem {}", self.current_index + 1);
            self.abandon();
        }

        info!(
            target: "round",
            "Starting round: {} problems, {}..{}, {}",
            config.problem_count,
            config.min_number,
            config.max_number,
            config.operation_mode
        );
        self.config = config;
        self.problems = problems;
        self.current_index = 0;
        self.score = 0;
        self.wrong_examples.clear();
        self.last_record = None;
        self.timer_state = Some(TimerState::started_at(SystemTime::now()));
        self.state = RoundState::Active;
        Ok(())
    }

    /// Same configuration, new problems.
    pub fn restart(&mut self) -> Result<(), ConfigError> {
        self.start(self.config.clone())
    }

    /// Stops the clock and returns to Idle without recording anything.
    pub fn abandon(&mut self) {
        if self.state != RoundState::Active {
            return;
        }
        self.stop_clock();
        self.state = RoundState::Idle;
        info!(target: "round", "Round abandoned at problem {}", self.current_index + 1);
        self.round_event_emitter.emit(RoundEvent::Abandoned);
    }

    pub fn submit_answer(&mut self, input: &str) -> Result<AnswerOutcome, InputError> {
        if self.state != RoundState::Active {
            return Err(InputError::NoActiveRound);
        }
        let user_answer = parse_answer(input)?;
        let problem = self
            .problems
            .get(self.current_index)
            .cloned()
            .ok_or(InputError::NoActiveRound)?;

        let correct = problem.is_answered_by(user_answer);
        if correct {
            self.score += 1;
        } else {
            self.wrong_examples.push(MissedProblem {
                problem: problem.clone(),
                user_answer,
            });
        }
        trace!(
            target: "round",
            "{}{} -> {} (score {})",
            problem.text,
            user_answer,
            if correct { "correct" } else { "wrong" },
            self.score
        );

        let outcome = AnswerOutcome {
            correct,
            correct_answer: problem.result,
            user_answer,
            score: self.score,
        };
        self.round_event_emitter
            .emit(RoundEvent::AnswerChecked(outcome.clone()));

        self.current_index += 1;
        if self.current_index >= self.problems.len() {
            self.finish();
        }
        Ok(outcome)
    }

    fn finish(&mut self) {
        self.stop_clock();
        self.state = RoundState::Finished;
        let record = ArithmeticRecord::new(
            &self.player_name,
            &self.config,
            self.score,
            self.wrong_examples.clone(),
            self.elapsed(),
            Utc::now(),
        );
        info!(
            target: "round",
            "Round finished: {}/{} in {:?}",
            record.score,
            record.total_examples,
            record.time
        );
        self.last_record = Some(record.clone());
        self.round_event_emitter
            .emit(RoundEvent::ArithmeticFinished(record));
    }

    fn stop_clock(&mut self) {
        if let Some(timer_state) = self.timer_state.take() {
            self.timer_state = Some(timer_state.ended(SystemTime::now()));
        }
    }

    /// Publishes the elapsed time while a round is active.
    pub fn tick(&self) -> Option<Duration> {
        if self.state != RoundState::Active {
            return None;
        }
        let elapsed = self.elapsed();
        self.round_event_emitter.emit(RoundEvent::Tick { elapsed });
        Some(elapsed)
    }

    pub fn elapsed(&self) -> Duration {
        self.timer_state
            .as_ref()
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }

    pub fn is_clock_running(&self) -> bool {
        self.timer_state.as_ref().is_some_and(|t| t.is_running())
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn config(&self) -> &RoundConfiguration {
        &self.config
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        if self.state != RoundState::Active {
            return None;
        }
        self.problems.get(self.current_index)
    }

    /// Zero-based index of the current problem and the round length.
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index, self.problems.len())
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn results(&self) -> Option<RoundResults> {
        if self.state != RoundState::Finished {
            return None;
        }
        let total = self.problems.len() as u32;
        Some(RoundResults {
            score: self.score,
            total,
            wrong_examples: self.wrong_examples.clone(),
            percentage: percentage(self.score, total),
        })
    }

    pub fn last_record(&self) -> Option<&ArithmeticRecord> {
        self.last_record.as_ref()
    }
}
