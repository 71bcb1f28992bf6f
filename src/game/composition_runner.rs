use chrono::Utc;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use super::composition_generator::{evaluate_selection, generate_composition_round};
use crate::destroyable::Destroyable;
use crate::error::{ConfigError, InputError};
use crate::events::EventEmitter;
use crate::model::{
    CompositionConfiguration, CompositionItem, CompositionRecord, MissedComposition, RoundEvent,
    RoundState, SelectionVerdict, TimerState,
};

/// A composition session: every target in the configured range, repeated
/// and shuffled, one quiz per target.
pub struct CompositionRunner {
    state: RoundState,
    config: CompositionConfiguration,
    targets: Vec<i32>,
    target_index: usize,
    current_items: Vec<CompositionItem>,
    correct_answers: u32,
    wrong_examples: Vec<MissedComposition>,
    timer_state: Option<TimerState>,
    player_name: String,
    rng: Box<dyn RngCore>,
    round_event_emitter: EventEmitter<RoundEvent>,
    last_record: Option<CompositionRecord>,
}

impl Destroyable for CompositionRunner {
    fn destroy(&mut self) {
        self.abandon();
    }
}

impl CompositionRunner {
    pub fn new(
        player_name: &str,
        round_event_emitter: EventEmitter<RoundEvent>,
        rng: Box<dyn RngCore>,
    ) -> Self {
        Self {
            state: RoundState::Idle,
            config: CompositionConfiguration::default(),
            targets: Vec::new(),
            target_index: 0,
            current_items: Vec::new(),
            correct_answers: 0,
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

    pub fn start(&mut self, config: CompositionConfiguration) -> Result<(), ConfigError> {
        config.validate()?;
        if self.state == RoundState::Active {
            self.abandon();
        }

        let mut targets: Vec<i32> = (0..config.repetitions)
            .flat_map(|_| config.min_number..=config.max_number)
            .collect();
        targets.shuffle(self.rng.as_mut());
        info!(
            target: "composition",
            "Starting composition session {} x{}: {} targets",
            config.range_label(),
            config.repetitions,
            targets.len()
        );

        self.config = config;
        self.targets = targets;
        self.target_index = 0;
        self.correct_answers = 0;
        self.wrong_examples.clear();
        self.last_record = None;
        self.timer_state = Some(TimerState::started_at(SystemTime::now()));
        self.state = RoundState::Active;
        self.generate_current_items();
        Ok(())
    }

    fn generate_current_items(&mut self) {
        self.current_items = match self.targets.get(self.target_index) {
            Some(&target) => generate_composition_round(target, self.rng.as_mut()),
            None => Vec::new(),
        };
    }

    pub fn abandon(&mut self) {
        if self.state != RoundState::Active {
            return;
        }
        self.stop_clock();
        self.state = RoundState::Idle;
        self.current_items.clear();
        info!(target: "composition", "Composition session abandoned");
        self.round_event_emitter.emit(RoundEvent::Abandoned);
    }

    /// Scores the selected option indexes for the current target and moves
    /// on to the next one.
    pub fn submit_selection(&mut self, selected: &[usize]) -> Result<SelectionVerdict, InputError> {
        if self.state != RoundState::Active {
            return Err(InputError::NoActiveRound);
        }
        let available = self.current_items.len();
        if let Some(&index) = selected.iter().find(|&&index| index >= available) {
            return Err(InputError::UnknownOption { index, available });
        }
        let target = self.targets[self.target_index];

        let selected: BTreeSet<usize> = selected.iter().copied().collect();
        let verdict = evaluate_selection(&self.current_items, &selected);
        self.correct_answers += verdict.correct_selections;
        self.wrong_examples.extend(verdict.mistakes.iter().cloned());
        debug!(
            target: "composition",
            "Target {}: {} correct, {} mistakes",
            target,
            verdict.correct_selections,
            verdict.mistakes.len()
        );
        self.round_event_emitter.emit(RoundEvent::SelectionChecked {
            target,
            verdict: verdict.clone(),
        });

        self.target_index += 1;
        if self.target_index >= self.targets.len() {
            self.finish();
        } else {
            self.generate_current_items();
        }
        Ok(verdict)
    }

    fn finish(&mut self) {
        self.stop_clock();
        self.state = RoundState::Finished;
        self.current_items.clear();
        let record = CompositionRecord::new(
            &self.player_name,
            &self.config,
            self.correct_answers,
            self.wrong_examples.clone(),
            self.elapsed(),
            Utc::now(),
        );
        info!(
            target: "composition",
            "Composition session finished: {} correct, {} incorrect",
            record.correct_answers,
            record.incorrect_answers
        );
        self.last_record = Some(record.clone());
        self.round_event_emitter
            .emit(RoundEvent::CompositionFinished(record));
    }

    fn stop_clock(&mut self) {
        if let Some(timer_state) = self.timer_state.take() {
            self.timer_state = Some(timer_state.ended(SystemTime::now()));
        }
    }

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

    pub fn current_target(&self) -> Option<i32> {
        if self.state != RoundState::Active {
            return None;
        }
        self.targets.get(self.target_index).copied()
    }

    pub fn current_items(&self) -> &[CompositionItem] {
        &self.current_items
    }

    /// One-based repetition the current target belongs to.
    pub fn current_repetition(&self) -> u32 {
        let per_repetition = self.config.targets_per_repetition().max(1);
        let position = (self.target_index + 1).min(self.targets.len().max(1));
        position.div_ceil(per_repetition) as u32
    }

    /// Zero-based index of the current target and the session length.
    pub fn progress(&self) -> (usize, usize) {
        (self.target_index, self.targets.len())
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn incorrect_answers(&self) -> u32 {
        self.wrong_examples.len() as u32
    }

    pub fn last_record(&self) -> Option<&CompositionRecord> {
        self.last_record.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_context::test_context;

    use crate::events::Channel;
    use crate::game::Environment;
    use crate::tests::UsingLogger;

    fn runner() -> (CompositionRunner, Rc<RefCell<Vec<CompositionRecord>>>) {
        let (emitter, observer) = Channel::<RoundEvent>::new();
        let records = Rc::new(RefCell::new(Vec::new()));
        let records_clone = records.clone();
        observer.subscribe(move |event| {
            if let RoundEvent::CompositionFinished(record) = event {
                records_clone.borrow_mut().push(record.clone());
            }
        });
        (
            CompositionRunner::new("Petya", emitter, Environment::rng(Some(3))),
            records,
        )
    }

    fn correct_indexes(items: &[CompositionItem]) -> Vec<usize> {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_correct)
            .map(|(index, _)| index)
            .collect()
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_session_visits_each_target_per_repetition(_: &mut UsingLogger) {
        let (mut runner, records) = runner();
        runner.start(CompositionConfiguration::new(2, 5, 2)).unwrap();
        assert_eq!(runner.progress(), (0, 8));

        let mut seen = Vec::new();
        let mut expected_correct = 0;
        while let Some(target) = runner.current_target() {
            seen.push(target);
            let picks = correct_indexes(runner.current_items());
            expected_correct += picks.len() as u32;
            let verdict = runner.submit_selection(&picks).unwrap();
            assert!(verdict.is_fully_correct());
        }
        seen.sort();
        assert_eq!(seen, vec![2, 2, 3, 3, 4, 4, 5, 5]);
        assert_eq!(runner.state(), RoundState::Finished);
        assert!(!runner.is_clock_running());

        let records = records.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].correct_answers, expected_correct);
        assert_eq!(records[0].incorrect_answers, 0);
        assert_eq!(records[0].repetitions, 2);
        assert_eq!(records[0].range_label(), "2-5");
    }

    #[test]
    fn test_empty_selection_counts_every_correct_item_as_missed() {
        let (mut runner, _records) = runner();
        runner.start(CompositionConfiguration::new(3, 3, 1)).unwrap();
        let n_correct = correct_indexes(runner.current_items()).len();
        assert_eq!(n_correct, 4);

        let verdict = runner.submit_selection(&[]).unwrap();
        assert_eq!(verdict.correct_selections, 0);
        assert_eq!(verdict.mistakes.len(), 4);
        assert_eq!(runner.incorrect_answers(), 4);
        assert_eq!(runner.last_record().unwrap().incorrect_answers, 4);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let (mut runner, _records) = runner();
        runner.start(CompositionConfiguration::new(1, 1, 1)).unwrap();
        let available = runner.current_items().len();
        assert_eq!(
            runner.submit_selection(&[0, available]),
            Err(InputError::UnknownOption {
                index: available,
                available
            })
        );
        assert_eq!(runner.progress(), (0, 1));
    }

    #[test]
    fn test_current_repetition() {
        let (mut runner, _records) = runner();
        runner.start(CompositionConfiguration::new(1, 2, 3)).unwrap();
        let mut repetitions = Vec::new();
        while runner.current_target().is_some() {
            repetitions.push(runner.current_repetition());
            runner.submit_selection(&[]).unwrap();
        }
        assert_eq!(repetitions, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_invalid_configuration() {
        let (mut runner, _records) = runner();
        assert_eq!(
            runner.start(CompositionConfiguration::new(1, 4, 0)),
            Err(ConfigError::NoRepetitions)
        );
        assert_eq!(
            runner.start(CompositionConfiguration::new(0, i32::MAX, 1)),
            Err(ConfigError::MaximumTooLarge {
                max: i32::MAX,
                limit: crate::model::MAX_COMPOSITION_TARGET
            })
        );
        assert_eq!(runner.state(), RoundState::Idle);
        assert_eq!(runner.progress(), (0, 0));
    }

    #[test]
    fn test_abandon_clears_session() {
        let (mut runner, records) = runner();
        runner.start(CompositionConfiguration::default()).unwrap();
        runner.destroy();
        assert_eq!(runner.state(), RoundState::Idle);
        assert!(runner.current_items().is_empty());
        assert_eq!(runner.tick(), None);
        assert!(records.borrow().is_empty());
    }
}
