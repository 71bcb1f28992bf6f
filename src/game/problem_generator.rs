use log::{trace, warn};
use rand::Rng;

use crate::error::ConfigError;
use crate::model::{Operation, OperationMode, Problem, RoundConfiguration};

/// Upper bound for every redraw loop in the generator.
pub const MAX_GENERATION_ATTEMPTS: usize = 100;

/// A bounded redraw loop gave up. `last` is the last well-formed draw, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriesExhausted<T> {
    pub attempts: usize,
    pub last: Option<T>,
}

/// Draws until `accept` holds, at most `max_attempts` times. A draw of `None`
/// counts as an attempt whose range collapsed.
pub fn retry_bounded<T, R, D, A>(
    rng: &mut R,
    max_attempts: usize,
    mut draw: D,
    accept: A,
) -> Result<T, RetriesExhausted<T>>
where
    R: Rng + ?Sized,
    D: FnMut(&mut R) -> Option<T>,
    A: Fn(&T) -> bool,
{
    let mut last = None;
    for _ in 0..max_attempts {
        if let Some(candidate) = draw(rng) {
            if accept(&candidate) {
                return Ok(candidate);
            }
            last = Some(candidate);
        }
    }
    Err(RetriesExhausted {
        attempts: max_attempts,
        last,
    })
}

/// Generates `config.problem_count` problems. At most one of them has a
/// result of zero unless the redraw bound is hit.
pub fn generate_round<R: Rng + ?Sized>(
    config: &RoundConfiguration,
    rng: &mut R,
) -> Result<Vec<Problem>, ConfigError> {
    config.validate()?;

    let mut problems = Vec::with_capacity(config.problem_count);
    let mut has_zero_result = false;
    for index in 0..config.problem_count {
        let problem = generate_problem(config, has_zero_result, rng);
        trace!(
            target: "generator",
            "Problem {}/{}: {}",
            index + 1,
            config.problem_count,
            problem
        );
        has_zero_result |= problem.result == 0;
        problems.push(problem);
    }
    Ok(problems)
}

fn choose_operation<R: Rng + ?Sized>(mode: OperationMode, rng: &mut R) -> Operation {
    match mode {
        OperationMode::Addition => Operation::Addition,
        OperationMode::Subtraction => Operation::Subtraction,
        OperationMode::Mixed => {
            if rng.random_bool(0.5) {
                Operation::Addition
            } else {
                Operation::Subtraction
            }
        }
    }
}

fn generate_problem<R: Rng + ?Sized>(
    config: &RoundConfiguration,
    has_zero_result: bool,
    rng: &mut R,
) -> Problem {
    let operation = choose_operation(config.operation_mode, rng);
    let drawn = retry_bounded(
        rng,
        MAX_GENERATION_ATTEMPTS,
        |rng| draw(operation, config, rng),
        |problem| !(has_zero_result && problem.result == 0),
    );

    match drawn {
        Ok(problem) => problem,
        Err(RetriesExhausted {
            attempts,
            last: Some(problem),
        }) => {
            warn!(
                target: "generator",
                "Could not avoid a repeated zero result after {} attempts; accepting {}",
                attempts,
                problem
            );
            problem
        }
        Err(RetriesExhausted {
            attempts,
            last: None,
        }) => {
            let problem = minimal_problem(operation, config);
            warn!(
                target: "generator",
                "No valid {:?} operands after {} attempts; falling back to {}",
                operation,
                attempts,
                problem
            );
            problem
        }
    }
}

fn draw<R: Rng + ?Sized>(
    operation: Operation,
    config: &RoundConfiguration,
    rng: &mut R,
) -> Option<Problem> {
    match operation {
        Operation::Addition => draw_addition(config, rng),
        Operation::Subtraction => draw_subtraction(config, rng),
    }
}

/// `a` in `[min, max - min]`, `b` in `[min, max - a]`.
fn draw_addition<R: Rng + ?Sized>(config: &RoundConfiguration, rng: &mut R) -> Option<Problem> {
    let (min, max) = (config.min_number, config.max_number);
    if max - min < min {
        return None;
    }
    let a = rng.random_range(min..=max - min);
    let b = rng.random_range(min..=max - a);
    Some(Problem::addition(a, b))
}

/// `a` in `[2 * min, max]`, `b` in `[min, a - min]` and strictly below `a`.
fn draw_subtraction<R: Rng + ?Sized>(
    config: &RoundConfiguration,
    rng: &mut R,
) -> Option<Problem> {
    let (min, max) = (config.min_number, config.max_number);
    if min > max - min {
        return None;
    }
    let a = rng.random_range(2 * min..=max);
    let upper = (a - min).min(a - 1);
    if upper < min {
        return None;
    }
    let b = rng.random_range(min..=upper);
    Some(Problem::subtraction(a, b))
}

fn minimal_problem(operation: Operation, config: &RoundConfiguration) -> Problem {
    let min = config.min_number;
    match operation {
        Operation::Addition => Problem::addition(min, min),
        Operation::Subtraction => Problem::subtraction((2 * min).max(min + 1), min),
    }
}
