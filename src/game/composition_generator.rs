use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use crate::model::{
    CompositionItem, MissedComposition, SelectionMistake, SelectionVerdict,
};

/// Offsets from the target used to build wrong sums.
pub const DISTRACTOR_OFFSETS: [i32; 4] = [-2, -1, 1, 2];

/// A quiz shows at most `ceil((target + 2) * 1.6)` options. This is a
/// content-length heuristic, kept as the ratio 16/10.
pub const COMPOSITION_LENGTH_FACTOR: (i32, i32) = (16, 10);

pub fn max_items_for(target: i32) -> usize {
    let (numerator, denominator) = COMPOSITION_LENGTH_FACTOR;
    let scaled = (i64::from(target) + 2) * i64::from(numerator);
    let items = u64::try_from(scaled)
        .unwrap_or(0)
        .div_ceil(denominator as u64);
    usize::try_from(items).unwrap_or(usize::MAX)
}

/// Every split `i + (target - i)` for `i` in `[0, target]`.
pub fn correct_items(target: i32) -> Vec<CompositionItem> {
    (0..=target)
        .map(|i| CompositionItem::new(i, target - i, target))
        .collect()
}

/// One wrong pair per offset whose sum is not negative.
pub fn distractor_items<R: Rng + ?Sized>(target: i32, rng: &mut R) -> Vec<CompositionItem> {
    DISTRACTOR_OFFSETS
        .iter()
        .filter_map(|offset| target.checked_add(*offset))
        .filter(|sum| *sum >= 0)
        .map(|sum| {
            let a = rng.random_range(0..sum.max(1));
            CompositionItem::new(a, sum - a, target)
        })
        .collect()
}

/// Correct splits plus distractors, shuffled and cut to `max_items_for`.
pub fn generate_composition_round<R: Rng + ?Sized>(
    target: i32,
    rng: &mut R,
) -> Vec<CompositionItem> {
    let mut items = correct_items(target);
    let n_correct = items.len();
    items.extend(distractor_items(target, rng));
    items.shuffle(rng);

    let limit = max_items_for(target);
    trace!(
        target: "composition",
        "Target {}: {} correct, {} distractors, showing at most {}",
        target,
        n_correct,
        items.len() - n_correct,
        limit
    );
    items.truncate(limit);
    items
}

/// Scores a quiz: every shown correct item must be selected and no wrong
/// one. Indexes outside `items` are ignored; callers validate them.
pub fn evaluate_selection(items: &[CompositionItem], selected: &BTreeSet<usize>) -> SelectionVerdict {
    let mut verdict = SelectionVerdict::default();
    for (index, item) in items.iter().enumerate() {
        let is_selected = selected.contains(&index);
        match (item.is_correct, is_selected) {
            (true, true) => verdict.correct_selections += 1,
            (true, false) => verdict.mistakes.push(MissedComposition {
                example: item.text.clone(),
                mistake: SelectionMistake::ShouldHaveSelected,
            }),
            (false, true) => verdict.mistakes.push(MissedComposition {
                example: item.text.clone(),
                mistake: SelectionMistake::ShouldNotHaveSelected,
            }),
            (false, false) => {}
        }
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_correct_items_cover_every_split() {
        let items = correct_items(4);
        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["0 + 4", "1 + 3", "2 + 2", "3 + 1", "4 + 0"]);
        assert!(items.iter().all(|i| i.is_correct && i.implied_sum == 4));
    }

    #[test]
    fn test_distractors_skip_negative_sums() {
        let mut rng = StdRng::seed_from_u64(5);
        let items = distractor_items(1, &mut rng);
        let sums: Vec<i32> = items.iter().map(|i| i.implied_sum).collect();
        assert_eq!(sums, vec![0, 2, 3]);
        assert!(items.iter().all(|i| !i.is_correct));

        let items = distractor_items(0, &mut rng);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_distractor_operands_are_not_negative() {
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            for target in 0..15 {
                for item in distractor_items(target, &mut rng) {
                    let parts: Vec<i32> = item
                        .text
                        .split(" + ")
                        .map(|p| p.parse().unwrap())
                        .collect();
                    assert!(parts.iter().all(|p| *p >= 0), "{}", item);
                    assert_eq!(parts[0] + parts[1], item.implied_sum);
                }
            }
        }
    }

    #[test]
    fn test_max_items_for() {
        assert_eq!(max_items_for(0), 4);
        assert_eq!(max_items_for(1), 5);
        assert_eq!(max_items_for(3), 8);
        assert_eq!(max_items_for(8), 16);
        assert_eq!(max_items_for(10), 20);
        assert_eq!(max_items_for(-5), 0);
        assert_eq!(max_items_for(i32::MAX - 1), 3_435_973_837);
    }

    #[test]
    fn test_round_keeps_all_correct_items_and_respects_cap() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for target in 0..20 {
                let items = generate_composition_round(target, &mut rng);
                assert!(items.len() <= max_items_for(target));
                let correct: BTreeSet<&str> = items
                    .iter()
                    .filter(|i| i.is_correct)
                    .map(|i| i.text.as_str())
                    .collect();
                assert_eq!(correct.len(), target as usize + 1);
                for item in &items {
                    assert_eq!(item.is_correct, item.implied_sum == target);
                }
            }
        }
    }

    #[test]
    fn test_evaluate_selection_tags_each_discrepancy() {
        let items = vec![
            CompositionItem::new(1, 2, 3),
            CompositionItem::new(2, 2, 3),
            CompositionItem::new(3, 0, 3),
            CompositionItem::new(0, 2, 3),
        ];

        let all_right: BTreeSet<usize> = [0, 2].into_iter().collect();
        let verdict = evaluate_selection(&items, &all_right);
        assert!(verdict.is_fully_correct());
        assert_eq!(verdict.correct_selections, 2);

        let mixed: BTreeSet<usize> = [0, 1].into_iter().collect();
        let verdict = evaluate_selection(&items, &mixed);
        assert!(!verdict.is_fully_correct());
        assert_eq!(verdict.correct_selections, 1);
        assert_eq!(
            verdict.mistakes,
            vec![
                MissedComposition {
                    example: "2 + 2".to_string(),
                    mistake: SelectionMistake::ShouldNotHaveSelected,
                },
                MissedComposition {
                    example: "3 + 0".to_string(),
                    mistake: SelectionMistake::ShouldHaveSelected,
                },
            ]
        );
    }
}
