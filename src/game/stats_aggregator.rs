use itertools::Itertools;
use log::debug;
use std::time::Duration;

use crate::model::{game_record::percentage, DailyStats, GameRecord, PlayerStatistics};

/// How many games `PlayerStatistics::recent_games` keeps, newest first.
pub const RECENT_GAMES_LIMIT: usize = 10;

fn player_records<'a>(records: &'a [GameRecord], player: &str) -> Vec<&'a GameRecord> {
    records
        .iter()
        .filter(|record| record.player_name() == player)
        .sorted_by(|a, b| b.timestamp().cmp(&a.timestamp()))
        .collect()
}

fn rounded_mean(total: u128, count: u128) -> u128 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u128
}

/// Aggregates both record kinds for `player`. Scores and durations are
/// normalized per kind before anything is summed.
///
/// `perfect_games` counts records matching the best score seen in the
/// player's history, not the round length of each record.
pub fn compute_statistics(records: &[GameRecord], player: &str) -> PlayerStatistics {
    let games = player_records(records, player);
    if games.is_empty() {
        return PlayerStatistics::empty(player);
    }

    let count = games.len() as u128;
    let scores: Vec<u32> = games.iter().map(|g| g.normalized_score()).collect();
    let best_score = scores.iter().copied().max().unwrap_or(0);
    let total_score: u128 = scores.iter().map(|s| *s as u128).sum();
    let total_time: Duration = games.iter().map(|g| g.normalized_duration()).sum();
    let average_ms = rounded_mean(total_time.as_millis(), count);
    let composition_games = games.iter().filter(|g| g.is_composition()).count() as u32;

    let statistics = PlayerStatistics {
        player_name: player.to_string(),
        total_games: games.len() as u32,
        arithmetic_games: games.len() as u32 - composition_games,
        composition_games,
        best_score,
        average_score: rounded_mean(total_score, count) as u32,
        total_time,
        average_time: Duration::from_millis(average_ms as u64),
        perfect_games: scores.iter().filter(|s| **s == best_score).count() as u32,
        last_played: games.first().map(|g| g.timestamp()),
        recent_games: games
            .iter()
            .take(RECENT_GAMES_LIMIT)
            .map(|g| (*g).clone())
            .collect(),
    };
    debug!(
        target: "stats",
        "{}: {} games, best {}, average {}",
        player,
        statistics.total_games,
        statistics.best_score,
        statistics.average_score
    );
    statistics
}

/// Per-day totals for `player`, newest day first. Days are UTC dates.
pub fn daily_stats(records: &[GameRecord], player: &str) -> Vec<DailyStats> {
    player_records(records, player)
        .into_iter()
        .into_group_map_by(|record| record.timestamp().date_naive())
        .into_iter()
        .sorted_by(|(a, _), (b, _)| b.cmp(a))
        .map(|(date, games)| {
            let total_examples: u32 = games.iter().map(|g| g.total_answers()).sum();
            let total_score: u32 = games.iter().map(|g| g.normalized_score()).sum();
            let total_time: Duration = games.iter().map(|g| g.normalized_duration()).sum();
            let average_ms = rounded_mean(total_time.as_millis(), games.len() as u128);
            DailyStats {
                date,
                games: games.len() as u32,
                total_examples,
                total_score,
                total_time,
                percentage: percentage(total_score, total_examples),
                average_time: Duration::from_millis(average_ms as u64),
            }
        })
        .collect()
}
