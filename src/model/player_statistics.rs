use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::DurationMilliSeconds;
use std::time::Duration;

use super::GameRecord;

/// Read-only view over a player's history. Recomputed on every request.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatistics {
    pub player_name: String,
    pub total_games: u32,
    pub arithmetic_games: u32,
    pub composition_games: u32,
    pub best_score: u32,
    pub average_score: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub total_time: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub average_time: Duration,
    pub perfect_games: u32,
    pub last_played: Option<DateTime<Utc>>,
    pub recent_games: Vec<GameRecord>,
}

impl PlayerStatistics {
    pub fn empty(player_name: &str) -> Self {
        Self {
            player_name: player_name.to_string(),
            ..Default::default()
        }
    }

    pub fn perfect_percentage(&self) -> u32 {
        super::game_record::percentage(self.perfect_games, self.total_games)
    }
}

/// Totals for one calendar day.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub games: u32,
    pub total_examples: u32,
    pub total_score: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub total_time: Duration,
    pub percentage: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub average_time: Duration,
}
