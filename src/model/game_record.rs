use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::serde_as;
use serde_with::DurationMilliSeconds;
use std::time::Duration;
use uuid::Uuid;

use super::{CompositionConfiguration, MissedComposition, MissedProblem, OperationMode};
use crate::model::RoundConfiguration;

/// Record ids are UUIDs. Histories written by the browser version used the
/// creation time in milliseconds instead, which maps onto the UUID's low bits.
fn deserialize_record_id<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RecordId {
        Uuid(Uuid),
        Millis(u64),
    }

    Ok(match RecordId::deserialize(deserializer)? {
        RecordId::Uuid(id) => id,
        RecordId::Millis(millis) => Uuid::from_u128(u128::from(millis)),
    })
}

/// Result of one finished addition/subtraction round.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArithmeticRecord {
    #[serde(deserialize_with = "deserialize_record_id")]
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub player_name: String,
    pub score: u32,
    pub total_examples: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub time: Duration,
    #[serde(alias = "operationType")]
    pub operation_mode: OperationMode,
    #[serde(default)]
    pub min_number: i32,
    pub max_number: i32,
    pub percentage: u32,
    #[serde(default)]
    pub wrong_examples: Vec<MissedProblem>,
}

impl ArithmeticRecord {
    pub fn new(
        player_name: &str,
        config: &RoundConfiguration,
        score: u32,
        wrong_examples: Vec<MissedProblem>,
        time: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let total_examples = config.problem_count as u32;
        Self {
            id: Uuid::new_v4(),
            timestamp,
            player_name: player_name.to_string(),
            score,
            total_examples,
            time,
            operation_mode: config.operation_mode,
            min_number: config.min_number,
            max_number: config.max_number,
            percentage: percentage(score, total_examples),
            wrong_examples,
        }
    }
}

/// Result of one finished composition session.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRecord {
    #[serde(deserialize_with = "deserialize_record_id")]
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub player_name: String,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub game_time: Duration,
    pub min_number: i32,
    pub max_number: i32,
    pub repetitions: u32,
    #[serde(default)]
    pub wrong_examples: Vec<MissedComposition>,
}

impl CompositionRecord {
    pub fn new(
        player_name: &str,
        config: &CompositionConfiguration,
        correct_answers: u32,
        wrong_examples: Vec<MissedComposition>,
        game_time: Duration,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            player_name: player_name.to_string(),
            correct_answers,
            incorrect_answers: wrong_examples.len() as u32,
            game_time,
            min_number: config.min_number,
            max_number: config.max_number,
            repetitions: config.repetitions,
            wrong_examples,
        }
    }

    pub fn range_label(&self) -> String {
        format!("{}-{}", self.min_number, self.max_number)
    }
}

/// Either kind of record, distinguished by `type` when serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameRecord {
    Arithmetic(ArithmeticRecord),
    Composition(CompositionRecord),
}

impl GameRecord {
    pub fn id(&self) -> Uuid {
        match self {
            GameRecord::Arithmetic(r) => r.id,
            GameRecord::Composition(r) => r.id,
        }
    }

    pub fn player_name(&self) -> &str {
        match self {
            GameRecord::Arithmetic(r) => &r.player_name,
            GameRecord::Composition(r) => &r.player_name,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            GameRecord::Arithmetic(r) => r.timestamp,
            GameRecord::Composition(r) => r.date,
        }
    }

    /// Score used for aggregation regardless of record kind.
    pub fn normalized_score(&self) -> u32 {
        match self {
            GameRecord::Arithmetic(r) => r.score,
            GameRecord::Composition(r) => r.correct_answers,
        }
    }

    pub fn normalized_duration(&self) -> Duration {
        match self {
            GameRecord::Arithmetic(r) => r.time,
            GameRecord::Composition(r) => r.game_time,
        }
    }

    /// Number of answers the score is out of.
    pub fn total_answers(&self) -> u32 {
        match self {
            GameRecord::Arithmetic(r) => r.total_examples,
            GameRecord::Composition(r) => r.correct_answers + r.incorrect_answers,
        }
    }

    pub fn is_composition(&self) -> bool {
        matches!(self, GameRecord::Composition(_))
    }
}

impl From<ArithmeticRecord> for GameRecord {
    fn from(record: ArithmeticRecord) -> Self {
        GameRecord::Arithmetic(record)
    }
}

impl From<CompositionRecord> for GameRecord {
    fn from(record: CompositionRecord) -> Self {
        GameRecord::Composition(record)
    }
}

/// `round(part / whole * 100)`, 0 when there is nothing to divide by.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Problem, SelectionMistake};

    #[test]
    fn test_arithmetic_record_json_shape() {
        let record = ArithmeticRecord::new(
            "Masha",
            &RoundConfiguration::default(),
            4,
            vec![MissedProblem {
                problem: Problem::addition(2, 3),
                user_answer: 6,
            }],
            Duration::from_millis(12_345),
            Utc::now(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["time"], 12_345);
        assert_eq!(json["totalExamples"], 5);
        assert_eq!(json["percentage"], 80);
        assert_eq!(json["operationMode"], "addition");
        assert_eq!(json["wrongExamples"][0]["userAnswer"], 6);
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_tagged_record_round_trip() {
        let record: GameRecord = CompositionRecord::new(
            "Masha",
            &CompositionConfiguration::default(),
            7,
            vec![MissedComposition {
                example: "2 + 3".to_string(),
                mistake: SelectionMistake::ShouldHaveSelected,
            }],
            Duration::from_secs(40),
            Utc::now(),
        )
        .into();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "composition");
        assert_eq!(json["gameTime"], 40_000);
        assert_eq!(json["incorrectAnswers"], 1);

        let back: GameRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.normalized_score(), 7);
        assert_eq!(back.total_answers(), 8);
        assert_eq!(back.normalized_duration(), Duration::from_secs(40));
    }

    #[test]
    fn test_browser_history_record_parses() {
        let record: ArithmeticRecord = serde_json::from_str(
            r#"{
                "id": 1714557600000,
                "timestamp": "2024-05-01T10:00:00.000Z",
                "playerName": "Masha",
                "score": 4,
                "totalExamples": 5,
                "time": 61000,
                "operationType": "both",
                "maxNumber": 10,
                "percentage": 80,
                "wrongExamples": [{
                    "example": {"type": "addition", "a": 2, "b": 3, "result": 5, "text": "2 + 3 = "},
                    "userAnswer": 6
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(record.id, Uuid::from_u128(1_714_557_600_000));
        assert_eq!(record.operation_mode, OperationMode::Mixed);
        assert_eq!(record.min_number, 0);
        assert_eq!(record.time, Duration::from_secs(61));
        assert_eq!(record.wrong_examples[0].problem, Problem::addition(2, 3));

        // re-serialized ids stay stable
        let again: ArithmeticRecord =
            serde_json::from_value(serde_json::to_value(&record).unwrap()).unwrap();
        assert_eq!(again.id, record.id);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(3, 0), 0);
    }
}
