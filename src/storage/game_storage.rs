use chrono::Utc;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::export::{ExportDocument, ImportSummary};
use super::store::KeyValueStore;
use crate::error::StorageError;
use crate::game::compute_statistics;
use crate::model::{
    ArithmeticRecord, CompositionConfiguration, CompositionRecord, GameRecord, PlayerStatistics,
    RoundConfiguration,
};

pub const PLAYER_NAME_KEY: &str = "player_name";
pub const SETTINGS_KEY: &str = "settings";
pub const GAME_HISTORY_KEY: &str = "game_history";
pub const COMPOSITION_HISTORY_KEY: &str = "composition_history";
pub const COMPOSITION_SETTINGS_KEY: &str = "composition_settings";

const ALL_KEYS: [&str; 5] = [
    PLAYER_NAME_KEY,
    SETTINGS_KEY,
    GAME_HISTORY_KEY,
    COMPOSITION_HISTORY_KEY,
    COMPOSITION_SETTINGS_KEY,
];

/// Most arithmetic records kept; the oldest are evicted first.
pub const HISTORY_LIMIT: usize = 100;

/// Typed persistence over a `KeyValueStore`.
///
/// Failures are logged and reported as `false` or as default values, so a
/// broken store never takes a round down with it. Only `import_data`
/// hands its error back.
#[derive(Debug)]
pub struct GameStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> GameStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key)? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(value)?;
        self.store.set(key, &contents)
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_json(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                error!(target: "storage", "Failed to load {}: {}", key, e);
                T::default()
            }
        }
    }

    fn report(key: &str, result: Result<(), StorageError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(target: "storage", "Failed to save {}: {}", key, e);
                false
            }
        }
    }

    pub fn save_player_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            warn!(target: "storage", "Refusing to save an empty player name");
            return false;
        }
        let result = self.store.set(PLAYER_NAME_KEY, name);
        Self::report(PLAYER_NAME_KEY, result)
    }

    pub fn load_player_name(&self) -> Option<String> {
        match self.store.get(PLAYER_NAME_KEY) {
            Ok(name) => name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            Err(e) => {
                error!(target: "storage", "Failed to load player name: {}", e);
                None
            }
        }
    }

    pub fn save_settings(&mut self, settings: &RoundConfiguration) -> bool {
        let result = self.write_json(SETTINGS_KEY, settings);
        Self::report(SETTINGS_KEY, result)
    }

    /// Stored settings, or the defaults when they are missing or unreadable.
    pub fn load_settings(&self) -> RoundConfiguration {
        self.load_or_default(SETTINGS_KEY)
    }

    pub fn save_composition_settings(&mut self, settings: &CompositionConfiguration) -> bool {
        let result = self.write_json(COMPOSITION_SETTINGS_KEY, settings);
        Self::report(COMPOSITION_SETTINGS_KEY, result)
    }

    pub fn load_composition_settings(&self) -> CompositionConfiguration {
        self.load_or_default(COMPOSITION_SETTINGS_KEY)
    }

    pub fn load_game_history(&self) -> Vec<ArithmeticRecord> {
        self.load_or_default(GAME_HISTORY_KEY)
    }

    pub fn load_composition_history(&self) -> Vec<CompositionRecord> {
        self.load_or_default(COMPOSITION_HISTORY_KEY)
    }

    fn write_game_history(&mut self, mut history: Vec<ArithmeticRecord>) -> Result<(), StorageError> {
        if history.len() > HISTORY_LIMIT {
            let excess = history.len() - HISTORY_LIMIT;
            info!(target: "storage", "Evicting {} oldest games", excess);
            history.drain(..excess);
        }
        self.write_json(GAME_HISTORY_KEY, &history)
    }

    /// Appends a finished arithmetic round.
    pub fn save_game_result(&mut self, record: ArithmeticRecord) -> bool {
        let mut history = self.load_game_history();
        history.push(record);
        let result = self.write_game_history(history);
        Self::report(GAME_HISTORY_KEY, result)
    }

    /// Appends a finished composition session. This log is not capped.
    pub fn save_composition_game(&mut self, record: CompositionRecord) -> bool {
        let mut history = self.load_composition_history();
        history.push(record);
        let result = self.write_json(COMPOSITION_HISTORY_KEY, &history);
        Self::report(COMPOSITION_HISTORY_KEY, result)
    }

    /// Both logs merged, in storage order.
    pub fn all_records(&self) -> Vec<GameRecord> {
        self.load_game_history()
            .into_iter()
            .map(GameRecord::from)
            .chain(
                self.load_composition_history()
                    .into_iter()
                    .map(GameRecord::from),
            )
            .collect()
    }

    pub fn player_statistics(&self, player: &str) -> PlayerStatistics {
        compute_statistics(&self.all_records(), player)
    }

    pub fn clear_game_history(&mut self) -> bool {
        let result = self
            .store
            .remove(GAME_HISTORY_KEY)
            .and_then(|_| self.store.remove(COMPOSITION_HISTORY_KEY));
        Self::report(GAME_HISTORY_KEY, result)
    }

    /// Drops every record of `player` from both logs.
    pub fn clear_player_statistics(&mut self, player: &str) -> bool {
        let history: Vec<ArithmeticRecord> = self
            .load_game_history()
            .into_iter()
            .filter(|r| r.player_name != player)
            .collect();
        let compositions: Vec<CompositionRecord> = self
            .load_composition_history()
            .into_iter()
            .filter(|r| r.player_name != player)
            .collect();
        let result = self
            .write_json(GAME_HISTORY_KEY, &history)
            .and_then(|_| self.write_json(COMPOSITION_HISTORY_KEY, &compositions));
        info!(target: "storage", "Cleared statistics of {}", player);
        Self::report(GAME_HISTORY_KEY, result)
    }

    /// Removes one record from whichever log holds it. False when no record
    /// has that id.
    pub fn delete_game(&mut self, id: Uuid) -> bool {
        let mut history = self.load_game_history();
        let before = history.len();
        history.retain(|r| r.id != id);
        if history.len() != before {
            let result = self.write_json(GAME_HISTORY_KEY, &history);
            return Self::report(GAME_HISTORY_KEY, result);
        }

        let mut compositions = self.load_composition_history();
        let before = compositions.len();
        compositions.retain(|r| r.id != id);
        if compositions.len() != before {
            let result = self.write_json(COMPOSITION_HISTORY_KEY, &compositions);
            return Self::report(COMPOSITION_HISTORY_KEY, result);
        }

        warn!(target: "storage", "No game with id {}", id);
        false
    }

    pub fn clear_all_data(&mut self) -> bool {
        ALL_KEYS.iter().all(|key| {
            let result = self.store.remove(key);
            Self::report(key, result)
        })
    }

    /// Pretty JSON of the current player's data. None without a player
    /// name or when serialization fails.
    pub fn export_data(&self) -> Option<String> {
        let player_name = self.load_player_name()?;
        let game_history: Vec<ArithmeticRecord> = self
            .load_game_history()
            .into_iter()
            .filter(|r| r.player_name == player_name)
            .collect();
        let composition_history: Vec<CompositionRecord> = self
            .load_composition_history()
            .into_iter()
            .filter(|r| r.player_name == player_name)
            .collect();
        let document = ExportDocument {
            statistics: self.player_statistics(&player_name),
            settings: self.load_settings(),
            composition_settings: self.load_composition_settings(),
            game_history,
            composition_history,
            export_date: Utc::now(),
            player_name,
        };
        match serde_json::to_string_pretty(&document) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(target: "storage", "Failed to export data: {}", e);
                None
            }
        }
    }

    /// Replaces the imported player's records and settings. Records of
    /// other players are kept. Nothing is written when the document does
    /// not parse or validate.
    pub fn import_data(&mut self, json: &str) -> Result<ImportSummary, StorageError> {
        let document = match ExportDocument::parse(json) {
            Ok(document) => document,
            Err(e) => {
                error!(target: "storage", "Rejected import: {}", e);
                return Err(e);
            }
        };
        let player = document.player_name.clone();
        let summary = ImportSummary {
            player_name: player.clone(),
            games_imported: document.game_history.len(),
            composition_games_imported: document.composition_history.len(),
        };

        let mut history: Vec<ArithmeticRecord> = self
            .load_game_history()
            .into_iter()
            .filter(|r| r.player_name != player)
            .chain(document.game_history)
            .collect();
        history.sort_by_key(|r| r.timestamp);

        let mut compositions: Vec<CompositionRecord> = self
            .load_composition_history()
            .into_iter()
            .filter(|r| r.player_name != player)
            .chain(document.composition_history)
            .collect();
        compositions.sort_by_key(|r| r.date);

        self.store.set(PLAYER_NAME_KEY, &player)?;
        self.write_json(SETTINGS_KEY, &document.settings)?;
        self.write_json(COMPOSITION_SETTINGS_KEY, &document.composition_settings)?;
        self.write_game_history(history)?;
        self.write_json(COMPOSITION_HISTORY_KEY, &compositions)?;

        info!(
            target: "storage",
            "Imported {} games and {} composition games for {}",
            summary.games_imported,
            summary.composition_games_imported,
            player
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone};
    use std::time::Duration;
    use tempfile::TempDir;
    use test_context::test_context;

    use crate::model::OperationMode;
    use crate::storage::{FileStore, MemoryStore};
    use crate::tests::UsingLogger;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn arithmetic(player: &str, score: u32, minutes: i64) -> ArithmeticRecord {
        ArithmeticRecord::new(
            player,
            &RoundConfiguration::default(),
            score,
            Vec::new(),
            Duration::from_secs(30),
            base_time() + ChronoDuration::minutes(minutes),
        )
    }

    fn composition(player: &str, correct: u32, minutes: i64) -> CompositionRecord {
        CompositionRecord::new(
            player,
            &CompositionConfiguration::default(),
            correct,
            Vec::new(),
            Duration::from_secs(90),
            base_time() + ChronoDuration::minutes(minutes),
        )
    }

    fn storage() -> GameStorage<MemoryStore> {
        GameStorage::new(MemoryStore::new())
    }

    #[test]
    fn test_player_name_is_trimmed_and_required() {
        let mut storage = storage();
        assert_eq!(storage.load_player_name(), None);
        assert!(!storage.save_player_name("   "));
        assert!(storage.save_player_name("  Masha "));
        assert_eq!(storage.load_player_name().as_deref(), Some("Masha"));
    }

    #[test]
    fn test_settings_fall_back_to_defaults() {
        let mut storage = GameStorage::new({
            let mut store = MemoryStore::new();
            store.set(SETTINGS_KEY, "{ broken").unwrap();
            store
        });
        assert_eq!(storage.load_settings(), RoundConfiguration::default());
        assert_eq!(
            storage.load_composition_settings(),
            CompositionConfiguration::default()
        );

        let settings = RoundConfiguration::new(2, 20, 10, OperationMode::Mixed);
        assert!(storage.save_settings(&settings));
        assert_eq!(storage.load_settings(), settings);
    }

    #[test]
    fn test_legacy_settings_keys() {
        let mut store = MemoryStore::new();
        store
            .set(
                SETTINGS_KEY,
                r#"{"maxNumber": 20, "examplesCount": 7, "operationType": "both"}"#,
            )
            .unwrap();
        let settings = GameStorage::new(store).load_settings();
        assert_eq!(settings.min_number, 1);
        assert_eq!(settings.max_number, 20);
        assert_eq!(settings.problem_count, 7);
        assert_eq!(settings.operation_mode, OperationMode::Mixed);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_history_cap_evicts_oldest(_: &mut UsingLogger) {
        let mut storage = storage();
        for minute in 0..(HISTORY_LIMIT as i64 + 5) {
            assert!(storage.save_game_result(arithmetic("Masha", 3, minute)));
        }
        let history = storage.load_game_history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].timestamp, base_time() + ChronoDuration::minutes(5));

        for minute in 0..(HISTORY_LIMIT as i64 + 5) {
            assert!(storage.save_composition_game(composition("Masha", 10, minute)));
        }
        assert_eq!(storage.load_composition_history().len(), HISTORY_LIMIT + 5);
    }

    #[test]
    fn test_delete_game_by_id() {
        let mut storage = storage();
        let first = arithmetic("Masha", 3, 0);
        let second = composition("Masha", 10, 1);
        let (first_id, second_id) = (first.id, second.id);
        storage.save_game_result(first);
        storage.save_composition_game(second);

        assert!(storage.delete_game(second_id));
        assert!(storage.load_composition_history().is_empty());
        assert!(storage.delete_game(first_id));
        assert!(storage.load_game_history().is_empty());
        assert!(!storage.delete_game(first_id));
    }

    #[test]
    fn test_clear_player_keeps_others() {
        let mut storage = storage();
        storage.save_game_result(arithmetic("Masha", 3, 0));
        storage.save_game_result(arithmetic("Petya", 4, 1));
        storage.save_composition_game(composition("Masha", 10, 2));

        assert!(storage.clear_player_statistics("Masha"));
        assert_eq!(storage.player_statistics("Masha").total_games, 0);
        let others = storage.player_statistics("Petya");
        assert_eq!(others.total_games, 1);
        assert_eq!(others.best_score, 4);
    }

    #[test]
    fn test_clear_game_history_and_all_data() {
        let mut storage = storage();
        storage.save_player_name("Masha");
        storage.save_game_result(arithmetic("Masha", 3, 0));
        storage.save_composition_game(composition("Masha", 10, 1));

        assert!(storage.clear_game_history());
        assert!(storage.all_records().is_empty());
        assert_eq!(storage.load_player_name().as_deref(), Some("Masha"));

        assert!(storage.clear_all_data());
        assert_eq!(storage.load_player_name(), None);
        assert!(storage.store().is_empty());
    }

    #[test]
    fn test_export_without_player_name() {
        assert_eq!(storage().export_data(), None);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_export_import_round_trip(_: &mut UsingLogger) {
        let mut source = storage();
        source.save_player_name("Masha");
        source.save_settings(&RoundConfiguration::new(1, 20, 8, OperationMode::Subtraction));
        source.save_game_result(arithmetic("Masha", 5, 0));
        source.save_game_result(arithmetic("Petya", 1, 1));
        source.save_composition_game(composition("Masha", 12, 2));
        let exported = source.export_data().unwrap();

        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value["playerName"], "Masha");
        assert_eq!(value["gameHistory"].as_array().unwrap().len(), 1);
        assert_eq!(value["statistics"]["totalGames"], 2);
        assert!(value["exportDate"].is_string());

        let mut target = storage();
        target.save_game_result(arithmetic("Masha", 0, -10));
        target.save_game_result(arithmetic("Kolya", 2, -5));
        let summary = target.import_data(&exported).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                player_name: "Masha".to_string(),
                games_imported: 1,
                composition_games_imported: 1,
            }
        );

        assert_eq!(target.load_player_name().as_deref(), Some("Masha"));
        assert_eq!(target.load_settings().problem_count, 8);
        let masha = target.player_statistics("Masha");
        assert_eq!(masha.total_games, 2);
        assert_eq!(masha.best_score, 12);
        assert_eq!(target.player_statistics("Kolya").total_games, 1);
    }

    #[test]
    fn test_invalid_import_leaves_state_untouched() {
        let mut storage = storage();
        storage.save_player_name("Masha");
        storage.save_game_result(arithmetic("Masha", 5, 0));

        let foreign = format!(
            r#"{{"playerName": "Masha", "gameHistory": [{}]}}"#,
            serde_json::to_string(&arithmetic("Petya", 1, 1)).unwrap()
        );
        for input in [
            "{",
            r#"{"playerName": ""}"#,
            r#"{"playerName": "Kolya", "settings": {"minNumber": 5, "maxNumber": 5}}"#,
            foreign.as_str(),
        ] {
            assert!(storage.import_data(input).is_err(), "accepted {}", input);
        }
        assert_eq!(storage.load_player_name().as_deref(), Some("Masha"));
        assert_eq!(storage.load_game_history().len(), 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_import_rejects_out_of_range_settings(_: &mut UsingLogger) {
        let mut storage = storage();
        storage.save_player_name("Masha");
        for input in [
            r#"{"playerName":"Masha","settings":{"minNumber":2000000000,"maxNumber":2147483647}}"#,
            r#"{"playerName":"Masha","settings":{"problemCount":1000000000000000000}}"#,
            r#"{"playerName":"Masha","compositionSettings":{"minNumber":0,"maxNumber":2147483647}}"#,
            r#"{"playerName":"Masha","compositionSettings":{"repetitions":4294967295}}"#,
        ] {
            assert!(
                matches!(
                    storage.import_data(input),
                    Err(StorageError::InvalidConfiguration(_))
                ),
                "accepted {}",
                input
            );
        }
        assert_eq!(storage.load_settings(), RoundConfiguration::default());
        assert_eq!(
            storage.load_composition_settings(),
            CompositionConfiguration::default()
        );
    }

    #[test]
    fn test_file_store_backed_storage() {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = GameStorage::new(FileStore::new(temp_dir.path()));
        storage.save_player_name("Masha");
        storage.save_game_result(arithmetic("Masha", 4, 0));

        let reopened = GameStorage::new(FileStore::new(temp_dir.path()));
        assert_eq!(reopened.load_player_name().as_deref(), Some("Masha"));
        assert_eq!(reopened.load_game_history()[0].score, 4);
    }
}
